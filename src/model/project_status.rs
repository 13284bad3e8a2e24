use serde_derive::{Deserialize, Serialize};

use crate::constants::NO_PROJECT_DATA;

fn no_project_data() -> String {
    NO_PROJECT_DATA.to_string()
}

/// Status of an issue on one project board. Missing fields hold
/// [`NO_PROJECT_DATA`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStatus {
    #[serde(default = "no_project_data")]
    pub project_title: String,
    #[serde(default = "no_project_data")]
    pub status: String,
    #[serde(default = "no_project_data")]
    pub priority: String,
    #[serde(default = "no_project_data")]
    pub size: String,
    /// MoSCoW category ("Must Have", "Should Have", ...).
    #[serde(default = "no_project_data")]
    pub moscow: String,
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self {
            project_title: no_project_data(),
            status: no_project_data(),
            priority: no_project_data(),
            size: no_project_data(),
            moscow: no_project_data(),
        }
    }
}
