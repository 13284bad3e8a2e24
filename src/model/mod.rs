//! Issue records shared between living-documentation actions.

mod issue;
mod issues;
mod project_status;

pub use issue::{Issue, IssueKind};
pub use issues::Issues;
pub use project_status::ProjectStatus;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid repository_id format: {0}. Expected format: 'org/repo'")]
    InvalidRepositoryId(String),
    #[error("Issue with key '{0}' not found.")]
    IssueNotFound(String),
    #[error("Failed to write issues to {path}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize issues")]
    Serialize(#[from] serde_json::Error),
}
