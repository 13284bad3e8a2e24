use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde_derive::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::{Issue, ModelError};

/// Issues keyed by `org/repo/number`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Issues {
    issues: BTreeMap<String, Issue>,
}

impl Issues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_issue_key(organization_name: &str, repository_name: &str, number: u64) -> String {
        format!("{}/{}/{}", organization_name, repository_name, number)
    }

    /// Inserts `issue` under `key`, replacing any issue stored there.
    pub fn add_issue(&mut self, key: impl Into<String>, issue: Issue) {
        self.issues.insert(key.into(), issue);
    }

    pub fn get_issue(&self, key: &str) -> Result<&Issue, ModelError> {
        self.issues
            .get(key)
            .ok_or_else(|| ModelError::IssueNotFound(key.to_string()))
    }

    pub fn all_issues(&self) -> &BTreeMap<String, Issue> {
        &self.issues
    }

    pub fn count(&self) -> usize {
        self.issues.len()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Issue> {
        self.issues.iter()
    }

    pub fn save_to_json(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ModelError::Save {
            path: path.to_path_buf(),
            source,
        })?;
        info!(count = self.count(), path = %path.display(), "Issues saved.");
        Ok(())
    }

    /// Restores a collection written by [`Issues::save_to_json`].
    ///
    /// Never fails: a missing, unreadable or malformed file is logged and
    /// yields an empty collection, so a first run starts from scratch.
    pub fn load_from_json(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Issues file not found: {}", path.display());
                return Self::new();
            }
            Err(err) => {
                error!(
                    path = %path.display(),
                    error = ?err,
                    "Unexpected error loading issues from {}: {}",
                    path.display(),
                    err
                );
                return Self::new();
            }
        };

        match serde_json::from_str::<Self>(&content) {
            Ok(issues) => {
                debug!(count = issues.count(), path = %path.display(), "Issues loaded.");
                issues
            }
            Err(err) if err.is_syntax() || err.is_eof() => {
                error!(
                    path = %path.display(),
                    error = ?err,
                    "Failed to parse JSON from {}: {}",
                    path.display(),
                    err
                );
                Self::new()
            }
            Err(err) => {
                error!(
                    path = %path.display(),
                    error = ?err,
                    "Unexpected error loading issues from {}: {}",
                    path.display(),
                    err
                );
                Self::new()
            }
        }
    }
}

impl<'a> IntoIterator for &'a Issues {
    type Item = (&'a String, &'a Issue);
    type IntoIter = btree_map::Iter<'a, String, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}
