use std::collections::BTreeMap;

use serde::Deserializer;
use serde_derive::{Deserialize, Serialize};

use super::{ModelError, ProjectStatus};

const ASSOCIATED_FEATURE_HEADING: &str = "### Associated Feature";

/// Concrete kind of an issue, persisted as its `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<serde_json::Value>", into = "String")]
pub enum IssueKind {
    #[default]
    Issue,
    UserStory,
    Feature,
    Functionality,
}

impl IssueKind {
    pub const ALL: [IssueKind; 4] = [
        IssueKind::Issue,
        IssueKind::UserStory,
        IssueKind::Feature,
        IssueKind::Functionality,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            IssueKind::Issue => "Issue",
            IssueKind::UserStory => "UserStoryIssue",
            IssueKind::Feature => "FeatureIssue",
            IssueKind::Functionality => "FunctionalityIssue",
        }
    }

    /// Unknown tags resolve to [`IssueKind::Issue`].
    pub fn from_tag(tag: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .unwrap_or_default()
    }
}

/// Anything but a known tag string, including a missing or non-string
/// `type`, resolves to [`IssueKind::Issue`].
impl From<Option<serde_json::Value>> for IssueKind {
    fn from(tag: Option<serde_json::Value>) -> Self {
        match tag {
            Some(serde_json::Value::String(tag)) => IssueKind::from_tag(&tag),
            _ => IssueKind::Issue,
        }
    }
}

impl From<IssueKind> for String {
    fn from(kind: IssueKind) -> Self {
        kind.tag().to_string()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    let value: Option<T> = serde::Deserialize::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "IssueRecord")]
pub struct Issue {
    /// `org/repo` of the repository the issue lives in.
    pub repository_id: String,
    pub title: String,
    pub issue_number: u64,
    pub html_url: Option<String>,
    pub body: Option<String>,
    pub state: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub closed_at: Option<String>,
    pub labels: Vec<String>,
    pub linked_to_project: bool,
    #[serde(rename = "project_status")]
    pub project_statuses: Vec<ProjectStatus>,
    #[serde(rename = "type")]
    pub kind: IssueKind,
    /// Problems found while collecting the issue, by field name.
    #[serde(skip)]
    errors: BTreeMap<String, String>,
}

/// Persisted shape of an [`Issue`]. Older files carry the number as
/// `number`; `issue_number` wins when both are present.
#[derive(Deserialize)]
struct IssueRecord {
    #[serde(default)]
    repository_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    issue_number: Option<u64>,
    #[serde(default)]
    number: Option<u64>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    closed_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    labels: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    linked_to_project: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    project_status: Vec<ProjectStatus>,
    #[serde(rename = "type", default)]
    kind: IssueKind,
}

impl From<IssueRecord> for Issue {
    fn from(record: IssueRecord) -> Self {
        Self {
            repository_id: record.repository_id,
            title: record.title,
            issue_number: record.issue_number.or(record.number).unwrap_or_default(),
            html_url: record.html_url,
            body: record.body,
            state: record.state,
            created_at: record.created_at,
            updated_at: record.updated_at,
            closed_at: record.closed_at,
            labels: record.labels,
            linked_to_project: record.linked_to_project,
            project_statuses: record.project_status,
            kind: record.kind,
            errors: BTreeMap::new(),
        }
    }
}

impl Issue {
    pub fn new(repository_id: impl Into<String>, title: impl Into<String>, number: u64) -> Self {
        Self {
            repository_id: repository_id.into(),
            title: title.into(),
            issue_number: number,
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: IssueKind) -> Self {
        self.kind = kind;
        self
    }

    fn repository_parts(&self) -> Result<(&str, &str), ModelError> {
        match self.repository_id.split('/').collect::<Vec<_>>()[..] {
            [organization, repository] if !organization.is_empty() && !repository.is_empty() => {
                Ok((organization, repository))
            }
            _ => Err(ModelError::InvalidRepositoryId(self.repository_id.clone())),
        }
    }

    pub fn organization_name(&self) -> Result<&str, ModelError> {
        self.repository_parts().map(|(organization, _)| organization)
    }

    pub fn repository_name(&self) -> Result<&str, ModelError> {
        self.repository_parts().map(|(_, repository)| repository)
    }

    /// Collection key of this issue, see [`super::Issues::make_issue_key`].
    pub fn key(&self) -> Result<String, ModelError> {
        let (organization, repository) = self.repository_parts()?;
        Ok(super::Issues::make_issue_key(
            organization,
            repository,
            self.issue_number,
        ))
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    /// Merges `errors` into the issue's errors; later messages for the same
    /// field replace earlier ones.
    pub fn add_errors<K, V>(&mut self, errors: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.errors
            .extend(errors.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    pub fn is_valid_issue(&self) -> bool {
        !self.repository_id.is_empty() && !self.title.is_empty() && self.issue_number > 0
    }

    /// Numbers of the features a functionality issue links to under its
    /// "Associated Feature" heading.
    pub fn related_feature_ids(&self) -> Vec<u64> {
        let Some(body) = self.body.as_deref() else {
            return Vec::new();
        };
        body.lines()
            .map(str::trim)
            .skip_while(|line| *line != ASSOCIATED_FEATURE_HEADING)
            .skip(1)
            .take_while(|line| !line.starts_with('#'))
            .filter_map(|line| line.strip_prefix("- #")?.trim().parse().ok())
            .collect()
    }
}
