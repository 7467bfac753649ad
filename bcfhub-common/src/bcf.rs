//! Issue model and inspection service wire format
//!
//! The inspection service answers `POST /bcf/inspect` with a JSON body of the
//! form `{ "project": {...}, "topics": [...] }`. Topic records are converted
//! into [`Issue`] values tagged with the name of the archive they came from.

use serde::{Deserialize, Serialize};

/// One comment attached to an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment GUID, when the archive provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    pub author: String,
    pub date: String,
    pub text: String,
}

/// One coordination topic extracted from an archive
///
/// Issues are immutable once produced by inspection. The GUID is unique
/// within the owning archive only; two archives may carry the same GUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub guid: String,
    pub title: String,
    pub status: String,
    pub priority: String,
    pub author: String,
    /// Creation timestamp as reported by the archive (not normalised)
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Opaque viewpoint identifiers or labels, in archive order
    #[serde(default)]
    pub viewpoints: Vec<String>,
    /// Snapshot reference (archive path or `data:` URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
    /// Name of the archive this issue was extracted from
    pub archive: String,
}

/// Successful inspection response body
#[derive(Debug, Clone, Deserialize)]
pub struct InspectionReport {
    /// Project metadata (carried through, not interpreted)
    #[serde(default)]
    pub project: serde_json::Value,
    pub topics: Vec<TopicRecord>,
}

/// Topic record as serialised by the inspection service
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRecord {
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
    #[serde(default)]
    pub viewpoints: Vec<String>,
    #[serde(default)]
    pub snapshot: Option<String>,
}

/// Comment record as serialised by the inspection service
#[derive(Debug, Clone, Deserialize)]
pub struct CommentRecord {
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub text: String,
}

impl InspectionReport {
    /// Convert every topic into an [`Issue`] owned by `archive`, keeping order
    pub fn into_issues(self, archive: &str) -> Vec<Issue> {
        self.topics
            .into_iter()
            .map(|topic| topic.into_issue(archive))
            .collect()
    }
}

impl TopicRecord {
    pub fn into_issue(self, archive: &str) -> Issue {
        Issue {
            guid: self.guid,
            title: self.title,
            status: self.status,
            priority: self.priority,
            author: self.author,
            created_at: self.created_at,
            description: non_blank(self.description),
            comments: self.comments.into_iter().map(Comment::from).collect(),
            viewpoints: self
                .viewpoints
                .into_iter()
                .map(|vp| vp.trim().to_string())
                .filter(|vp| !vp.is_empty())
                .collect(),
            snapshot: non_blank(self.snapshot),
            archive: archive.to_string(),
        }
    }
}

impl From<CommentRecord> for Comment {
    fn from(record: CommentRecord) -> Self {
        Self {
            guid: non_blank(record.guid),
            author: record.author,
            date: record.date,
            text: record.text,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
