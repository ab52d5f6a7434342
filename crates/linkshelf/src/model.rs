//! Bookmark and tag records as seen by the enrichment pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Enrichment status of a bookmark.
///
/// `Skipped` is assigned at creation to records without AI enrichment and
/// never changes afterwards. Enabled records move strictly forward:
/// `Pending` -> `Processing` -> `Completed` | `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Skipped,
}

impl AiStatus {
    /// Initial status for a freshly created record.
    pub fn initial(ai_enabled: bool) -> Self {
        if ai_enabled {
            AiStatus::Pending
        } else {
            AiStatus::Skipped
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AiStatus::Pending => "pending",
            AiStatus::Processing => "processing",
            AiStatus::Completed => "completed",
            AiStatus::Failed => "failed",
            AiStatus::Skipped => "skipped",
        }
    }

    /// Terminal states never transition again within one enrichment run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AiStatus::Completed | AiStatus::Failed | AiStatus::Skipped
        )
    }
}

impl fmt::Display for AiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown ai_status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for AiStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AiStatus::Pending),
            "processing" => Ok(AiStatus::Processing),
            "completed" => Ok(AiStatus::Completed),
            "failed" => Ok(AiStatus::Failed),
            "skipped" => Ok(AiStatus::Skipped),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A tag. Names are stored lowercase and are unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A bookmark together with its tag associations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    /// Owning user. Users themselves live outside this crate.
    pub user_id: i64,
    pub url: String,
    pub title: String,
    pub description: String,
    pub is_favorite: bool,
    pub ai_enabled: bool,
    pub ai_status: AiStatus,
    /// Populated only while `ai_status` is `Failed`.
    pub ai_error: Option<String>,
    pub tags: Vec<Tag>,
    pub created_at: String,
    pub updated_at: String,
}

impl Bookmark {
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Input for creating a bookmark.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBookmark {
    pub user_id: i64,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default = "default_ai_enabled")]
    pub ai_enabled: bool,
}

fn default_ai_enabled() -> bool {
    true
}

impl NewBookmark {
    pub fn new(user_id: i64, url: impl Into<String>) -> Self {
        Self {
            user_id,
            url: url.into(),
            ai_enabled: true,
            ..Default::default()
        }
    }

    pub fn without_ai(mut self) -> Self {
        self.ai_enabled = false;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}
