/// Crawl job status definitions
///
/// A job starts `InProgress` and ends in exactly one terminal status.
use serde::Serialize;
use std::fmt;

/// Represents the lifecycle status of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Traversal is running
    InProgress,

    /// Traversal finished: every reachable internal page was visited
    Completed,

    /// Traversal halted at the page limit; the report may be incomplete
    LimitExceeded,

    /// Traversal was aborted by a cancellation signal
    Cancelled,
}

impl JobStatus {
    /// Returns true once the job can no longer change
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }

    /// Returns true if the collected results may not cover the whole site
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::LimitExceeded | Self::Cancelled)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::LimitExceeded => "limit_exceeded",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "limit_exceeded" => Some(Self::LimitExceeded),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns all possible job statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![
            Self::InProgress,
            Self::Completed,
            Self::LimitExceeded,
            Self::Cancelled,
        ]
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
