/// Site status definitions for tracking indexing progress
///
/// A site starts every crawl run in `Indexing` and ends in exactly one of the
/// terminal states. Transitions are one-way.
use serde::Serialize;
use std::fmt;

/// Represents the indexing status of a configured site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SiteStatus {
    /// A crawl run is working on the site
    Indexing,

    /// The root task finished its whole subtree without cancellation
    Indexed,

    /// The root page failed or the run was stopped
    Failed,
}

impl SiteStatus {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Indexing)
    }

    /// Returns true if moving from `self` to `next` is allowed
    ///
    /// Only `Indexing` may move, and only into a terminal state.
    pub fn can_transition_to(&self, next: SiteStatus) -> bool {
        matches!(self, Self::Indexing) && next.is_terminal()
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Indexing => "INDEXING",
            Self::Indexed => "INDEXED",
            Self::Failed => "FAILED",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "INDEXING" => Some(Self::Indexing),
            "INDEXED" => Some(Self::Indexed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
