use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome chosen for one conflict: keep the local snapshot, take the
/// server snapshot, or merge field-by-field with additive bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Local,
    Server,
    Merge,
}

impl Resolution {
    pub fn as_str(&self) -> &str {
        match self {
            Resolution::Local => "local",
            Resolution::Server => "server",
            Resolution::Merge => "merge",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "local" => Ok(Resolution::Local),
            "server" => Ok(Resolution::Server),
            "merge" => Ok(Resolution::Merge),
            other => Err(format!("Unknown resolution: {other}")),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bulk rule applied across every pending conflict at once, so a user
/// returning from a long offline stretch is not forced to adjudicate
/// one conflict at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkStrategy {
    Newest,
    Oldest,
    Local,
    Server,
}

impl BulkStrategy {
    pub fn as_str(&self) -> &str {
        match self {
            BulkStrategy::Newest => "newest",
            BulkStrategy::Oldest => "oldest",
            BulkStrategy::Local => "local",
            BulkStrategy::Server => "server",
        }
    }
}

impl fmt::Display for BulkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Default conflict handling configured in the global sync settings.
/// `Manual` routes every conflict to user adjudication; any other value
/// is applied automatically at the end of each pull phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictResolutionPolicy {
    Newest,
    Oldest,
    Local,
    Server,
    Manual,
}

impl ConflictResolutionPolicy {
    pub fn as_bulk_strategy(&self) -> Option<BulkStrategy> {
        match self {
            ConflictResolutionPolicy::Newest => Some(BulkStrategy::Newest),
            ConflictResolutionPolicy::Oldest => Some(BulkStrategy::Oldest),
            ConflictResolutionPolicy::Local => Some(BulkStrategy::Local),
            ConflictResolutionPolicy::Server => Some(BulkStrategy::Server),
            ConflictResolutionPolicy::Manual => None,
        }
    }
}
