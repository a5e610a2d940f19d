//! Duplicate identity handling for nodes and clusters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What to do when two records claim the same node or cluster name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// The later record (in log location order) replaces the earlier one.
    #[default]
    LastWins,
    /// Abort the run with a duplicate error.
    Reject,
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::LastWins => write!(f, "last-wins"),
            MergePolicy::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for MergePolicy {
    type Err = cbtopo_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last-wins" | "lastwins" => Ok(MergePolicy::LastWins),
            "reject" => Ok(MergePolicy::Reject),
            _ => Err(cbtopo_common::Error::Config(format!(
                "unknown merge policy: {}",
                s
            ))),
        }
    }
}

/// Which kind of identity collided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionKind {
    Node,
    Cluster,
}

/// A duplicate identity that was resolved by overwriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub kind: CollisionKind,
    pub name: String,
    /// Source of the record that was dropped.
    pub replaced: String,
    /// Source of the record that was kept.
    pub kept: String,
}
