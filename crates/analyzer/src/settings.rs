//! Run settings, optionally loaded from a YAML file.

use crate::merge::MergePolicy;
use cbtopo_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Per-cluster table layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Node x service membership matrix.
    #[default]
    Matrix,
    /// One row per service with its member count.
    Services,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Matrix => write!(f, "matrix"),
            Layout::Services => write!(f, "services"),
        }
    }
}

impl FromStr for Layout {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "matrix" => Ok(Layout::Matrix),
            "services" => Ok(Layout::Services),
            _ => Err(Error::Config(format!("unknown layout: {}", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub merge_policy: MergePolicy,
    /// Gutter between table columns, in spaces.
    pub padding: usize,
    pub member_marker: String,
    pub non_member_marker: String,
    /// File name of the bundle snapshot inside each log location.
    pub bundle_file: String,
    pub layout: Layout,
    pub validate_schema: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            merge_policy: MergePolicy::LastWins,
            padding: 2,
            member_marker: "y".to_string(),
            non_member_marker: "-".to_string(),
            bundle_file: "bundle.json".to_string(),
            layout: Layout::Matrix,
            validate_schema: true,
        }
    }
}

impl Settings {
    /// Load settings from a YAML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading settings from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.member_marker.is_empty() || self.non_member_marker.is_empty() {
            return Err(Error::Config("table markers must not be empty".to_string()));
        }
        if self.member_marker == self.non_member_marker {
            return Err(Error::Config(
                "member and non-member markers must differ".to_string(),
            ));
        }
        if self.bundle_file.trim().is_empty() {
            return Err(Error::Config("bundle_file must not be empty".to_string()));
        }
        Ok(())
    }
}
