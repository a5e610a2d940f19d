//! Parsed bundle types - what one log location turns into.

use crate::config::ClusterConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The structured result of parsing one log location.
///
/// Only a small part of the bundle is recognized here: the statistics
/// section, the log section and the cluster configuration a node reported.
/// Everything else the parser extracted is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBundle {
    /// Log location this bundle was parsed from. Filled in by the parser.
    #[serde(default)]
    pub log_location: String,
    /// Server version reported by the node, e.g. "4.1.0".
    pub version: Option<String>,
    /// When the diagnostics were collected.
    pub collected_at: Option<DateTime<Utc>>,
    /// Statistics section, present for stats-bearing bundles.
    #[serde(alias = "ns_stats")]
    pub stats: Option<StatsSection>,
    /// Log section, present for log-only bundles.
    #[serde(alias = "cblog")]
    pub log: Option<LogSection>,
    /// Cluster membership as seen by this node.
    pub config: Option<ClusterConfig>,
}

impl RawBundle {
    /// Node identity reported by the bundle, if any shape carries one.
    ///
    /// The statistics section wins over the log section.
    pub fn reported_node(&self) -> Option<&str> {
        if let Some(stats) = &self.stats {
            return Some(stats.node_name());
        }
        self.log.as_ref().and_then(LogSection::hostname)
    }
}

/// Per-node statistics extracted from the stats log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSection {
    pub node_name: String,
    #[serde(default)]
    pub counters: BTreeMap<String, serde_json::Value>,
}

impl StatsSection {
    pub fn node_name(&self) -> &str {
        &self.node_name
    }
}

/// Log section; older collections only carry this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSection {
    pub hostname: Option<String>,
    #[serde(default)]
    pub entries: Vec<String>,
}

impl LogSection {
    /// Hostname of the node, when the collector captured it.
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref().filter(|h| !h.is_empty())
    }
}
