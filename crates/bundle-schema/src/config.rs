//! Cluster configuration as reported inside a bundle.

use serde::{Deserialize, Serialize};

/// Cluster membership and per-node services known to one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

/// One member entry in the cluster configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    #[serde(default)]
    pub services: Vec<String>,
    pub version: Option<String>,
}

impl ClusterConfig {
    /// Look up the entry for a node.
    pub fn node(&self, name: &str) -> Option<&NodeConfig> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Member names in configuration order.
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.name.as_str())
    }

    /// Services configured for a node; empty when the node is unknown.
    pub fn services_of(&self, name: &str) -> Vec<String> {
        self.node(name)
            .map(|n| n.services.clone())
            .unwrap_or_default()
    }

    /// Merge another node's view into this one.
    ///
    /// Entries from `other` replace existing entries with the same name;
    /// new names are appended.
    pub fn merge(&mut self, other: &ClusterConfig) {
        for entry in &other.nodes {
            match self.nodes.iter_mut().find(|n| n.name == entry.name) {
                Some(existing) => *existing = entry.clone(),
                None => self.nodes.push(entry.clone()),
            }
        }
    }
}

/// Major component of a dotted version string ("4.1.0" -> 4).
pub fn major_version(version: &str) -> Option<u32> {
    version.trim().split('.').next()?.parse().ok()
}
