//! Service membership per cluster.

use crate::clusters::ClusterRecord;
use crate::collaborators::ServiceLookup;
use cbtopo_bundle_schema::ClusterConfig;
use std::collections::BTreeMap;

/// Service name to member nodes, for one cluster.
///
/// Members keep the order in which nodes were visited; service names
/// iterate sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceTopology {
    services: BTreeMap<String, Vec<String>>,
}

impl ServiceTopology {
    /// Topology of a cluster, or `None` when no member supports services.
    pub fn build(record: &ClusterRecord, lookup: &dyn ServiceLookup) -> Option<Self> {
        if !record.cluster.check_for_ver4_nodes() {
            return None;
        }
        Some(Self::from_nodes(&record.cluster.nodes(), record.config(), lookup))
    }

    /// Topology over the given nodes, visited in order.
    pub fn from_nodes(nodes: &[String], config: &ClusterConfig, lookup: &dyn ServiceLookup) -> Self {
        let mut services: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for node in nodes {
            for service in lookup.services_of_node(config, node) {
                let members = services.entry(service).or_default();
                if members.last() != Some(node) {
                    members.push(node.clone());
                }
            }
        }
        Self { services }
    }

    /// Service names, sorted ascending.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn members(&self, service: &str) -> &[String] {
        self.services.get(service).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_member(&self, service: &str, node: &str) -> bool {
        self.members(service).iter().any(|n| n == node)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
