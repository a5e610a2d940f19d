//! Node aggregation keyed by node name.

use crate::classify::NodeRecord;
use crate::collaborators::ResultMap;
use crate::merge::{Collision, CollisionKind, MergePolicy};
use cbtopo_common::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Bookkeeping for one node, filled in as the run progresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeInfo {
    pub log_location: String,
    /// Set by the cluster aggregator.
    pub cluster_name: Option<String>,
}

/// All nodes of one run. Ordered maps keep iteration sorted by name.
#[derive(Debug, Default)]
pub struct NodeIndex {
    pub results: ResultMap,
    pub stats: ResultMap,
    pub infos: BTreeMap<String, NodeInfo>,
    pub collisions: Vec<Collision>,
}

impl NodeIndex {
    /// Aggregate classifier outputs in input order. Gaps are skipped.
    pub fn build<I>(records: I, policy: MergePolicy) -> Result<Self>
    where
        I: IntoIterator<Item = Option<NodeRecord>>,
    {
        let mut index = NodeIndex::default();
        for record in records.into_iter().flatten() {
            index.insert(record, policy)?;
        }
        Ok(index)
    }

    /// Insert one record. A record for a known name replaces the old one
    /// wholesale under [`MergePolicy::LastWins`].
    pub fn insert(&mut self, record: NodeRecord, policy: MergePolicy) -> Result<()> {
        if let Some(existing) = self.infos.get(&record.name) {
            match policy {
                MergePolicy::Reject => {
                    return Err(Error::DuplicateNode {
                        name: record.name,
                        first: existing.log_location.clone(),
                        second: record.log_location,
                    });
                }
                MergePolicy::LastWins => {
                    warn!(
                        "Node {} reported by both {} and {}; keeping {}",
                        record.name, existing.log_location, record.log_location, record.log_location
                    );
                    self.collisions.push(Collision {
                        kind: CollisionKind::Node,
                        name: record.name.clone(),
                        replaced: existing.log_location.clone(),
                        kept: record.log_location.clone(),
                    });
                }
            }
        }

        self.results.insert(record.name.clone(), record.results);
        match record.stats {
            Some(stats) => {
                self.stats.insert(record.name.clone(), stats);
            }
            None => {
                self.stats.remove(&record.name);
            }
        }
        self.infos.insert(
            record.name,
            NodeInfo {
                log_location: record.log_location,
                cluster_name: None,
            },
        );
        Ok(())
    }

    /// Node names, sorted ascending.
    pub fn node_names(&self) -> Vec<String> {
        self.infos.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Record the owning cluster of a node. Returns false for unknown nodes.
    pub fn set_cluster(&mut self, node: &str, cluster_name: &str) -> bool {
        match self.infos.get_mut(node) {
            Some(info) => {
                info.cluster_name = Some(cluster_name.to_string());
                true
            }
            None => false,
        }
    }
}
