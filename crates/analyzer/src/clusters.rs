//! Cluster aggregation on top of the grouping algorithm.

use crate::collaborators::{ClusterObject, ResultMap, Toolkit};
use crate::merge::{Collision, CollisionKind, MergePolicy};
use crate::nodes::NodeIndex;
use cbtopo_bundle_schema::{ClusterConfig, RawBundle};
use cbtopo_common::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// A named cluster of one run.
#[derive(Debug)]
pub struct ClusterRecord {
    pub name: String,
    pub node_names: BTreeSet<String>,
    pub cluster: Box<dyn ClusterObject>,
}

impl ClusterRecord {
    pub fn config(&self) -> &ClusterConfig {
        self.cluster.config()
    }

    pub fn node_count(&self) -> usize {
        self.node_names.len()
    }

    /// Member names, sorted ascending.
    pub fn sorted_nodes(&self) -> Vec<String> {
        self.node_names.iter().cloned().collect()
    }
}

/// All clusters of one run, keyed and iterated by cluster name.
#[derive(Debug, Default)]
pub struct ClusterIndex {
    pub records: BTreeMap<String, ClusterRecord>,
    pub results: ResultMap,
    pub collisions: Vec<Collision>,
}

impl ClusterIndex {
    /// Cluster names, sorted ascending.
    pub fn cluster_names(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&ClusterRecord> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Group nodes into clusters and stamp each known node with its cluster.
///
/// A failure of the grouping algorithm aborts the run.
pub fn aggregate_clusters(
    bundles: &[Option<RawBundle>],
    nodes: &mut NodeIndex,
    toolkit: &Toolkit,
    policy: MergePolicy,
) -> Result<ClusterIndex> {
    let clusters = toolkit
        .discovery
        .aggregate_cluster_info(bundles, &nodes.results, &nodes.stats)?;

    let mut index = ClusterIndex::default();

    for cluster in clusters {
        let members = cluster.nodes();
        let name = cluster.summarize_name(&members);

        if let Some(existing) = index.records.get(&name) {
            let replaced = describe_members(&existing.node_names);
            let kept = describe_members(&members);
            match policy {
                MergePolicy::Reject => return Err(Error::DuplicateCluster { name }),
                MergePolicy::LastWins => {
                    warn!(
                        "Cluster name {} used by [{}] and [{}]; keeping the later",
                        name, replaced, kept
                    );
                    index.collisions.push(Collision {
                        kind: CollisionKind::Cluster,
                        name: name.clone(),
                        replaced,
                        kept,
                    });
                }
            }
        }

        index
            .results
            .insert(name.clone(), toolkit.extractor.cluster_results(cluster.as_ref()));

        for node in &members {
            if !nodes.set_cluster(node, &name) {
                debug!("Cluster {} lists {} which has no bundle", name, node);
            }
        }

        index.records.insert(
            name.clone(),
            ClusterRecord {
                name,
                node_names: members.into_iter().collect(),
                cluster,
            },
        );
    }

    Ok(index)
}

fn describe_members<'a, I>(members: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    members
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
