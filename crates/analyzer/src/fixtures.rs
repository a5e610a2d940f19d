//! Fakes and bundle builders shared by unit tests.

use crate::collaborators::{
    BundleParser, ClusterDiscovery, ClusterObject, OutputFormat, ReportFormatter, ResultExtractor,
    ResultMap, ServiceLookup, Toolkit,
};
use cbtopo_bundle_schema::{ClusterConfig, LogSection, NodeConfig, RawBundle, StatsSection};
use cbtopo_common::{Error, Result};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub fn member(name: &str, services: &[&str], version: &str) -> NodeConfig {
    NodeConfig {
        name: name.to_string(),
        services: services.iter().map(|s| s.to_string()).collect(),
        version: Some(version.to_string()),
    }
}

pub fn stats_bundle(
    location: &str,
    node: &str,
    version: &str,
    members: &[(&str, &[&str])],
) -> RawBundle {
    RawBundle {
        log_location: location.to_string(),
        version: Some(version.to_string()),
        stats: Some(StatsSection {
            node_name: node.to_string(),
            counters: BTreeMap::from([("ops".to_string(), json!(10))]),
        }),
        config: Some(ClusterConfig {
            nodes: members
                .iter()
                .map(|(name, services)| member(name, services, version))
                .collect(),
        }),
        ..Default::default()
    }
}

pub fn log_bundle(location: &str, hostname: &str) -> RawBundle {
    RawBundle {
        log_location: location.to_string(),
        log: Some(LogSection {
            hostname: Some(hostname.to_string()),
            entries: vec!["boot".to_string()],
        }),
        ..Default::default()
    }
}

pub struct FakeExtractor;

impl ResultExtractor for FakeExtractor {
    fn node_results(&self, bundle: &RawBundle) -> Value {
        json!({ "from": bundle.log_location })
    }

    fn node_stats(&self, bundle: &RawBundle) -> Value {
        json!({ "stats_of": bundle.reported_node() })
    }

    fn cluster_results(&self, cluster: &dyn ClusterObject) -> Value {
        json!({ "nodes": cluster.nodes() })
    }
}

#[derive(Debug, Clone)]
pub struct FakeCluster {
    pub nodes: Vec<String>,
    /// Fixed display name; otherwise the first node without its prefix.
    pub name: Option<String>,
    pub ver4: bool,
    pub config: ClusterConfig,
}

impl FakeCluster {
    pub fn new(members: &[(&str, &[&str])]) -> Self {
        Self {
            nodes: members.iter().map(|(n, _)| n.to_string()).collect(),
            name: None,
            ver4: true,
            config: ClusterConfig {
                nodes: members
                    .iter()
                    .map(|(name, services)| member(name, services, "4.1.0"))
                    .collect(),
            },
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn pre_ver4(mut self) -> Self {
        self.ver4 = false;
        self
    }
}

impl ClusterObject for FakeCluster {
    fn nodes(&self) -> Vec<String> {
        self.nodes.clone()
    }

    fn summarize_name(&self, nodes: &[String]) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        nodes
            .iter()
            .min()
            .map(|n| n.trim_start_matches("ns_1@").to_string())
            .unwrap_or_default()
    }

    fn check_for_ver4_nodes(&self) -> bool {
        self.ver4
    }

    fn config(&self) -> &ClusterConfig {
        &self.config
    }
}

pub struct FakeDiscovery {
    pub clusters: Vec<FakeCluster>,
    pub fail: bool,
}

impl ClusterDiscovery for FakeDiscovery {
    fn aggregate_cluster_info(
        &self,
        _bundles: &[Option<RawBundle>],
        _node_results: &ResultMap,
        _node_stats: &ResultMap,
    ) -> Result<Vec<Box<dyn ClusterObject>>> {
        if self.fail {
            return Err(Error::Discovery("grouping exploded".to_string()));
        }
        Ok(self
            .clusters
            .iter()
            .cloned()
            .map(|c| Box::new(c) as Box<dyn ClusterObject>)
            .collect())
    }
}

pub struct FakeServices;

impl ServiceLookup for FakeServices {
    fn services_of_node(&self, config: &ClusterConfig, node: &str) -> Vec<String> {
        config.services_of(node)
    }
}

#[derive(Default)]
pub struct FakeParser {
    pub bundles: HashMap<PathBuf, RawBundle>,
}

impl FakeParser {
    pub fn with(mut self, location: &str, bundle: RawBundle) -> Self {
        self.bundles.insert(PathBuf::from(location), bundle);
        self
    }
}

impl BundleParser for FakeParser {
    fn parse_log_location(&self, location: &Path) -> Option<RawBundle> {
        self.bundles.get(location).cloned()
    }
}

pub struct FakeFormatter;

impl ReportFormatter for FakeFormatter {
    fn format_results(
        &self,
        node_results: &ResultMap,
        cluster_results: &ResultMap,
        format: OutputFormat,
    ) -> Result<String> {
        Ok(format!(
            "{} report: {} nodes, {} clusters",
            format,
            node_results.len(),
            cluster_results.len()
        ))
    }
}

pub fn fake_toolkit(parser: FakeParser, clusters: Vec<FakeCluster>) -> Toolkit {
    Toolkit {
        parser: Box::new(parser),
        extractor: Box::new(FakeExtractor),
        discovery: Box::new(FakeDiscovery {
            clusters,
            fail: false,
        }),
        services: Box::new(FakeServices),
        formatter: Box::new(FakeFormatter),
    }
}
