//! Seams to the parser, grouping algorithm, service lookup and formatter.
//!
//! The pipeline only talks to these traits. [`Toolkit::snapshot`] wires in
//! the default implementations from [`crate::snapshot`]; tests swap in fakes.

use crate::settings::Settings;
use crate::snapshot;
use cbtopo_bundle_schema::{ClusterConfig, RawBundle};
use cbtopo_common::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Opaque per-node or per-cluster results, keyed by name.
pub type ResultMap = BTreeMap<String, Value>;

/// Turns one log location into a parsed bundle.
pub trait BundleParser {
    /// `None` when the location cannot be parsed; the caller skips it.
    fn parse_log_location(&self, location: &Path) -> Option<RawBundle>;
}

/// Pulls report data out of bundles and clusters.
pub trait ResultExtractor {
    fn node_results(&self, bundle: &RawBundle) -> Value;
    fn node_stats(&self, bundle: &RawBundle) -> Value;
    fn cluster_results(&self, cluster: &dyn ClusterObject) -> Value;
}

/// One cluster as returned by the grouping algorithm.
pub trait ClusterObject: fmt::Debug {
    /// Member node names, in the grouping algorithm's order.
    fn nodes(&self) -> Vec<String>;
    /// Display name for a list of node names.
    fn summarize_name(&self, nodes: &[String]) -> String;
    /// Whether any member runs a server generation with per-node services.
    fn check_for_ver4_nodes(&self) -> bool;
    fn config(&self) -> &ClusterConfig;
}

/// Groups node identities into clusters.
pub trait ClusterDiscovery {
    fn aggregate_cluster_info(
        &self,
        bundles: &[Option<RawBundle>],
        node_results: &ResultMap,
        node_stats: &ResultMap,
    ) -> Result<Vec<Box<dyn ClusterObject>>>;
}

/// Which services a node runs, according to a cluster configuration.
pub trait ServiceLookup {
    fn services_of_node(&self, config: &ClusterConfig, node: &str) -> Vec<String>;
}

/// Formats the combined node and cluster report.
pub trait ReportFormatter {
    fn format_results(
        &self,
        node_results: &ResultMap,
        cluster_results: &ResultMap,
        format: OutputFormat,
    ) -> Result<String>;
}

/// Output format of the combined report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(Error::Config(format!("unknown output format: {}", s))),
        }
    }
}

/// The full set of collaborators a run needs.
pub struct Toolkit {
    pub parser: Box<dyn BundleParser>,
    pub extractor: Box<dyn ResultExtractor>,
    pub discovery: Box<dyn ClusterDiscovery>,
    pub services: Box<dyn ServiceLookup>,
    pub formatter: Box<dyn ReportFormatter>,
}

impl Toolkit {
    /// Collaborators that read `bundle.json` snapshots from disk.
    pub fn snapshot(settings: &Settings) -> Self {
        Self {
            parser: Box::new(snapshot::SnapshotParser::new(
                &settings.bundle_file,
                settings.validate_schema,
            )),
            extractor: Box::new(snapshot::SnapshotExtractor),
            discovery: Box::new(snapshot::MembershipDiscovery),
            services: Box::new(snapshot::ConfigServices),
            formatter: Box::new(snapshot::PlainFormatter),
        }
    }
}
