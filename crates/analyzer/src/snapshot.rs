//! Default collaborators working on `bundle.json` snapshots.
//!
//! Each log location holds one snapshot written by the collector. The
//! discovery groups nodes with a union-find over the membership every
//! bundle reports, so a cluster is found as long as its members' bundles
//! overlap in what they know about each other.

use crate::collaborators::{
    BundleParser, ClusterDiscovery, ClusterObject, OutputFormat, ReportFormatter, ResultExtractor,
    ResultMap, ServiceLookup,
};
use crate::classify::BundleShape;
use crate::render::short_node_name;
use cbtopo_bundle_schema::{major_version, validate_bundle, ClusterConfig, NodeConfig, RawBundle};
use cbtopo_common::{Error, Result};
use petgraph::unionfind::UnionFind;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::{self, Write as _};
use std::path::Path;
use tracing::debug;

/// Reads and validates `<location>/<bundle_file>`.
pub struct SnapshotParser {
    bundle_file: String,
    validate_schema: bool,
}

impl SnapshotParser {
    pub fn new(bundle_file: &str, validate_schema: bool) -> Self {
        Self {
            bundle_file: bundle_file.to_string(),
            validate_schema,
        }
    }

    fn read(&self, location: &Path) -> Result<RawBundle> {
        let path = location.join(&self.bundle_file);
        let content = std::fs::read_to_string(&path)?;
        let value: Value = serde_json::from_str(&content)?;

        if self.validate_schema {
            let result = validate_bundle(&value)?;
            for warning in &result.warnings {
                debug!("{:?}: {}", path, warning);
            }
            if !result.valid {
                let errors: Vec<String> = result.errors.iter().map(|e| e.to_string()).collect();
                return Err(Error::SchemaValidation(errors.join("; ")));
            }
        }

        let mut bundle: RawBundle = serde_json::from_value(value)
            .map_err(|e| Error::InvalidBundle(format!("{:?}: {}", path, e)))?;
        bundle.log_location = location
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| location.display().to_string());
        Ok(bundle)
    }
}

impl BundleParser for SnapshotParser {
    fn parse_log_location(&self, location: &Path) -> Option<RawBundle> {
        match self.read(location) {
            Ok(bundle) => Some(bundle),
            Err(e) => {
                debug!("Skipping log location {:?}: {}", location, e);
                None
            }
        }
    }
}

pub struct SnapshotExtractor;

impl ResultExtractor for SnapshotExtractor {
    fn node_results(&self, bundle: &RawBundle) -> Value {
        json!({
            "log_location": bundle.log_location,
            "version": bundle.version,
            "collected_at": bundle.collected_at.map(|t| t.to_rfc3339()),
            "shape": BundleShape::of(bundle).label(),
            "log_entries": bundle.log.as_ref().map(|l| l.entries.len()).unwrap_or(0),
        })
    }

    fn node_stats(&self, bundle: &RawBundle) -> Value {
        match &bundle.stats {
            Some(stats) => Value::Object(stats.counters.clone().into_iter().collect()),
            None => Value::Null,
        }
    }

    fn cluster_results(&self, cluster: &dyn ClusterObject) -> Value {
        let nodes = cluster.nodes();
        let mut services: BTreeMap<String, usize> = BTreeMap::new();
        let mut versions: BTreeSet<String> = BTreeSet::new();
        for node in &nodes {
            if let Some(entry) = cluster.config().node(node) {
                for service in &entry.services {
                    *services.entry(service.clone()).or_default() += 1;
                }
                versions.extend(entry.version.clone());
            }
        }
        json!({
            "node_count": nodes.len(),
            "nodes": nodes,
            "services": services,
            "versions": versions,
            "ver4": cluster.check_for_ver4_nodes(),
        })
    }
}

/// A cluster found by [`MembershipDiscovery`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotCluster {
    nodes: Vec<String>,
    config: ClusterConfig,
}

impl ClusterObject for SnapshotCluster {
    fn nodes(&self) -> Vec<String> {
        self.nodes.clone()
    }

    fn summarize_name(&self, nodes: &[String]) -> String {
        match nodes.iter().min() {
            Some(first) => short_node_name(first).to_string(),
            None => "(empty)".to_string(),
        }
    }

    fn check_for_ver4_nodes(&self) -> bool {
        self.nodes.iter().any(|node| {
            self.config
                .node(node)
                .and_then(|n| n.version.as_deref())
                .and_then(major_version)
                .map(|major| major >= 4)
                .unwrap_or(false)
        })
    }

    fn config(&self) -> &ClusterConfig {
        &self.config
    }
}

/// Groups nodes that any bundle reports as members of the same cluster.
pub struct MembershipDiscovery;

impl ClusterDiscovery for MembershipDiscovery {
    fn aggregate_cluster_info(
        &self,
        bundles: &[Option<RawBundle>],
        node_results: &ResultMap,
        _node_stats: &ResultMap,
    ) -> Result<Vec<Box<dyn ClusterObject>>> {
        let mut names: Vec<String> = Vec::new();
        let mut ids: HashMap<String, usize> = HashMap::new();
        let mut intern = |name: &str| -> usize {
            *ids.entry(name.to_string()).or_insert_with(|| {
                names.push(name.to_string());
                names.len() - 1
            })
        };

        // Members of each bundle, own identity first.
        let mut memberships: Vec<(Vec<usize>, &RawBundle)> = Vec::new();
        for bundle in bundles.iter().flatten() {
            let mut members = Vec::new();
            if let Some(node) = bundle.reported_node() {
                members.push(intern(node));
            }
            if let Some(config) = &bundle.config {
                for name in config.node_names() {
                    if name.is_empty() {
                        return Err(Error::Discovery(format!(
                            "empty member name in config of {}",
                            bundle.log_location
                        )));
                    }
                    members.push(intern(name));
                }
            }
            if !members.is_empty() {
                memberships.push((members, bundle));
            }
        }
        for node in node_results.keys() {
            intern(node.as_str());
        }

        let mut sets = UnionFind::<usize>::new(names.len());
        for (members, _) in &memberships {
            for other in &members[1..] {
                sets.union(members[0], *other);
            }
        }

        let mut groups: BTreeMap<usize, SnapshotCluster> = BTreeMap::new();
        for (i, name) in names.iter().enumerate() {
            groups
                .entry(sets.find(i))
                .or_default()
                .nodes
                .push(name.clone());
        }
        for (members, bundle) in &memberships {
            if let Some(config) = &bundle.config {
                let group = groups.entry(sets.find(members[0])).or_default();
                group.config.merge(config);
            }
        }
        // A node's own bundle version stands in wherever the merged config
        // has no version for it, so it counts for the capability check.
        for (members, bundle) in &memberships {
            let (Some(node), Some(version)) = (bundle.reported_node(), &bundle.version) else {
                continue;
            };
            let group = groups.entry(sets.find(members[0])).or_default();
            match group.config.nodes.iter_mut().find(|n| n.name == node) {
                Some(entry) => {
                    if entry.version.is_none() {
                        entry.version = Some(version.clone());
                    }
                }
                None => group.config.nodes.push(NodeConfig {
                    name: node.to_string(),
                    services: vec![],
                    version: Some(version.clone()),
                }),
            }
        }

        let mut clusters: Vec<SnapshotCluster> = groups
            .into_values()
            .map(|mut c| {
                c.nodes.sort();
                c
            })
            .collect();
        clusters.sort_by(|a, b| a.nodes.first().cmp(&b.nodes.first()));

        debug!("Discovered {} clusters", clusters.len());
        Ok(clusters
            .into_iter()
            .map(|c| Box::new(c) as Box<dyn ClusterObject>)
            .collect())
    }
}

/// Services straight from the cluster configuration.
pub struct ConfigServices;

impl ServiceLookup for ConfigServices {
    fn services_of_node(&self, config: &ClusterConfig, node: &str) -> Vec<String> {
        config.services_of(node)
    }
}

/// Text or JSON rendering of the combined node and cluster results.
pub struct PlainFormatter;

impl ReportFormatter for PlainFormatter {
    fn format_results(
        &self,
        node_results: &ResultMap,
        cluster_results: &ResultMap,
        format: OutputFormat,
    ) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "nodes": node_results,
                "clusters": cluster_results,
            }))?),
            OutputFormat::Text => text_report(node_results, cluster_results)
                .map_err(|e| Error::Other(format!("report formatting failed: {}", e))),
        }
    }
}

fn text_report(
    node_results: &ResultMap,
    cluster_results: &ResultMap,
) -> std::result::Result<String, fmt::Error> {
    let mut out = String::new();
    write_section(&mut out, "Nodes", node_results)?;
    writeln!(out)?;
    write_section(&mut out, "Clusters", cluster_results)?;
    Ok(out)
}

fn write_section(out: &mut String, title: &str, results: &ResultMap) -> fmt::Result {
    writeln!(out, "{} ({})", title, results.len())?;
    for (name, value) in results {
        writeln!(out, "  {}", name)?;
        match value.as_object() {
            Some(fields) => {
                for (key, field) in fields {
                    writeln!(out, "    {}: {}", key, scalar(field))?;
                }
            }
            None => writeln!(out, "    {}", scalar(value))?,
        }
    }
    Ok(())
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
