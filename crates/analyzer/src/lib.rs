//! cbtopo analyzer - classify diagnostic bundles and summarize cluster topology.

pub mod classify;
pub mod clusters;
pub mod collaborators;
pub mod merge;
pub mod nodes;
pub mod render;
pub mod scan;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod table;
pub mod topology;

#[cfg(test)]
mod fixtures;

pub use collaborators::{OutputFormat, Toolkit};
pub use merge::{Collision, MergePolicy};
pub use session::SessionBindings;
pub use settings::{Layout, Settings};

use cbtopo_bundle_schema::RawBundle;
use cbtopo_common::Result;
use clusters::ClusterIndex;
use nodes::NodeIndex;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracing::info;

/// Printed between the cluster tables and the combined report in sessions.
pub const SESSION_SEPARATOR: &str = "-----";

/// Everything one run over a set of log locations produced.
#[derive(Debug)]
pub struct AggregationRun {
    pub log_locations: Vec<PathBuf>,
    /// Parser output per log location, in the same order.
    pub bundles: Vec<Option<RawBundle>>,
    pub nodes: NodeIndex,
    pub clusters: ClusterIndex,
}

impl AggregationRun {
    /// Node names, sorted ascending.
    pub fn node_names(&self) -> Vec<String> {
        self.nodes.node_names()
    }

    /// Cluster names, sorted ascending.
    pub fn cluster_names(&self) -> Vec<String> {
        self.clusters.cluster_names()
    }

    /// Node and cluster collisions resolved during the run.
    pub fn collisions(&self) -> impl Iterator<Item = &Collision> {
        self.nodes
            .collisions
            .iter()
            .chain(self.clusters.collisions.iter())
    }

    /// The run's fields as host variables.
    pub fn namespace(&self) -> Map<String, Value> {
        let locations: Vec<String> = self
            .log_locations
            .iter()
            .map(|p| p.display().to_string())
            .collect();

        let mut vars = Map::new();
        vars.insert("log_locations".to_string(), json!(locations));
        vars.insert("node_results".to_string(), json!(self.nodes.results));
        vars.insert("node_stats".to_string(), json!(self.nodes.stats));
        vars.insert("node_infos".to_string(), json!(self.nodes.infos));
        vars.insert("node_names".to_string(), json!(self.node_names()));
        vars.insert("cluster_results".to_string(), json!(self.clusters.results));
        vars.insert("cluster_names".to_string(), json!(self.cluster_names()));
        vars.insert(
            "collisions".to_string(),
            json!(self.collisions().collect::<Vec<_>>()),
        );
        vars
    }
}

/// Tables and report of one complete run.
#[derive(Debug)]
pub struct RunOutput {
    pub run: AggregationRun,
    /// One rendered table per cluster that has one, in cluster name order.
    pub tables: Vec<String>,
    pub report: String,
}

impl RunOutput {
    /// Host variables: `r`, the run's fields and the session bindings.
    pub fn namespace(&self, session: Option<&SessionBindings>) -> Value {
        let run_vars = self.run.namespace();
        let mut vars = run_vars.clone();
        vars.insert("r".to_string(), Value::Object(run_vars));
        if let Some(bindings) = session {
            let bound = bindings.namespace_beside(&vars);
            vars.extend(bound);
        }
        Value::Object(vars)
    }
}

/// Parse, classify and aggregate a list of log locations.
pub fn process_log_locations(
    log_locations: &[PathBuf],
    toolkit: &Toolkit,
    settings: &Settings,
) -> Result<AggregationRun> {
    // Step 1: Parse every location, keeping input order
    let bundles: Vec<Option<RawBundle>> = log_locations
        .iter()
        .map(|location| toolkit.parser.parse_log_location(location))
        .collect();

    // Step 2: Classify bundles into nodes
    let records = bundles
        .iter()
        .map(|bundle| classify::classify(bundle.as_ref(), toolkit.extractor.as_ref()));
    let mut nodes = NodeIndex::build(records, settings.merge_policy)?;

    // Step 3: Group nodes into clusters
    let clusters =
        clusters::aggregate_clusters(&bundles, &mut nodes, toolkit, settings.merge_policy)?;

    info!(
        "Processed {} log locations: {} nodes in {} clusters",
        log_locations.len(),
        nodes.len(),
        clusters.len()
    );

    Ok(AggregationRun {
        log_locations: log_locations.to_vec(),
        bundles,
        nodes,
        clusters,
    })
}

/// Render every cluster in name order; clusters without a table are left out.
pub fn render_clusters(
    run: &AggregationRun,
    toolkit: &Toolkit,
    settings: &Settings,
    mut session: Option<&mut SessionBindings>,
) -> Vec<String> {
    let mut tables = Vec::new();
    for record in run.clusters.records.values() {
        let rendered = match settings.layout {
            Layout::Matrix => render::render_cluster(
                record,
                toolkit.services.as_ref(),
                settings,
                session.as_deref_mut(),
            ),
            Layout::Services => {
                render::render_service_summary(record, toolkit.services.as_ref(), settings)
            }
        };
        tables.extend(rendered);
    }
    tables
}

/// Run the whole pipeline over the log locations found in `dir`.
pub fn run(
    dir: &Path,
    toolkit: &Toolkit,
    settings: &Settings,
    format: OutputFormat,
    session: Option<&mut SessionBindings>,
) -> Result<RunOutput> {
    let log_locations = scan::scan_log_locations(dir)?;
    let run = process_log_locations(&log_locations, toolkit, settings)?;
    let tables = render_clusters(&run, toolkit, settings, session);
    let report = toolkit
        .formatter
        .format_results(&run.nodes.results, &run.clusters.results, format)?;

    Ok(RunOutput {
        run,
        tables,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{fake_toolkit, log_bundle, stats_bundle, FakeCluster, FakeParser};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn write_bundle(dir: &Path, location: &str, bundle: Value) {
        let path = dir.join(location);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("bundle.json"), bundle.to_string()).unwrap();
    }

    fn two_node_snapshot(dir: &Path) {
        let config = json!({
            "nodes": [
                { "name": "ns_1@10.0.0.1", "services": ["kv", "index"], "version": "4.1.0" },
                { "name": "ns_1@10.0.0.2", "services": ["kv"], "version": "4.1.0" }
            ]
        });
        write_bundle(
            dir,
            "node-a",
            json!({ "version": "4.1.0", "ns_stats": { "node_name": "ns_1@10.0.0.1" }, "config": config }),
        );
        write_bundle(
            dir,
            "node-b",
            json!({ "version": "4.1.0", "ns_stats": { "node_name": "ns_1@10.0.0.2" }, "config": config }),
        );
    }

    #[test]
    fn test_two_node_cluster_end_to_end() {
        let dir = tempdir().unwrap();
        two_node_snapshot(dir.path());
        std::fs::create_dir(dir.path().join(".trash")).unwrap();
        std::fs::write(dir.path().join("README"), "not a location").unwrap();

        let settings = Settings::default();
        let toolkit = Toolkit::snapshot(&settings);
        let output = run(dir.path(), &toolkit, &settings, OutputFormat::Text, None).unwrap();

        assert_eq!(output.run.log_locations.len(), 2);
        assert_eq!(output.run.node_names(), vec!["ns_1@10.0.0.1", "ns_1@10.0.0.2"]);
        assert_eq!(output.run.cluster_names(), vec!["10.0.0.1"]);
        assert_eq!(
            output.tables,
            vec![[
                "Cluster (10.0.0.1) (nodes: 2)",
                "node           n#  services:  index  kv",
                "-------------  --  ---------  -----  --",
                "ns_1@10.0.0.1  0              y      y",
                "ns_1@10.0.0.2  1              -      y",
            ]
            .join("\n")]
        );
        assert!(output.report.starts_with("Nodes (2)"));
        assert!(output.report.contains("Clusters (1)"));
    }

    #[test]
    fn test_pre_ver4_cluster_still_reported() {
        let dir = tempdir().unwrap();
        two_node_snapshot(dir.path());
        write_bundle(
            dir.path(),
            "old-node",
            json!({
                "version": "3.0.3",
                "cblog": { "hostname": "ns_1@10.9.0.1" },
                "config": { "nodes": [{ "name": "ns_1@10.9.0.1", "version": "3.0.3" }] }
            }),
        );

        let settings = Settings::default();
        let toolkit = Toolkit::snapshot(&settings);
        let output = run(dir.path(), &toolkit, &settings, OutputFormat::Text, None).unwrap();

        assert_eq!(output.run.cluster_names(), vec!["10.0.0.1", "10.9.0.1"]);
        assert_eq!(output.tables.len(), 1);
        assert!(output.tables[0].starts_with("Cluster (10.0.0.1)"));
        assert!(output.report.contains("Clusters (2)"));
        assert!(output.report.contains("  10.9.0.1\n"));
        assert_eq!(
            output.run.nodes.infos["ns_1@10.9.0.1"].cluster_name.as_deref(),
            Some("10.9.0.1")
        );
        assert!(!output.run.nodes.stats.contains_key("ns_1@10.9.0.1"));
    }

    #[test]
    fn test_rerun_is_deterministic() {
        let dir = tempdir().unwrap();
        two_node_snapshot(dir.path());
        let settings = Settings::default();
        let toolkit = Toolkit::snapshot(&settings);

        let first = run(dir.path(), &toolkit, &settings, OutputFormat::Json, None).unwrap();
        let second = run(dir.path(), &toolkit, &settings, OutputFormat::Json, None).unwrap();

        assert_eq!(first.run.node_names(), second.run.node_names());
        assert_eq!(first.run.cluster_names(), second.run.cluster_names());
        assert_eq!(first.tables, second.tables);
        assert_eq!(first.report, second.report);
    }

    #[test]
    fn test_session_numbering_continues_across_runs() {
        let dir = tempdir().unwrap();
        two_node_snapshot(dir.path());
        let settings = Settings::default();
        let toolkit = Toolkit::snapshot(&settings);
        let mut bindings = SessionBindings::new();

        let first = run(dir.path(), &toolkit, &settings, OutputFormat::Text, Some(&mut bindings))
            .unwrap();
        assert!(first.tables[0].contains("ns_1@10.0.0.2  n1"));

        std::fs::remove_dir_all(dir.path().join("node-b")).unwrap();
        let second = run(dir.path(), &toolkit, &settings, OutputFormat::Text, Some(&mut bindings))
            .unwrap();

        assert!(second.tables[0].contains("ns_1@10.0.0.1  n2"));
        assert!(second.tables[0].contains("ns_1@10.0.0.2  n3"));
        assert_eq!(bindings.node_ids(), ["n0", "n1", "n2", "n3"]);
        assert_eq!(bindings.service_ids("kv"), ["kv0", "kv1", "kv2", "kv3"]);
        assert_eq!(bindings.service_ids("index"), ["index0", "index1"]);
        assert_eq!(bindings.resolve("n0"), Some("ns_1@10.0.0.1"));
        assert_eq!(bindings.resolve("n2"), Some("ns_1@10.0.0.1"));
    }

    #[test]
    fn test_duplicate_node_across_locations() {
        let parser = FakeParser::default()
            .with("loc-1", stats_bundle("loc-1", "ns_1@a", "4.1.0", &[]))
            .with("loc-2", log_bundle("loc-2", "ns_1@a"));
        let toolkit = fake_toolkit(parser, vec![FakeCluster::new(&[("ns_1@a", &["kv"])])]);
        let locations = vec![PathBuf::from("loc-1"), PathBuf::from("loc-2")];

        let run = process_log_locations(&locations, &toolkit, &Settings::default()).unwrap();
        assert_eq!(run.node_names(), vec!["ns_1@a"]);
        assert_eq!(run.nodes.infos["ns_1@a"].log_location, "loc-2");
        assert_eq!(run.collisions().count(), 1);

        let strict = Settings {
            merge_policy: MergePolicy::Reject,
            ..Default::default()
        };
        assert!(process_log_locations(&locations, &toolkit, &strict).is_err());
    }

    #[test]
    fn test_services_layout() {
        let parser = FakeParser::default()
            .with("loc-1", stats_bundle("loc-1", "ns_1@10.0.0.1", "4.1.0", &[]))
            .with("loc-2", stats_bundle("loc-2", "ns_1@10.0.0.2", "4.1.0", &[]));
        let toolkit = fake_toolkit(
            parser,
            vec![FakeCluster::new(&[
                ("ns_1@10.0.0.1", &["kv", "index"]),
                ("ns_1@10.0.0.2", &["kv"]),
            ])],
        );
        let settings = Settings {
            layout: Layout::Services,
            ..Default::default()
        };
        let locations = vec![PathBuf::from("loc-1"), PathBuf::from("loc-2")];

        let run = process_log_locations(&locations, &toolkit, &settings).unwrap();
        let mut bindings = SessionBindings::new();
        let tables = render_clusters(&run, &toolkit, &settings, Some(&mut bindings));

        assert_eq!(tables.len(), 1);
        assert!(tables[0].starts_with("Cluster (10.0.0.1)\nService  Total  Nodes"));
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_unparseable_locations_are_skipped() {
        let parser = FakeParser::default().with("good", stats_bundle("good", "ns_1@a", "4.1.0", &[]));
        let toolkit = fake_toolkit(parser, vec![FakeCluster::new(&[("ns_1@a", &["kv"])])]);
        let locations = vec![PathBuf::from("bad"), PathBuf::from("good")];

        let run = process_log_locations(&locations, &toolkit, &Settings::default()).unwrap();

        assert_eq!(run.bundles.len(), 2);
        assert!(run.bundles[0].is_none());
        assert_eq!(run.node_names(), vec!["ns_1@a"]);
    }

    #[test]
    fn test_namespace_exposes_run_and_bindings() {
        let parser = FakeParser::default().with("loc", stats_bundle("loc", "ns_1@a", "4.1.0", &[]));
        let toolkit = fake_toolkit(parser, vec![FakeCluster::new(&[("ns_1@a", &["kv"])])]);
        let settings = Settings::default();
        let run = process_log_locations(&[PathBuf::from("loc")], &toolkit, &settings).unwrap();
        let mut bindings = SessionBindings::new();
        let tables = render_clusters(&run, &toolkit, &settings, Some(&mut bindings));
        let output = RunOutput {
            run,
            tables,
            report: String::new(),
        };

        let vars = output.namespace(Some(&bindings));

        assert_eq!(vars["node_names"], json!(["ns_1@a"]));
        assert_eq!(vars["r"]["cluster_names"], json!(["a"]));
        assert_eq!(vars["node_infos"]["ns_1@a"]["cluster_name"], "a");
        assert_eq!(vars["nAll"], json!(["n0"]));
        assert_eq!(vars["kv0"], "ns_1@a");
    }

    #[test]
    fn test_namespace_keeps_node_list_beside_service_named_n() {
        let parser = FakeParser::default().with("loc", stats_bundle("loc", "ns_1@a", "4.1.0", &[]));
        let toolkit = fake_toolkit(parser, vec![FakeCluster::new(&[("ns_1@a", &["n"])])]);
        let settings = Settings::default();
        let run = process_log_locations(&[PathBuf::from("loc")], &toolkit, &settings).unwrap();
        let mut bindings = SessionBindings::new();
        let tables = render_clusters(&run, &toolkit, &settings, Some(&mut bindings));
        let output = RunOutput {
            run,
            tables,
            report: String::new(),
        };

        let vars = output.namespace(Some(&bindings));

        assert_eq!(vars["nAll"], json!(["n0"]));
        assert_eq!(vars["nAll1"], json!(["n1"]));
        assert_eq!(vars["n1"], "ns_1@a");
        assert!(vars["r"].is_object());
        assert_eq!(vars["node_names"], json!(["ns_1@a"]));
    }
}
