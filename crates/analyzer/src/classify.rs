//! Bundle classification into node records.

use crate::collaborators::ResultExtractor;
use cbtopo_bundle_schema::RawBundle;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// The recognized shapes of a parsed bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleShape<'a> {
    /// Carries a statistics section; the node name comes from it.
    StatsBearing { node_name: &'a str },
    /// Carries only a log section with a hostname.
    LogOnly { hostname: &'a str },
    Unrecognized,
}

impl<'a> BundleShape<'a> {
    /// Decide the shape of a bundle. The stats section is checked first.
    pub fn of(bundle: &'a RawBundle) -> Self {
        if let Some(stats) = &bundle.stats {
            return BundleShape::StatsBearing {
                node_name: stats.node_name(),
            };
        }
        match bundle.log.as_ref().and_then(|log| log.hostname()) {
            Some(hostname) => BundleShape::LogOnly { hostname },
            None => BundleShape::Unrecognized,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BundleShape::StatsBearing { .. } => "stats",
            BundleShape::LogOnly { .. } => "log",
            BundleShape::Unrecognized => "unrecognized",
        }
    }
}

/// One node discovered from one bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    pub name: String,
    pub log_location: String,
    pub results: Value,
    /// Absent for log-only bundles.
    pub stats: Option<Value>,
}

/// Classify one parser output into at most one node record.
pub fn classify(bundle: Option<&RawBundle>, extractor: &dyn ResultExtractor) -> Option<NodeRecord> {
    let bundle = bundle?;

    match BundleShape::of(bundle) {
        BundleShape::StatsBearing { node_name } => Some(NodeRecord {
            name: node_name.to_string(),
            log_location: bundle.log_location.clone(),
            results: extractor.node_results(bundle),
            stats: Some(extractor.node_stats(bundle)),
        }),
        BundleShape::LogOnly { hostname } => Some(NodeRecord {
            name: hostname.to_string(),
            log_location: bundle.log_location.clone(),
            results: extractor.node_results(bundle),
            stats: None,
        }),
        BundleShape::Unrecognized => {
            debug!(
                "Skipping bundle from {}: no stats or log section",
                bundle.log_location
            );
            None
        }
    }
}
