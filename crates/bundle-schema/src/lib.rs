//! Bundle schema definitions for cbtopo.
//!
//! This crate defines the structure of parsed diagnostic bundles,
//! the cluster configuration section they carry, and schema validation.

pub mod bundle;
pub mod config;
pub mod schema;
pub mod validation;

pub use bundle::{LogSection, RawBundle, StatsSection};
pub use config::{major_version, ClusterConfig, NodeConfig};
pub use validation::validate_bundle;
