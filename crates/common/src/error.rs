//! Common error types for cbtopo.

use thiserror::Error;

/// Common error type for cbtopo operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid bundle: {0}")]
    InvalidBundle(String),

    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("Duplicate node {name}: {first} and {second} both report it")]
    DuplicateNode {
        name: String,
        first: String,
        second: String,
    },

    #[error("Duplicate cluster name: {name}")]
    DuplicateCluster { name: String },

    #[error("Cluster discovery failed: {0}")]
    Discovery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias using common Error.
pub type Result<T> = std::result::Result<T, Error>;
