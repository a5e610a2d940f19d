//! Bundle validation utilities.

use crate::schema;
use jsonschema::JSONSchema;
use serde_json::Value;
use thiserror::Error;

/// Validation error type.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Schema validation failed: {0}")]
    SchemaError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<ValidationError> for cbtopo_common::Error {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::SchemaError(msg) => cbtopo_common::Error::SchemaValidation(msg),
            ValidationError::JsonError(err) => cbtopo_common::Error::Json(err),
        }
    }
}

/// Result of bundle validation.
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a bundle snapshot against the JSON schema.
///
/// A bundle with no identity-bearing section is still valid, but gets a
/// warning since it will never produce a node.
pub fn validate_bundle(bundle: &Value) -> Result<ValidationResult, ValidationError> {
    let mut result = ValidationResult::new();

    let schema_value = schema::bundle_schema();
    let compiled = JSONSchema::compile(&schema_value)
        .map_err(|e| ValidationError::SchemaError(e.to_string()))?;

    let validation = compiled.validate(bundle);
    if let Err(errors) = validation {
        for error in errors {
            result.add_error(ValidationError::SchemaError(format!(
                "{} at {}",
                error, error.instance_path
            )));
        }
    }

    let has_section = |keys: &[&str]| {
        keys.iter()
            .any(|k| bundle.get(*k).map(|v| !v.is_null()).unwrap_or(false))
    };
    if !has_section(&["stats", "ns_stats", "log", "cblog"]) {
        result.add_warning("Bundle has neither a stats nor a log section".to_string());
    }

    Ok(result)
}
