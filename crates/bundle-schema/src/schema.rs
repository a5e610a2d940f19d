//! JSON schema definitions for bundle validation.

/// JSON Schema for a bundle snapshot (bundle.json).
pub const BUNDLE_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "title": "cbtopo Bundle Snapshot",
  "type": "object",
  "properties": {
    "version": { "type": ["string", "null"] },
    "collected_at": {
      "type": ["string", "null"],
      "format": "date-time"
    },
    "stats": { "$ref": "#/definitions/stats" },
    "ns_stats": { "$ref": "#/definitions/stats" },
    "log": { "$ref": "#/definitions/log" },
    "cblog": { "$ref": "#/definitions/log" },
    "config": {
      "type": ["object", "null"],
      "properties": {
        "nodes": {
          "type": "array",
          "items": {
            "type": "object",
            "required": ["name"],
            "properties": {
              "name": { "type": "string" },
              "services": { "type": "array", "items": { "type": "string" } },
              "version": { "type": ["string", "null"] }
            }
          }
        }
      }
    }
  },
  "definitions": {
    "stats": {
      "type": ["object", "null"],
      "required": ["node_name"],
      "properties": {
        "node_name": { "type": "string", "minLength": 1 },
        "counters": { "type": "object" }
      }
    },
    "log": {
      "type": ["object", "null"],
      "properties": {
        "hostname": { "type": ["string", "null"] },
        "entries": { "type": "array", "items": { "type": "string" } }
      }
    }
  }
}"##;

/// Get the bundle schema as a parsed JSON value.
pub fn bundle_schema() -> serde_json::Value {
    serde_json::from_str(BUNDLE_SCHEMA).expect("Invalid bundle schema")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_parses_with_definitions() {
        let schema = bundle_schema();
        assert_eq!(schema["properties"]["stats"]["$ref"], "#/definitions/stats");
        assert_eq!(schema["properties"]["cblog"]["$ref"], "#/definitions/log");
        assert!(schema["definitions"]["stats"].is_object());
        assert!(schema["definitions"]["log"].is_object());
    }
}
