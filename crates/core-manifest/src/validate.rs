//! Shape validation for Ollama manifest documents
//!
//! Manifests are checked against a JSON Schema before typed decoding so a
//! malformed document is reported with the JSON pointer of the bad field
//! instead of a serde position.

use crate::error::{Error, Result};
use jsonschema::{ValidationError, Validator};
use serde_json::{json, Value};

/// Validate a raw manifest document against the manifest schema
pub fn validate_manifest_shape(document: &Value) -> Result<()> {
    let schema = get_manifest_schema();
    let compiled = Validator::new(&schema)
        .map_err(|e| Error::malformed(format!("Failed to compile schema: {}", e)))?;

    if let Err(errors) = compiled.validate(document) {
        let error_messages: Vec<String> = errors.map(|e| format_validation_error(&e)).collect();

        return Err(Error::malformed(error_messages.join("; ")));
    }

    Ok(())
}

fn format_validation_error(error: &ValidationError) -> String {
    let pointer = error.instance_path.to_string();
    if pointer.is_empty() {
        error.to_string()
    } else {
        format!("{}: {}", pointer, error)
    }
}

/// Ollama writes Docker v2 (schemaVersion 2) manifests. Digest syntax is left to
/// `Digest::parse` so unknown algorithms stay distinguishable from bad shapes.
fn get_manifest_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["layers"],
        "properties": {
            "schemaVersion": {
                "type": "integer",
                "minimum": 1
            },
            "mediaType": {
                "type": "string"
            },
            "config": {
                "$ref": "#/$defs/descriptor"
            },
            "layers": {
                "type": "array",
                "items": {
                    "$ref": "#/$defs/descriptor"
                }
            }
        },
        "$defs": {
            "descriptor": {
                "type": "object",
                "required": ["digest", "size"],
                "properties": {
                    "mediaType": {
                        "type": "string"
                    },
                    "digest": {
                        "type": "string",
                        "minLength": 1
                    },
                    "size": {
                        "type": "integer",
                        "minimum": 0
                    },
                    "from": {
                        "type": "string"
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> Value {
        json!({
            "mediaType": "application/vnd.ollama.image.model",
            "digest": "sha256:0000000000000000000000000000000000000000000000000000000000000000",
            "size": 42
        })
    }

    #[test]
    fn test_valid_document() {
        let doc = json!({
            "schemaVersion": 2,
            "config": descriptor(),
            "layers": [descriptor()]
        });
        assert!(validate_manifest_shape(&doc).is_ok());
    }

    #[test]
    fn test_missing_layers() {
        let doc = json!({ "schemaVersion": 2 });
        let err = validate_manifest_shape(&doc).unwrap_err();
        assert!(err.to_string().contains("layers"));
    }

    #[test]
    fn test_missing_size_names_pointer() {
        let doc = json!({
            "layers": [{ "digest": "sha256:abc" }]
        });
        let err = validate_manifest_shape(&doc).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("/layers/0"), "{}", msg);
        assert!(msg.contains("size"), "{}", msg);
    }

    #[test]
    fn test_negative_size_rejected() {
        let doc = json!({
            "layers": [{ "digest": "sha256:abc", "size": -1 }]
        });
        assert!(validate_manifest_shape(&doc).is_err());
    }

    #[test]
    fn test_not_an_object() {
        assert!(validate_manifest_shape(&json!([1, 2, 3])).is_err());
    }
}
