//! Error types for manifest operations

use thiserror::Error;

/// Result type for manifest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing manifests, digests and model references
#[derive(Error, Debug)]
pub enum Error {
    /// Manifest bytes do not have the expected shape
    #[error("Malformed manifest: {reason}")]
    MalformedManifest { reason: String },

    /// Digest algorithm is well-formed but not one we can map to a blob path
    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Model reference could not be parsed
    #[error("Invalid model reference: {0}")]
    InvalidModelRef(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a malformed manifest error with a reason
    pub fn malformed<S: Into<String>>(reason: S) -> Self {
        Error::MalformedManifest {
            reason: reason.into(),
        }
    }

    /// Create an unsupported algorithm error
    pub fn unsupported_algorithm<S: Into<String>>(algorithm: S) -> Self {
        Error::UnsupportedAlgorithm(algorithm.into())
    }

    /// Create an invalid model reference error
    pub fn invalid_model_ref<S: Into<String>>(input: S) -> Self {
        Error::InvalidModelRef(input.into())
    }

    /// Whether this error came from the digest algorithm rather than the manifest shape
    pub fn is_unsupported_algorithm(&self) -> bool {
        matches!(self, Error::UnsupportedAlgorithm(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_error() {
        let err = Error::malformed("missing digest");
        assert!(matches!(err, Error::MalformedManifest { .. }));
        assert_eq!(err.to_string(), "Malformed manifest: missing digest");
    }

    #[test]
    fn test_unsupported_algorithm_error() {
        let err = Error::unsupported_algorithm("md5");
        assert!(err.is_unsupported_algorithm());
        assert!(err.to_string().contains("md5"));
    }

    #[test]
    fn test_json_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
        assert!(!err.is_unsupported_algorithm());
    }
}
