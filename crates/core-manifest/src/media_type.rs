//! Layer media types
//!
//! Ollama tags each layer with a media type describing its role. Unknown
//! strings are kept verbatim so manifests re-serialize unchanged.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Media type of the manifest document itself
pub const MANIFEST_MEDIA_TYPE: &str = "application/vnd.docker.distribution.manifest.v2+json";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// Image config (`application/vnd.docker.container.image.v1+json`)
    Config,
    /// Model weights (GGUF)
    Model,
    Template,
    System,
    Params,
    License,
    Adapter,
    Projector,
    Messages,
    /// Any media type we do not interpret
    Other(String),
}

impl MediaType {
    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            MediaType::Config => "application/vnd.docker.container.image.v1+json",
            MediaType::Model => "application/vnd.ollama.image.model",
            MediaType::Template => "application/vnd.ollama.image.template",
            MediaType::System => "application/vnd.ollama.image.system",
            MediaType::Params => "application/vnd.ollama.image.params",
            MediaType::License => "application/vnd.ollama.image.license",
            MediaType::Adapter => "application/vnd.ollama.image.adapter",
            MediaType::Projector => "application/vnd.ollama.image.projector",
            MediaType::Messages => "application/vnd.ollama.image.messages",
            MediaType::Other(s) => s,
        }
    }

    /// Short label for display (`model`, `template`, ...)
    pub fn label(&self) -> &str {
        match self {
            MediaType::Config => "config",
            MediaType::Model => "model",
            MediaType::Template => "template",
            MediaType::System => "system",
            MediaType::Params => "params",
            MediaType::License => "license",
            MediaType::Adapter => "adapter",
            MediaType::Projector => "projector",
            MediaType::Messages => "messages",
            MediaType::Other(s) => s.rsplit('.').next().unwrap_or(s),
        }
    }
}

impl From<&str> for MediaType {
    fn from(s: &str) -> Self {
        match s {
            "application/vnd.docker.container.image.v1+json" => MediaType::Config,
            "application/vnd.ollama.image.model" => MediaType::Model,
            "application/vnd.ollama.image.template" => MediaType::Template,
            "application/vnd.ollama.image.system" => MediaType::System,
            "application/vnd.ollama.image.params" => MediaType::Params,
            "application/vnd.ollama.image.license" => MediaType::License,
            "application/vnd.ollama.image.adapter" => MediaType::Adapter,
            "application/vnd.ollama.image.projector" => MediaType::Projector,
            "application/vnd.ollama.image.messages" => MediaType::Messages,
            other => MediaType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MediaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(MediaType::from(s.as_str()))
    }
}
