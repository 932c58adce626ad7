//! Model references (`host/namespace/name:tag`)

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_HOST: &str = "registry.ollama.ai";
pub const DEFAULT_NAMESPACE: &str = "library";
pub const DEFAULT_TAG: &str = "latest";

/// Directory under the store root holding manifest files
pub const MANIFESTS_DIR: &str = "manifests";

/// Fully qualified model name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelRef {
    pub host: String,
    pub namespace: String,
    pub name: String,
    pub tag: String,
}

fn valid_part(part: &str) -> bool {
    !part.is_empty()
        && part != "."
        && part != ".."
        && !part.contains(['/', '\\'])
        && !part.chars().any(char::is_whitespace)
}

impl ModelRef {
    pub fn new<S: Into<String>>(host: S, namespace: S, name: S, tag: S) -> Result<Self> {
        let model = Self {
            host: host.into(),
            namespace: namespace.into(),
            name: name.into(),
            tag: tag.into(),
        };
        for part in [&model.host, &model.namespace, &model.name, &model.tag] {
            if !valid_part(part) {
                return Err(Error::invalid_model_ref(model.full_name()));
            }
        }
        Ok(model)
    }

    /// Library model with an explicit tag (`llama3:8b`)
    pub fn library<S: Into<String>>(name: S, tag: S) -> Result<Self> {
        Self::new(
            DEFAULT_HOST.to_string(),
            DEFAULT_NAMESPACE.to_string(),
            name.into(),
            tag.into(),
        )
    }

    /// Parse user input: `name`, `name:tag`, `ns/name:tag` or `host/ns/name:tag`
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let last_slash = input.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (path, tag) = match input[last_slash..].rfind(':') {
            Some(i) => (&input[..last_slash + i], &input[last_slash + i + 1..]),
            None => (input, DEFAULT_TAG),
        };

        let parts: Vec<&str> = path.split('/').collect();
        match parts.as_slice() {
            [name] => Self::library(*name, tag),
            [namespace, name] => Self::new(DEFAULT_HOST, *namespace, *name, tag),
            [host, namespace, name] => Self::new(*host, *namespace, *name, tag),
            _ => Err(Error::invalid_model_ref(input)),
        }
    }

    /// Derive the model from a manifest path relative to the manifests directory
    pub fn from_manifest_path(relative: &Path) -> Result<Self> {
        let parts: Vec<&str> = relative
            .components()
            .map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::invalid_model_ref(relative.display().to_string()))?;

        match parts.as_slice() {
            [host, namespace, name, tag] => Self::new(*host, *namespace, *name, *tag),
            _ => Err(Error::invalid_model_ref(relative.display().to_string())),
        }
    }

    /// Location of this model's manifest under a store root
    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        root.join(MANIFESTS_DIR)
            .join(&self.host)
            .join(&self.namespace)
            .join(&self.name)
            .join(&self.tag)
    }

    /// `host/namespace/name:tag`
    pub fn full_name(&self) -> String {
        format!("{}/{}/{}:{}", self.host, self.namespace, self.name, self.tag)
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host != DEFAULT_HOST {
            write!(f, "{}/{}/{}:{}", self.host, self.namespace, self.name, self.tag)
        } else if self.namespace != DEFAULT_NAMESPACE {
            write!(f, "{}/{}:{}", self.namespace, self.name, self.tag)
        } else {
            write!(f, "{}:{}", self.name, self.tag)
        }
    }
}

impl FromStr for ModelRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ModelRef::parse(s)
    }
}

impl Serialize for ModelRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ModelRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ModelRef::parse(&s).map_err(serde::de::Error::custom)
    }
}
