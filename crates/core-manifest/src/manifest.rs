//! Model manifests
//!
//! A manifest lists the content-addressed blobs (config plus layers) that make
//! up one tagged model. Parsing is a pure transform from bytes to a typed
//! [`Manifest`]; nothing here touches the filesystem.

use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::media_type::MediaType;
use crate::model_ref::ModelRef;
use crate::validate::validate_manifest_shape;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One blob reference inside a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,

    pub digest: Digest,

    /// Declared size in bytes
    pub size: u64,

    /// Source path recorded by `ollama create`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl Layer {
    /// Short role label (`model`, `template`, ...), `layer` when untagged
    pub fn label(&self) -> &str {
        self.media_type.as_ref().map(|m| m.label()).unwrap_or("layer")
    }
}

/// A parsed, immutable manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub model: ModelRef,
    pub schema_version: Option<u32>,
    pub media_type: Option<String>,
    pub config: Option<Layer>,
    pub layers: Vec<Layer>,
}

/// A layer dropped by lenient parsing because its algorithm is unknown
#[derive(Debug)]
pub struct SkippedLayer {
    pub digest: String,
    pub error: Error,
}

/// Result of [`Manifest::parse_lenient`]
#[derive(Debug)]
pub struct LenientManifest {
    pub manifest: Manifest,
    pub skipped: Vec<SkippedLayer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDescriptor {
    #[serde(default)]
    media_type: Option<String>,
    digest: String,
    size: u64,
    #[serde(default)]
    from: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    #[serde(default)]
    schema_version: Option<u32>,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    config: Option<RawDescriptor>,
    layers: Vec<RawDescriptor>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestDocument<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    schema_version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<&'a Layer>,
    layers: &'a [Layer],
}

impl RawDescriptor {
    fn into_layer(self) -> Result<Layer> {
        Ok(Layer {
            media_type: self.media_type.as_deref().map(MediaType::from),
            digest: Digest::parse(&self.digest)?,
            size: self.size,
            from: self.from,
        })
    }
}

fn parse_raw(bytes: &[u8]) -> Result<RawManifest> {
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|e| Error::malformed(format!("invalid JSON: {}", e)))?;
    validate_manifest_shape(&document)?;
    serde_json::from_value(document).map_err(|e| Error::malformed(e.to_string()))
}

impl Manifest {
    /// Parse manifest bytes, failing on the first bad descriptor
    pub fn parse(model: ModelRef, bytes: &[u8]) -> Result<Self> {
        let raw = parse_raw(bytes)?;
        let config = raw.config.map(RawDescriptor::into_layer).transpose()?;
        let layers = raw
            .layers
            .into_iter()
            .map(RawDescriptor::into_layer)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            model,
            schema_version: raw.schema_version,
            media_type: raw.media_type,
            config,
            layers,
        })
    }

    /// Parse manifest bytes, dropping descriptors with unsupported algorithms
    ///
    /// Shape errors still fail the whole manifest. If every descriptor was
    /// dropped the manifest fails with `UnsupportedAlgorithm`.
    pub fn parse_lenient(model: ModelRef, bytes: &[u8]) -> Result<LenientManifest> {
        let raw = parse_raw(bytes)?;
        let mut skipped = Vec::new();

        let mut accept = |descriptor: RawDescriptor| -> Result<Option<Layer>> {
            let digest = descriptor.digest.clone();
            match descriptor.into_layer() {
                Ok(layer) => Ok(Some(layer)),
                Err(error) if error.is_unsupported_algorithm() => {
                    skipped.push(SkippedLayer { digest, error });
                    Ok(None)
                }
                Err(error) => Err(error),
            }
        };

        let config = match raw.config {
            Some(descriptor) => accept(descriptor)?,
            None => None,
        };
        let mut layers = Vec::with_capacity(raw.layers.len());
        for descriptor in raw.layers {
            if let Some(layer) = accept(descriptor)? {
                layers.push(layer);
            }
        }

        if config.is_none() && layers.is_empty() && !skipped.is_empty() {
            return Err(skipped.remove(0).error);
        }

        Ok(LenientManifest {
            manifest: Self {
                model,
                schema_version: raw.schema_version,
                media_type: raw.media_type,
                config,
                layers,
            },
            skipped,
        })
    }

    /// Config first, then layers in manifest order
    pub fn referenced_layers(&self) -> impl Iterator<Item = &Layer> {
        self.config.iter().chain(self.layers.iter())
    }

    /// Sum of declared sizes of every referenced blob
    pub fn total_size(&self) -> u64 {
        self.referenced_layers().map(|l| l.size).sum()
    }

    /// Layer list in manifest form
    pub fn layers_to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.layers)?)
    }

    /// Serialize back to the on-disk manifest shape
    pub fn to_json(&self) -> Result<String> {
        let document = ManifestDocument {
            schema_version: self.schema_version,
            media_type: self.media_type.as_deref(),
            config: self.config.as_ref(),
            layers: &self.layers,
        };
        Ok(serde_json::to_string(&document)?)
    }
}
