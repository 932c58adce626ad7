//! Ollama manifest data structures for modelvault
//!
//! This crate parses the manifests Ollama keeps under
//! `<store>/manifests/<host>/<namespace>/<model>/<tag>` into typed values.
//! It is pure: bytes in, [`Manifest`] out.
//!
//! # Key Concepts
//!
//! - **Manifest**: config descriptor plus ordered layers for one tagged model
//! - **Layer**: digest, declared size and media type of one blob
//! - **Digest**: `sha256:<hex>`, the content address of a blob
//! - **ModelRef**: `host/namespace/name:tag`, derived from the manifest location
//!
//! # Example
//!
//! ```no_run
//! use modelvault_core_manifest::{Manifest, ModelRef};
//!
//! let model = ModelRef::parse("llama3:8b").unwrap();
//! let bytes = std::fs::read("/home/me/.ollama/models/manifests/registry.ollama.ai/library/llama3/8b").unwrap();
//! let manifest = Manifest::parse(model, &bytes).unwrap();
//! for layer in manifest.referenced_layers() {
//!     println!("{} {} bytes", layer.digest, layer.size);
//! }
//! ```

pub mod digest;
pub mod error;
pub mod manifest;
pub mod media_type;
pub mod model_ref;
pub mod validate;

// Re-export main types for convenience
pub use digest::{Digest, DigestAlgorithm};
pub use error::{Error, Result};
pub use manifest::{Layer, LenientManifest, Manifest, SkippedLayer};
pub use media_type::{MediaType, MANIFEST_MEDIA_TYPE};
pub use model_ref::{ModelRef, DEFAULT_HOST, DEFAULT_NAMESPACE, DEFAULT_TAG, MANIFESTS_DIR};
pub use validate::validate_manifest_shape;
