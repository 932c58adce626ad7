/*!
 * modelvault - Ollama model store reconciliation
 *
 * Reads the manifests of an Ollama models directory (local or on a mounted
 * share) and checks them against the content-addressed blob store:
 * - which blobs are present with the declared size
 * - which are missing, truncated or (optionally) corrupt
 * - which files in `blobs/` no manifest references any more
 *
 * The library never modifies the store.
 */

pub mod cli_style;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod output;
pub mod system;

// Re-export commonly used types
pub use config::{LogLevel, VaultConfig};
pub use crate::core::{
    reconcile, resolve_blob_path, BlobRecord, BlobStatus, ReconcileOptions, ReconcileReport,
    ReconcileWorker,
};
pub use error::{Result, VaultError};
pub use modelvault_core_manifest::{Digest, Layer, Manifest, MediaType, ModelRef};
pub use system::LocalSystem;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
