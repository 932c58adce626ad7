/*!
 * Digest to on-disk blob path mapping
 *
 * Blobs live flat under `<root>/blobs/` named `<algorithm>-<hex>`. The
 * mapping is pure: the same root and digest always give the same path and
 * two distinct digests never share one.
 */

use modelvault_core_manifest::{Digest, Result as ManifestResult};
use std::path::{Path, PathBuf};

/// Blob directory name under the store root
pub const BLOBS_DIR: &str = "blobs";

/// `<root>/blobs`
pub fn blobs_dir(root: &Path) -> PathBuf {
    root.join(BLOBS_DIR)
}

/// Path a blob with this digest is stored at
pub fn blob_path(root: &Path, digest: &Digest) -> PathBuf {
    blobs_dir(root).join(digest.blob_name())
}

/// Resolve a digest string as written in a manifest (`sha256:<hex>`)
///
/// Fails with `UnsupportedAlgorithm` for algorithms other than sha256 and
/// `MalformedManifest` for anything that is not a digest at all.
pub fn resolve_blob_path(root: &Path, digest: &str) -> ManifestResult<PathBuf> {
    let digest = Digest::parse(digest)?;
    Ok(blob_path(root, &digest))
}

/// Digest of a blob file name (`sha256-<hex>`)
///
/// Returns None for names that are not blob names (partial downloads,
/// `.DS_Store`, ...).
pub fn blob_name_to_digest(file_name: &str) -> Option<Digest> {
    Digest::from_blob_name(file_name)
}
