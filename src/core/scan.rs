/*!
 * Manifest discovery
 *
 * Walks `<root>/manifests/<host>/<namespace>/<model>/<tag>` and parses every
 * file it finds. A bad manifest, a dangling link or an unreadable model
 * directory becomes a warning; only an unreadable manifests directory
 * aborts the pass.
 */

use modelvault_core_interface::{StoreSystem, StoreSystemError, StoreSystemExt};
use modelvault_core_manifest::{Error as ManifestError, Manifest, ModelRef, MANIFESTS_DIR};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::report::{ManifestWarning, WarningKind};
use crate::error::{Result, VaultError};

/// A manifest that parsed, with the file it came from
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub manifest: Manifest,
    pub path: PathBuf,
}

/// Everything discovered under `manifests/`
#[derive(Debug, Default)]
pub struct ManifestScan {
    pub manifests: Vec<LoadedManifest>,
    pub warnings: Vec<ManifestWarning>,
}

impl ManifestScan {
    fn warn(&mut self, path: &Path, model: Option<ModelRef>, kind: WarningKind, message: String) {
        warn!("Skipping manifest {}: {}", path.display(), message);
        self.warnings.push(ManifestWarning {
            path: path.to_path_buf(),
            model,
            kind,
            message,
        });
    }
}

fn warning_kind(err: &ManifestError) -> WarningKind {
    if err.is_unsupported_algorithm() {
        WarningKind::UnsupportedAlgorithm
    } else {
        WarningKind::Malformed
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Discover and parse every manifest under `root`
///
/// Only the absence of `manifests/` itself means an empty store. Anything
/// below it that cannot be read is reported as a warning.
pub fn scan_manifests<S: StoreSystem + ?Sized>(system: &S, root: &Path) -> Result<ManifestScan> {
    let manifests_dir = root.join(MANIFESTS_DIR);
    match system.metadata(&manifests_dir) {
        Ok(meta) if meta.is_dir => {}
        Ok(_) => {
            let err = StoreSystemError::NotADirectory(manifests_dir.clone());
            return Err(VaultError::store_unavailable(&manifests_dir, &err));
        }
        Err(e) if e.is_not_found() => {
            debug!("No manifests directory at {}", manifests_dir.display());
            return Ok(ManifestScan::default());
        }
        Err(e) => return Err(VaultError::store_unavailable(&manifests_dir, &e)),
    }

    let walk = system
        .walk_files(&manifests_dir)
        .map_err(|e| VaultError::store_unavailable(&manifests_dir, &e))?;

    let mut scan = ManifestScan::default();
    for failure in walk.failures {
        if is_hidden(&failure.path) {
            continue;
        }
        let model = failure
            .path
            .strip_prefix(&manifests_dir)
            .ok()
            .and_then(|relative| ModelRef::from_manifest_path(relative).ok());
        scan.warn(
            &failure.path,
            model,
            WarningKind::Unreadable,
            failure.error.to_string(),
        );
    }

    for file in walk.files {
        if is_hidden(&file.path) {
            debug!("Ignoring hidden file {}", file.path.display());
            continue;
        }

        let relative = file
            .path
            .strip_prefix(&manifests_dir)
            .unwrap_or(file.path.as_path());
        let model = match ModelRef::from_manifest_path(relative) {
            Ok(model) => model,
            Err(e) => {
                scan.warn(&file.path, None, WarningKind::UnexpectedLocation, e.to_string());
                continue;
            }
        };

        if let Some(loaded) = load_manifest(system, &file.path, model, &mut scan) {
            scan.manifests.push(loaded);
        }
    }

    scan.manifests.sort_by(|a, b| a.manifest.model.cmp(&b.manifest.model));
    scan.warnings.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(
        "Loaded {} manifests with {} warnings",
        scan.manifests.len(),
        scan.warnings.len()
    );
    Ok(scan)
}

fn load_manifest<S: StoreSystem + ?Sized>(
    system: &S,
    path: &Path,
    model: ModelRef,
    scan: &mut ManifestScan,
) -> Option<LoadedManifest> {
    let bytes = match system.read_all(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            scan.warn(path, Some(model), WarningKind::Unreadable, e.to_string());
            return None;
        }
    };

    match Manifest::parse_lenient(model.clone(), &bytes) {
        Ok(parsed) => {
            for skipped in parsed.skipped {
                scan.warn(
                    path,
                    Some(model.clone()),
                    WarningKind::UnsupportedAlgorithm,
                    format!("layer {} ignored: {}", skipped.digest, skipped.error),
                );
            }
            Some(LoadedManifest {
                manifest: parsed.manifest,
                path: path.to_path_buf(),
            })
        }
        Err(e) => {
            scan.warn(path, Some(model), warning_kind(&e), e.to_string());
            None
        }
    }
}

/// Read and parse the manifest of one model
pub fn load_model<S: StoreSystem + ?Sized>(
    system: &S,
    root: &Path,
    model: &ModelRef,
) -> Result<Manifest> {
    let path = model.manifest_path(root);
    let bytes = system.read_all(&path).map_err(|e| {
        if e.is_not_found() {
            VaultError::ModelNotFound(model.to_string())
        } else {
            VaultError::IoFailure {
                path: path.clone(),
                source: e,
            }
        }
    })?;
    Ok(Manifest::parse(model.clone(), &bytes)?)
}
