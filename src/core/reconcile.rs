/*!
 * Reconciliation pass
 *
 * Classifies every blob referenced by a loaded manifest against what is on
 * disk, then lists whatever else sits in the blob directory as orphaned.
 * The pass is read-only and holds no state between calls.
 */

use chrono::Utc;
use modelvault_core_interface::{StoreSystem, StoreSystemError};
use modelvault_core_manifest::{Digest, Layer, ModelRef};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, warn};

use super::report::{
    BlobRecord, BlobStatus, ModelLayer, ModelStatus, ModelSummary, OrphanedFile, ReconcileReport,
};
use super::resolver::{blob_name_to_digest, blob_path, blobs_dir};
use super::scan::{load_model, scan_manifests, LoadedManifest};
use super::verify::{verify_blob, Verification};
use crate::config::VaultConfig;
use crate::error::{Result, VaultError};

/// Knobs for one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Hash every size-matching blob and compare against its digest
    pub verify_digests: bool,
}

impl From<&VaultConfig> for ReconcileOptions {
    fn from(config: &VaultConfig) -> Self {
        Self {
            verify_digests: config.verify_digests,
        }
    }
}

/// Run one reconciliation pass over the store at `root`
///
/// Fails only when the store itself cannot be read; problems with single
/// manifests or blobs end up in the report.
pub fn reconcile<S: StoreSystem + ?Sized>(
    system: &S,
    root: &Path,
    options: &ReconcileOptions,
) -> Result<ReconcileReport> {
    let span = info_span!("reconcile", root = %root.display(), verify = options.verify_digests);
    let _guard = span.enter();

    check_store_root(system, root)?;

    let scan = scan_manifests(system, root)?;
    let mut blobs = BTreeMap::new();
    let mut resolved = HashSet::new();

    for loaded in &scan.manifests {
        for layer in loaded.manifest.referenced_layers() {
            record_reference(system, root, options, loaded, layer, &mut blobs, &mut resolved);
        }
    }

    let orphaned = collect_orphans(system, root, &resolved, &mut blobs)?;
    let models = scan
        .manifests
        .iter()
        .map(|loaded| summarize(loaded, &blobs))
        .collect();

    let report = ReconcileReport {
        store_root: root.to_path_buf(),
        generated_at: Utc::now(),
        verified_digests: options.verify_digests,
        models,
        blobs,
        orphaned,
        warnings: scan.warnings,
    };

    let counts = report.counts();
    info!(
        models = counts.models,
        present = counts.present,
        missing = counts.missing,
        size_mismatch = counts.size_mismatch,
        orphaned = counts.orphaned,
        undetermined = counts.undetermined,
        warnings = counts.warnings,
        "Reconciliation complete"
    );

    Ok(report)
}

fn check_store_root<S: StoreSystem + ?Sized>(system: &S, root: &Path) -> Result<()> {
    let meta = system
        .metadata(root)
        .map_err(|e| VaultError::store_unavailable(root, &e))?;
    if !meta.is_dir {
        return Err(VaultError::store_unavailable(
            root,
            &StoreSystemError::NotADirectory(root.to_path_buf()),
        ));
    }
    Ok(())
}

fn record_reference<S: StoreSystem + ?Sized>(
    system: &S,
    root: &Path,
    options: &ReconcileOptions,
    loaded: &LoadedManifest,
    layer: &Layer,
    blobs: &mut BTreeMap<Digest, BlobRecord>,
    resolved: &mut HashSet<PathBuf>,
) {
    let model = &loaded.manifest.model;
    match blobs.entry(layer.digest.clone()) {
        Entry::Occupied(mut entry) => {
            let record = entry.get_mut();
            if !record.referenced_by.contains(model) {
                record.referenced_by.push(model.clone());
            }
            if record.expected_size != Some(layer.size) {
                record.add_warning(format!(
                    "{} declares {} bytes, first reference declared {}",
                    model,
                    layer.size,
                    record.expected_size.unwrap_or_default()
                ));
            }
        }
        Entry::Vacant(entry) => {
            let path = blob_path(root, &layer.digest);
            resolved.insert(path.clone());
            let mut record = BlobRecord {
                digest: layer.digest.clone(),
                path,
                status: BlobStatus::Missing,
                expected_size: Some(layer.size),
                actual_size: None,
                media_type: layer.media_type.clone(),
                referenced_by: vec![model.clone()],
                warning: None,
            };
            classify(system, options, &mut record);
            debug!("{} {} ({})", record.status, record.digest.short(), model);
            entry.insert(record);
        }
    }
}

/// Set status, observed size and warning for a referenced blob
fn classify<S: StoreSystem + ?Sized>(
    system: &S,
    options: &ReconcileOptions,
    record: &mut BlobRecord,
) {
    let meta = match system.metadata(&record.path) {
        Ok(meta) => meta,
        Err(e) if e.is_not_found() => {
            record.status = BlobStatus::Missing;
            return;
        }
        Err(e) => {
            record.status = BlobStatus::Undetermined;
            record.add_warning(e.to_string());
            return;
        }
    };

    if meta.is_dir {
        record.status = BlobStatus::Undetermined;
        record.add_warning("blob path is a directory".to_string());
        return;
    }

    record.actual_size = Some(meta.len);
    if record.expected_size != Some(meta.len) {
        record.status = BlobStatus::SizeMismatch;
        return;
    }

    record.status = BlobStatus::Present;
    if options.verify_digests {
        match verify_blob(system, &record.path, &record.digest) {
            Ok(Verification::Match) => {}
            Ok(Verification::Mismatch(actual)) => {
                record.status = BlobStatus::DigestMismatch;
                record.add_warning(format!("contents hash to sha256:{}", actual));
            }
            Err(e) => {
                record.status = BlobStatus::Undetermined;
                record.add_warning(format!("could not hash: {}", e));
            }
        }
    }
}

fn collect_orphans<S: StoreSystem + ?Sized>(
    system: &S,
    root: &Path,
    resolved: &HashSet<PathBuf>,
    blobs: &mut BTreeMap<Digest, BlobRecord>,
) -> Result<Vec<OrphanedFile>> {
    let dir = blobs_dir(root);
    let entries = match system.read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.is_not_found() => {
            debug!("No blobs directory at {}", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(VaultError::store_unavailable(&dir, &e)),
    };

    let mut orphaned = Vec::new();
    for entry in entries {
        if entry.is_dir {
            debug!("Ignoring directory {} in blob store", entry.path.display());
            continue;
        }
        let digest = entry.file_name().and_then(blob_name_to_digest);
        let warning = entry
            .link_error
            .as_ref()
            .map(|reason| format!("blob link target unreachable: {}", reason));

        if resolved.contains(&entry.path) {
            // A referenced blob behind a dangling link was classified missing
            if let (Some(warning), Some(digest)) = (warning, digest.as_ref()) {
                if let Some(record) = blobs.get_mut(digest) {
                    if record.status == BlobStatus::Missing {
                        record.status = BlobStatus::Undetermined;
                        record.add_warning(warning);
                    }
                }
            }
            continue;
        }

        if let Some(ref reason) = warning {
            warn!("{}: {}", entry.path.display(), reason);
        }
        if let Some(ref digest) = digest {
            blobs.entry(digest.clone()).or_insert_with(|| BlobRecord {
                digest: digest.clone(),
                path: entry.path.clone(),
                status: BlobStatus::Orphaned,
                expected_size: None,
                actual_size: warning.is_none().then_some(entry.len),
                media_type: None,
                referenced_by: Vec::new(),
                warning: warning.clone(),
            });
        }
        debug!("orphaned {}", entry.path.display());
        orphaned.push(OrphanedFile {
            path: entry.path,
            size: entry.len,
            digest,
            warning,
        });
    }

    orphaned.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(orphaned)
}

fn summarize(loaded: &LoadedManifest, blobs: &BTreeMap<Digest, BlobRecord>) -> ModelSummary {
    let manifest = &loaded.manifest;
    let mut status = ModelStatus::Complete;
    let mut missing_bytes = 0;
    let mut layers = Vec::new();

    for layer in manifest.referenced_layers() {
        let blob_status = blobs
            .get(&layer.digest)
            .map(|record| layer_status(record, layer.size))
            .unwrap_or(BlobStatus::Missing);
        match blob_status {
            BlobStatus::Present | BlobStatus::Orphaned => {}
            BlobStatus::Undetermined => {
                missing_bytes += layer.size;
                if status == ModelStatus::Complete {
                    status = ModelStatus::Unverified;
                }
            }
            BlobStatus::Missing | BlobStatus::SizeMismatch | BlobStatus::DigestMismatch => {
                missing_bytes += layer.size;
                status = ModelStatus::Incomplete;
            }
        }
        layers.push(ModelLayer {
            digest: layer.digest.clone(),
            media_type: layer.media_type.clone(),
            size: layer.size,
            status: blob_status,
        });
    }

    ModelSummary {
        model: manifest.model.clone(),
        manifest_path: loaded.path.clone(),
        status,
        total_size: manifest.total_size(),
        missing_bytes,
        layers,
    }
}

/// Status of one layer given the record shared by every reference
///
/// The record is classified against the first declared size, so a later
/// layer declaring a different size does not match the file on disk.
fn layer_status(record: &BlobRecord, declared: u64) -> BlobStatus {
    match (record.status, record.actual_size) {
        (BlobStatus::Present, Some(actual)) if actual != declared => BlobStatus::SizeMismatch,
        (status, _) => status,
    }
}

/// Reconcile and pick out one model's summary
///
/// The model's manifest is parsed strictly first: an unknown model or an
/// unparsable manifest fails here instead of being skipped with a warning.
pub fn reconcile_model<S: StoreSystem + ?Sized>(
    system: &S,
    root: &Path,
    model: &ModelRef,
    options: &ReconcileOptions,
) -> Result<(ReconcileReport, ModelSummary)> {
    check_store_root(system, root)?;
    let manifest = load_model(system, root, model)?;
    debug!(
        "{} declares {} layers",
        manifest.model,
        manifest.referenced_layers().count()
    );

    let report = reconcile(system, root, options)?;
    let summary = report
        .model(model)
        .cloned()
        .ok_or_else(|| VaultError::ModelNotFound(model.to_string()))?;
    Ok((report, summary))
}
