/*!
 * Core reconciliation: path resolution, manifest discovery, the pass itself
 * and the background worker that runs it off the UI thread.
 */

pub mod reconcile;
pub mod report;
pub mod resolver;
pub mod scan;
pub mod verify;
pub mod worker;

pub use reconcile::{reconcile, reconcile_model, ReconcileOptions};
pub use report::{
    BlobRecord, BlobStatus, ManifestWarning, ModelLayer, ModelStatus, ModelSummary, OrphanedFile,
    ReconcileReport, ReportCounts, WarningKind,
};
pub use resolver::{blob_name_to_digest, blob_path, blobs_dir, resolve_blob_path, BLOBS_DIR};
pub use scan::{load_model, scan_manifests, LoadedManifest, ManifestScan};
pub use worker::{ReconcileWorker, WorkerResult};
