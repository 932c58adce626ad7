/*!
 * Reconciliation report
 *
 * Everything here is derived per pass and never persisted. The GUI (or the
 * CLI) renders it and drives copy/delete decisions from it.
 */

use chrono::{DateTime, Utc};
use modelvault_core_manifest::{Digest, MediaType, ModelRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Observed state of one blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlobStatus {
    /// File exists with the declared size
    Present,
    /// File exists with a different size
    SizeMismatch,
    /// No file at the resolved path
    Missing,
    /// File on disk that no loaded manifest references
    Orphaned,
    /// Stat failed for a reason other than not-found; see the record's warning
    Undetermined,
    /// Right size, wrong content (only with digest verification)
    DigestMismatch,
}

impl BlobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobStatus::Present => "present",
            BlobStatus::SizeMismatch => "size-mismatch",
            BlobStatus::Missing => "missing",
            BlobStatus::Orphaned => "orphaned",
            BlobStatus::Undetermined => "undetermined",
            BlobStatus::DigestMismatch => "digest-mismatch",
        }
    }

    /// Statuses that mean a referenced model cannot be trusted to load
    pub fn is_problem(&self) -> bool {
        matches!(
            self,
            BlobStatus::SizeMismatch
                | BlobStatus::Missing
                | BlobStatus::Undetermined
                | BlobStatus::DigestMismatch
        )
    }
}

impl fmt::Display for BlobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived state of one distinct digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
    pub digest: Digest,
    pub path: PathBuf,
    pub status: BlobStatus,
    /// Declared size from the first referencing manifest (None for orphans)
    pub expected_size: Option<u64>,
    /// Size on disk when the file could be stat'ed
    pub actual_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub referenced_by: Vec<ModelRef>,
    /// Why the status could not be fully determined, or other per-blob notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl BlobRecord {
    pub(crate) fn add_warning(&mut self, message: String) {
        self.warning = Some(match self.warning.take() {
            Some(existing) => format!("{}; {}", existing, message),
            None => message,
        });
    }
}

/// A file in the blob directory that no loaded manifest resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanedFile {
    pub path: PathBuf,
    pub size: u64,
    /// Set when the file name is a valid blob name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
    /// Set when the entry could not be stat'ed, e.g. a dangling link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// Manifest failed shape validation or is not JSON
    Malformed,
    /// Descriptor (or the whole manifest) uses an unknown digest algorithm
    UnsupportedAlgorithm,
    /// Manifest file could not be read
    Unreadable,
    /// File under `manifests/` is not at `host/namespace/model/tag`
    UnexpectedLocation,
}

/// Per-manifest problem recorded instead of aborting the pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestWarning {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelRef>,
    pub kind: WarningKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelStatus {
    /// Every referenced blob is present
    Complete,
    /// At least one blob is missing or damaged
    Incomplete,
    /// Nothing confirmed damaged, but some blob could not be checked
    Unverified,
}

/// One layer of a model as shown in a model's detail view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelLayer {
    pub digest: Digest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    pub size: u64,
    pub status: BlobStatus,
}

/// Summary of one loaded manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model: ModelRef,
    pub manifest_path: PathBuf,
    pub status: ModelStatus,
    /// Sum of declared sizes of all referenced blobs
    pub total_size: u64,
    /// Declared bytes of blobs that are not present
    pub missing_bytes: u64,
    pub layers: Vec<ModelLayer>,
}

/// Aggregate counts for summaries and exit codes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCounts {
    pub models: usize,
    pub present: usize,
    pub size_mismatch: usize,
    pub missing: usize,
    pub orphaned: usize,
    pub undetermined: usize,
    pub digest_mismatch: usize,
    pub warnings: usize,
}

/// Result of one reconciliation pass over a store root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub store_root: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub verified_digests: bool,
    pub models: Vec<ModelSummary>,
    /// One record per distinct digest, referenced or orphaned
    pub blobs: BTreeMap<Digest, BlobRecord>,
    /// Every unreferenced file in the blob directory
    pub orphaned: Vec<OrphanedFile>,
    pub warnings: Vec<ManifestWarning>,
}

impl ReconcileReport {
    pub fn counts(&self) -> ReportCounts {
        let mut counts = ReportCounts {
            models: self.models.len(),
            orphaned: self.orphaned.len(),
            warnings: self.warnings.len(),
            ..Default::default()
        };
        for record in self.blobs.values() {
            match record.status {
                BlobStatus::Present => counts.present += 1,
                BlobStatus::SizeMismatch => counts.size_mismatch += 1,
                BlobStatus::Missing => counts.missing += 1,
                BlobStatus::Undetermined => counts.undetermined += 1,
                BlobStatus::DigestMismatch => counts.digest_mismatch += 1,
                // Counted from the orphan list, which also holds non-blob files
                BlobStatus::Orphaned => {}
            }
        }
        counts
    }

    /// Any referenced blob missing, damaged or unverifiable
    pub fn has_integrity_problems(&self) -> bool {
        self.blobs.values().any(|r| r.status.is_problem())
    }

    /// Skipped manifests or blob directory entries that could not be stat'ed
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty() || self.orphaned.iter().any(|o| o.warning.is_some())
    }

    /// No problems and nothing orphaned
    pub fn is_clean(&self) -> bool {
        !self.has_integrity_problems() && self.orphaned.is_empty()
    }

    pub fn record(&self, digest: &Digest) -> Option<&BlobRecord> {
        self.blobs.get(digest)
    }

    pub fn records_with(&self, status: BlobStatus) -> impl Iterator<Item = &BlobRecord> {
        self.blobs.values().filter(move |r| r.status == status)
    }

    pub fn model(&self, model: &ModelRef) -> Option<&ModelSummary> {
        self.models.iter().find(|m| &m.model == model)
    }

    /// Bytes freed by deleting every orphaned file
    pub fn reclaimable_bytes(&self) -> u64 {
        self.orphaned.iter().map(|o| o.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(c: char) -> Digest {
        Digest::sha256(std::iter::repeat(c).take(64).collect::<String>()).unwrap()
    }

    fn record(c: char, status: BlobStatus) -> BlobRecord {
        BlobRecord {
            digest: digest(c),
            path: PathBuf::from(format!("/s/blobs/{}", digest(c).blob_name())),
            status,
            expected_size: Some(10),
            actual_size: Some(10),
            media_type: None,
            referenced_by: Vec::new(),
            warning: None,
        }
    }

    fn report(records: Vec<BlobRecord>, orphaned: Vec<OrphanedFile>) -> ReconcileReport {
        ReconcileReport {
            store_root: PathBuf::from("/s"),
            generated_at: Utc::now(),
            verified_digests: false,
            models: Vec::new(),
            blobs: records.into_iter().map(|r| (r.digest.clone(), r)).collect(),
            orphaned,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&BlobStatus::SizeMismatch).unwrap();
        assert_eq!(json, "\"size-mismatch\"");
        assert_eq!(BlobStatus::DigestMismatch.to_string(), "digest-mismatch");
    }

    #[test]
    fn test_problem_statuses() {
        assert!(!BlobStatus::Present.is_problem());
        assert!(!BlobStatus::Orphaned.is_problem());
        assert!(BlobStatus::Missing.is_problem());
        assert!(BlobStatus::Undetermined.is_problem());
    }

    #[test]
    fn test_counts_and_cleanliness() {
        let clean = report(vec![record('a', BlobStatus::Present)], Vec::new());
        assert!(clean.is_clean());
        assert_eq!(clean.counts().present, 1);

        let orphan = OrphanedFile {
            path: PathBuf::from("/s/blobs/junk"),
            size: 7,
            digest: None,
            warning: None,
        };
        let dirty = report(
            vec![
                record('a', BlobStatus::Present),
                record('b', BlobStatus::Missing),
            ],
            vec![orphan],
        );
        let counts = dirty.counts();
        assert_eq!(counts.missing, 1);
        assert_eq!(counts.orphaned, 1);
        assert!(dirty.has_integrity_problems());
        assert!(!dirty.is_clean());
        assert_eq!(dirty.reclaimable_bytes(), 7);
        assert_eq!(dirty.records_with(BlobStatus::Missing).count(), 1);
        assert!(!dirty.is_partial());
    }

    #[test]
    fn test_unresolved_orphan_makes_report_partial() {
        let orphan = OrphanedFile {
            path: PathBuf::from("/s/blobs/sha256-dead"),
            size: 0,
            digest: None,
            warning: Some("link target not found".to_string()),
        };
        let r = report(Vec::new(), vec![orphan]);
        assert!(r.warnings.is_empty());
        assert!(r.is_partial());
    }

    #[test]
    fn test_add_warning_appends() {
        let mut r = record('a', BlobStatus::Present);
        r.add_warning("first".to_string());
        r.add_warning("second".to_string());
        assert_eq!(r.warning.as_deref(), Some("first; second"));
    }

    #[test]
    fn test_report_json_keys_are_digests() {
        let r = report(vec![record('c', BlobStatus::Present)], Vec::new());
        let value = serde_json::to_value(&r).unwrap();
        let key = format!("sha256:{}", "c".repeat(64));
        assert_eq!(value["blobs"][&key]["status"], "present");

        let back: ReconcileReport = serde_json::from_value(value).unwrap();
        assert_eq!(back.blobs.len(), 1);
    }
}
