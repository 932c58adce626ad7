//! Output writer for CLI results in human-readable or JSON mode.

use serde::Serialize;

use crate::cli_style::{
    blob_table, format_size, model_layers_table, models_table, orphan_table, print_info,
    print_success, print_warning, section_header, stats_table, Theme,
};
use crate::core::{BlobStatus, ModelSummary, ReconcileReport};
use crate::error::VaultError;

/// Output mode for CLI results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Error shape printed to stderr in JSON mode
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub category: String,
    pub exit_code: i32,
}

impl From<&VaultError> for ErrorReport {
    fn from(err: &VaultError) -> Self {
        Self {
            error: sanitize_error(&err.to_string()),
            category: err.category().to_string(),
            exit_code: err.exit_code(),
        }
    }
}

/// Structured output writer that supports both human-readable and JSON output
#[derive(Debug, Clone)]
pub struct OutputWriter {
    pub mode: OutputMode,
    /// Sizes as "4.34 GB" rather than raw bytes (human mode only)
    pub human_readable: bool,
}

impl OutputWriter {
    pub fn new(json: bool, human_readable: bool) -> Self {
        Self {
            mode: if json { OutputMode::Json } else { OutputMode::Human },
            human_readable,
        }
    }

    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    fn print_json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error: cannot serialize output: {}", e),
        }
    }

    /// Print a full reconciliation report
    pub fn report(&self, report: &ReconcileReport) {
        if self.is_json() {
            self.print_json(report);
            return;
        }

        let human = self.human_readable;
        print_info(&format!("Store {}", report.store_root.display()));

        let referenced: Vec<_> = report
            .blobs
            .values()
            .filter(|r| r.status != BlobStatus::Orphaned)
            .collect();
        if !referenced.is_empty() {
            section_header("Blobs");
            println!("{}", blob_table(referenced, human));
        }

        if !report.orphaned.is_empty() {
            section_header("Orphaned files");
            println!("{}", orphan_table(&report.orphaned, human));
        }

        self.warnings(report);
        self.summary(report);
    }

    fn warnings(&self, report: &ReconcileReport) {
        if report.warnings.is_empty() {
            return;
        }
        section_header("Skipped manifests");
        for warning in &report.warnings {
            print_warning(&format!(
                "{}: {}",
                warning.path.display(),
                sanitize_error(&warning.message)
            ));
        }
    }

    fn summary(&self, report: &ReconcileReport) {
        let counts = report.counts();
        section_header("Summary");
        let mut items = vec![
            ("Models", counts.models.to_string()),
            ("Present", counts.present.to_string()),
            ("Missing", counts.missing.to_string()),
            ("Size mismatch", counts.size_mismatch.to_string()),
        ];
        if report.verified_digests {
            items.push(("Digest mismatch", counts.digest_mismatch.to_string()));
        }
        if counts.undetermined > 0 {
            items.push(("Undetermined", counts.undetermined.to_string()));
        }
        items.push(("Orphaned", counts.orphaned.to_string()));
        items.push((
            "Reclaimable",
            format_size(report.reclaimable_bytes(), self.human_readable),
        ));
        println!("{}", stats_table(&items));

        if report.is_clean() {
            print_success("All referenced blobs present, nothing orphaned");
        }
    }

    /// Print the model list
    pub fn models(&self, models: &[ModelSummary]) {
        if self.is_json() {
            self.print_json(models);
            return;
        }
        if models.is_empty() {
            print_info("No models found");
            return;
        }
        println!("{}", models_table(models, self.human_readable));
    }

    /// Print one model's properties and layers
    pub fn model(&self, summary: &ModelSummary) {
        if self.is_json() {
            self.print_json(summary);
            return;
        }

        let human = self.human_readable;
        section_header(&summary.model.to_string());
        let items = [
            ("Name", summary.model.full_name()),
            ("Manifest", summary.manifest_path.display().to_string()),
            ("Total size", format_size(summary.total_size, human)),
            ("Missing", format_size(summary.missing_bytes, human)),
        ];
        println!("{}", stats_table(&items));
        println!("{}", model_layers_table(summary, human));
    }

    /// Print an error message
    pub fn error(&self, err: &VaultError) {
        match self.mode {
            OutputMode::Json => {
                if let Ok(json) = serde_json::to_string(&ErrorReport::from(err)) {
                    eprintln!("{}", json);
                }
            }
            OutputMode::Human => {
                eprintln!("{} {}", Theme::error("Error:"), sanitize_error(&err.to_string()));
            }
        }
    }
}

/// Sanitize error messages by collapsing whitespace
pub fn sanitize_error(msg: &str) -> String {
    msg.split_whitespace().collect::<Vec<&str>>().join(" ")
}
