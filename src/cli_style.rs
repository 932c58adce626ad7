/*!
 * modelvault CLI style system
 *
 * Themed text, icons and comfy-table builders for rendering reconciliation
 * reports in a terminal.
 */

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use console::{style, StyledObject};

use crate::core::{BlobRecord, BlobStatus, ModelStatus, ModelSummary, OrphanedFile};

// ============================================================================
// THEME COLORS
// ============================================================================

pub struct Theme;

impl Theme {
    /// Primary accent color (cyan)
    pub fn primary<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan()
    }

    pub fn success<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).green()
    }

    pub fn warning<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).yellow()
    }

    pub fn error<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).red()
    }

    pub fn muted<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).dim()
    }

    /// Header style (bold cyan)
    pub fn header<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan().bold()
    }
}

// ============================================================================
// ICONS
// ============================================================================

pub struct Icons;

impl Icons {
    pub const SUCCESS: &'static str = "✓";
    pub const ERROR: &'static str = "✗";
    pub const WARNING: &'static str = "⚠";
    pub const INFO: &'static str = "ℹ";
    pub const UNKNOWN: &'static str = "?";
    pub const ORPHAN: &'static str = "○";
    pub const ARROW_RIGHT: &'static str = "→";
}

/// Draw a section header with a line
pub fn section_header(title: &str) {
    let line_len = 50 - title.len().min(40);
    println!(
        "\n{} {}",
        Theme::header(title),
        Theme::muted("─".repeat(line_len))
    );
}

// ============================================================================
// TABLES
// ============================================================================

/// Create a styled data table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Create a minimal table (no outer borders)
pub fn create_minimal_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_NO_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cells(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| Cell::new(t).fg(Color::Cyan).add_attribute(Attribute::Bold))
        .collect()
}

/// Create a key-value table for summary counts
pub fn stats_table(items: &[(&str, String)]) -> Table {
    let mut table = create_minimal_table();

    for (key, value) in items {
        table.add_row(vec![
            Cell::new(key).fg(Color::Cyan),
            Cell::new(value)
                .fg(Color::White)
                .add_attribute(Attribute::Bold),
        ]);
    }

    table
}

/// Colored cell for a blob status
pub fn status_cell(status: BlobStatus) -> Cell {
    let (icon, color) = match status {
        BlobStatus::Present => (Icons::SUCCESS, Color::Green),
        BlobStatus::SizeMismatch | BlobStatus::DigestMismatch => (Icons::WARNING, Color::Yellow),
        BlobStatus::Missing => (Icons::ERROR, Color::Red),
        BlobStatus::Orphaned => (Icons::ORPHAN, Color::DarkGrey),
        BlobStatus::Undetermined => (Icons::UNKNOWN, Color::Magenta),
    };
    Cell::new(format!("{} {}", icon, status)).fg(color)
}

fn model_status_cell(status: ModelStatus) -> Cell {
    match status {
        ModelStatus::Complete => Cell::new(format!("{} complete", Icons::SUCCESS)).fg(Color::Green),
        ModelStatus::Incomplete => {
            Cell::new(format!("{} incomplete", Icons::ERROR)).fg(Color::Red)
        }
        ModelStatus::Unverified => {
            Cell::new(format!("{} unverified", Icons::UNKNOWN)).fg(Color::Magenta)
        }
    }
}

fn optional_size(size: Option<u64>, human: bool) -> String {
    size.map(|s| format_size(s, human))
        .unwrap_or_else(|| "-".to_string())
}

/// One row per blob record
pub fn blob_table<'a>(records: impl IntoIterator<Item = &'a BlobRecord>, human: bool) -> Table {
    let mut table = create_table();
    table.set_header(header_cells(&[
        "Digest", "Type", "Status", "Expected", "Actual", "Models",
    ]));

    for record in records {
        let models = record
            .referenced_by
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let status = match record.warning {
            Some(ref warning) => Cell::new(format!(
                "{} {} {}",
                record.status,
                Icons::ARROW_RIGHT,
                warning
            ))
            .fg(Color::Yellow),
            None => status_cell(record.status),
        };

        table.add_row(vec![
            Cell::new(record.digest.short()),
            Cell::new(record.media_type.as_ref().map(|m| m.label()).unwrap_or("-")),
            status,
            Cell::new(optional_size(record.expected_size, human)),
            Cell::new(optional_size(record.actual_size, human)),
            Cell::new(models).fg(Color::DarkGrey),
        ]);
    }

    table
}

/// Unreferenced files in the blob directory
pub fn orphan_table(orphans: &[OrphanedFile], human: bool) -> Table {
    let mut table = create_table();
    table.set_header(header_cells(&["File", "Size"]));
    for orphan in orphans {
        let name = orphan
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| orphan.path.display().to_string());
        let size = match orphan.warning {
            Some(_) => Cell::new("unresolved link").fg(Color::Yellow),
            None => Cell::new(format_size(orphan.size, human)),
        };
        table.add_row(vec![Cell::new(name).fg(Color::DarkGrey), size]);
    }
    table
}

/// The model list: name, tag, size, completeness
pub fn models_table(models: &[ModelSummary], human: bool) -> Table {
    let mut table = create_table();
    table.set_header(header_cells(&["Model", "Tag", "Size", "Layers", "Status"]));

    for summary in models {
        let model = &summary.model;
        let name = if model.host == modelvault_core_manifest::DEFAULT_HOST
            && model.namespace == modelvault_core_manifest::DEFAULT_NAMESPACE
        {
            model.name.clone()
        } else {
            format!("{}/{}/{}", model.host, model.namespace, model.name)
        };
        table.add_row(vec![
            Cell::new(name).add_attribute(Attribute::Bold),
            Cell::new(&model.tag),
            Cell::new(format_size(summary.total_size, human)),
            Cell::new(summary.layers.len().to_string()),
            model_status_cell(summary.status),
        ]);
    }

    table
}

/// Layer breakdown of one model
pub fn model_layers_table(summary: &ModelSummary, human: bool) -> Table {
    let mut table = create_table();
    table.set_header(header_cells(&["Layer", "Digest", "Size", "Status"]));

    for layer in &summary.layers {
        table.add_row(vec![
            Cell::new(layer.media_type.as_ref().map(|m| m.label()).unwrap_or("layer")),
            Cell::new(layer.digest.short()).fg(Color::DarkGrey),
            Cell::new(format_size(layer.size, human)),
            status_cell(layer.status),
        ]);
    }

    table
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Format bytes into human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let base = 1024.0_f64;
    let exp = (bytes_f.ln() / base.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);

    let value = bytes_f / base.powi(exp as i32);

    if exp == 0 {
        format!("{} {}", bytes, UNITS[exp])
    } else {
        format!("{:.2} {}", value, UNITS[exp])
    }
}

/// Raw byte count, or `format_bytes` when `human` is set
pub fn format_size(bytes: u64, human: bool) -> String {
    if human {
        format_bytes(bytes)
    } else {
        bytes.to_string()
    }
}

/// Print a styled warning message
pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        Theme::warning(Icons::WARNING.to_string()),
        Theme::warning(message)
    );
}

/// Print a styled success message
pub fn print_success(message: &str) {
    println!(
        "{} {}",
        Theme::success(Icons::SUCCESS.to_string()),
        Theme::success(message)
    );
}

/// Print a styled info message
pub fn print_info(message: &str) {
    println!("{} {}", Theme::primary(Icons::INFO.to_string()), message);
}

// ============================================================================
// TESTS
// ============================================================================
