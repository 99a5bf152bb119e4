//! Output formatting for presets.
//!
//! Supports a table view plus JSON and YAML for scripting.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use crate::domain::{History, PresetError, Result};

use super::state::PresetState;
use super::store::PresetStore;

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Compact table listing.
    #[default]
    Table,
    /// JSON format for programmatic use.
    Json,
    /// YAML, matching the on-disk document style.
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(format!("Unknown format: {s}. Use: table, json, yaml")),
        }
    }
}

/// One preset flattened for display.
#[derive(Debug, Clone, Serialize)]
pub struct PresetRow {
    pub category: String,
    pub name: String,
    pub value: f64,
    pub active: bool,
    pub last_changed: Option<String>,
    pub last_note: Option<String>,
}

/// Rows for every cached preset, ordered by category then name.
#[must_use]
pub fn collect_rows(store: &PresetStore, include_inactive: bool) -> Vec<PresetRow> {
    let mut rows = Vec::new();
    for category in store.categories() {
        let Some(document) = store.document(&category) else {
            continue;
        };
        for (name, record) in document {
            if !record.active && !include_inactive {
                continue;
            }
            let last = record.history.last();
            rows.push(PresetRow {
                category: category.clone(),
                name,
                value: record.value,
                active: record.active,
                last_changed: last.map(|e| e.timestamp.clone()),
                last_note: last.map(|e| e.note.trim().to_string()),
            });
        }
    }
    rows
}

/// Formats preset rows in the requested format.
///
/// # Errors
/// Returns error if JSON or YAML serialization fails.
pub fn format_presets(rows: &[PresetRow], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(format_presets_table(rows)),
        OutputFormat::Json => serde_json::to_string_pretty(rows).map_err(PresetError::json),
        OutputFormat::Yaml => serde_yaml::to_string(rows).map_err(PresetError::serialize),
    }
}

/// Formats a table listing of presets.
#[must_use]
pub fn format_presets_table(rows: &[PresetRow]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Category", "Name", "Value", "Active", "Changed", "Note"]);

    for row in rows {
        table.add_row(vec![
            row.category.clone(),
            row.name.clone(),
            format!("{:.4}", row.value),
            if row.active { "yes" } else { "no" }.to_string(),
            row.last_changed.clone().unwrap_or_else(|| "-".to_string()),
            truncate(row.last_note.as_deref().unwrap_or("-"), 40),
        ]);
    }

    table.to_string()
}

/// Formats a preset's history, oldest first.
#[must_use]
pub fn format_history(category: &str, name: &str, history: &History) -> String {
    let mut out = format!("{} {}\n", name.bold(), format!("({category})").dimmed());
    if history.is_empty() {
        out.push_str("  no history\n");
    }
    for entry in history.iter() {
        out.push_str(&format!("  {}  {}\n", entry.timestamp.cyan(), entry.note));
    }
    out
}

/// Formats the nearest-state report.
#[must_use]
pub fn format_state(device: &str, state: &PresetState) -> String {
    let label = match state {
        PresetState::At(name) => name.green().bold(),
        PresetState::Unknown => "unknown".yellow(),
    };
    format!("{device}: {label}")
}

/// Truncates a string to max length with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
