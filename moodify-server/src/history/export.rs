//! History export (JSON and CSV)

use moodify_common::{Error, HistoryData, HistoryEntry, Result};
use std::fmt::Write as _;
use std::str::FromStr;

use super::HistoryStore;

const CSV_HEADER: &str = "Type,Emotion,Confidence,Timestamp,Track Count";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(Error::validation(format!(
                "Invalid export format '{}'. Must be 'json' or 'csv'",
                other
            ))),
        }
    }
}

/// Rendered export body
#[derive(Debug, Clone)]
pub struct ExportedHistory {
    pub format: ExportFormat,
    pub body: String,
}

/// Export every entry in insertion order
pub async fn export_history(store: &dyn HistoryStore, format: ExportFormat) -> Result<ExportedHistory> {
    let entries = store.all_entries().await?;
    let body = match format {
        ExportFormat::Json => serde_json::to_string_pretty(&entries)?,
        ExportFormat::Csv => to_csv(&entries),
    };
    Ok(ExportedHistory { format, body })
}

fn to_csv(entries: &[HistoryEntry]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for entry in entries {
        let (confidence, track_count) = match &entry.data {
            HistoryData::Emotion(result) => (result.confidence.to_string(), String::new()),
            HistoryData::Recommendation(rec) => (String::new(), rec.tracks.len().to_string()),
        };
        let _ = writeln!(
            out,
            "{},{},{},{},{}",
            csv_field(entry.entry_type().as_str()),
            csv_field(entry.emotion().as_str()),
            csv_field(&confidence),
            csv_field(&entry.timestamp.to_rfc3339()),
            csv_field(&track_count),
        );
    }
    out
}

/// Quote a field when it contains a delimiter, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
