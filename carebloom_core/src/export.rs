//! CSV export of a patient's events for care reports.

use crate::{CareEvent, Result};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    date: String,
    start_time: String,
    end_time: String,
    #[serde(rename = "type")]
    kind: &'static str,
    priority: &'static str,
    title: &'a str,
    description: &'a str,
    completed: bool,
    recurring: bool,
    caregiver_notes: Option<&'a str>,
}

impl<'a> From<&'a CareEvent> for CsvRow<'a> {
    fn from(event: &'a CareEvent) -> Self {
        CsvRow {
            id: event.id.as_str(),
            date: event.date.format("%Y-%m-%d").to_string(),
            start_time: event.start_time.to_string(),
            end_time: event.end_time.to_string(),
            kind: event.kind.as_str(),
            priority: event.priority.as_str(),
            title: &event.title,
            description: &event.description,
            completed: event.completed,
            recurring: event.recurring,
            caregiver_notes: event.caregiver_notes.as_deref(),
        }
    }
}

/// Write events to `path` as CSV with a header row
///
/// Overwrites any existing file. Returns the number of rows written.
pub fn export_events_csv(events: &[CareEvent], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    for event in events {
        writer.serialize(CsvRow::from(event))?;
    }

    // Flush and sync to disk
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} events to {:?}", events.len(), path);
    Ok(events.len())
}
