use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::aggregation::Event;
use crate::edit::EditRecord;
use crate::TARGET_AGGREGATION;

/// One edit attributed to a detected event, ready for downstream text
/// analysis.
#[derive(Debug, Serialize)]
pub struct EventEdit {
    pub text: String,
    pub timestamp: String,
    pub entity: String,
    pub event_id: usize,
}

/// Gather the edits belonging to one event: edits of member entities whose
/// day falls inside the event's inclusive `[start, end]` window and that
/// added non-blank text.
pub fn collect_event_edits(event_id: usize, event: &Event, edits: &[EditRecord]) -> Vec<EventEdit> {
    edits
        .iter()
        .filter(|edit| {
            event.entities.contains(&edit.entity)
                && event.start <= edit.period()
                && edit.period() <= event.end
        })
        .filter_map(|edit| {
            let text = edit.added_text();
            if text.trim().is_empty() {
                return None;
            }
            Some(EventEdit {
                text,
                timestamp: edit.timestamp.to_rfc3339(),
                entity: edit.entity.clone(),
                event_id,
            })
        })
        .collect()
}

/// Write one `event_<id>.json` file per event into `out_dir`.
pub fn write_event_files(events: &[Event], edits: &[EditRecord], out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output dir {}", out_dir.display()))?;

    for (event_id, event) in events.iter().enumerate() {
        let event_edits = collect_event_edits(event_id, event, edits);
        let path = out_dir.join(format!("event_{}.json", event_id));
        let json = serde_json::to_string_pretty(&event_edits)
            .context("failed to serialize event edits")?;
        fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    }

    info!(
        target: TARGET_AGGREGATION,
        "Exported {} event files to {}",
        events.len(),
        out_dir.display()
    );
    Ok(())
}
