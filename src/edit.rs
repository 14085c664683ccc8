use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::links::extract_links;
use crate::TARGET_INGEST;

/// File name prefix for per-entity edit dumps (`edits_<Entity>.json`).
const EDIT_FILE_PREFIX: &str = "edits_";

/// One normalized textual edit of one entity.
///
/// Created once at ingestion and never mutated afterwards; the graph
/// builders only ever borrow these.
#[derive(Debug, Clone)]
pub struct EditRecord {
    /// Identifier of the edited entity (article title).
    pub entity: String,
    /// When the edit was made, as a UTC instant.
    pub timestamp: DateTime<Utc>,
    /// Lines of text added by the edit.
    pub added: Vec<String>,
    /// Lines of text removed by the edit.
    pub removed: Vec<String>,
    /// Entities referenced by wiki links in the added text (may be empty).
    pub referenced_entities: HashSet<String>,
}

impl EditRecord {
    /// Build a record from raw ingestion fields.
    ///
    /// The timestamp must be ISO-8601 with an offset (a trailing `Z` is
    /// accepted). A malformed timestamp is a fatal ingestion error: dropping
    /// the record silently would corrupt the temporal ordering downstream.
    pub fn new(
        entity: &str,
        timestamp: &str,
        added: Vec<String>,
        removed: Vec<String>,
    ) -> Result<Self> {
        let timestamp = DateTime::parse_from_rfc3339(timestamp)
            .with_context(|| format!("invalid timestamp {:?} for entity {:?}", timestamp, entity))?
            .with_timezone(&Utc);

        let referenced_entities = extract_links(&added.join(" "));

        Ok(Self {
            entity: entity.to_string(),
            timestamp,
            added,
            removed,
            referenced_entities,
        })
    }

    /// The calendar day this edit falls into (the default period granularity).
    pub fn period(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// The added lines joined into one string.
    pub fn added_text(&self) -> String {
        self.added.join(" ")
    }
}

/// Shape of one element in an `edits_<Entity>.json` dump.
#[derive(Debug, Deserialize)]
struct RawEdit {
    timestamp: String,
    #[serde(default)]
    added: Vec<String>,
    #[serde(default)]
    deleted: Vec<String>,
}

/// Load every `edits_<Entity>.json` file in `dir` into edit records.
///
/// The entity identifier is taken from the file name between the `edits_`
/// prefix and the `.json` extension. Files not matching that pattern are
/// skipped; files that match but cannot be read or parsed are fatal.
pub fn load_edits_dir(dir: &Path) -> Result<Vec<EditRecord>> {
    let mut all_edits = Vec::new();
    let mut file_count = 0usize;

    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read edits dir {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        let path = entry.path();

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(entity) = name
            .strip_prefix(EDIT_FILE_PREFIX)
            .and_then(|rest| rest.strip_suffix(".json"))
        else {
            continue;
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let raw_edits: Vec<RawEdit> = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        debug!(
            target: TARGET_INGEST,
            "Loaded {} raw edits for entity '{}'",
            raw_edits.len(),
            entity
        );

        for raw in raw_edits {
            all_edits.push(EditRecord::new(
                entity,
                &raw.timestamp,
                raw.added,
                raw.deleted,
            )?);
        }
        file_count += 1;
    }

    info!(
        target: TARGET_INGEST,
        "Loaded {} edits across {} entities from {}",
        all_edits.len(),
        file_count,
        dir.display()
    );

    Ok(all_edits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn test_timestamp_parsed_as_utc() {
        let edit = EditRecord::new("Page", "2021-10-05T14:30:00Z", vec![], vec![]).unwrap();
        assert_eq!(edit.timestamp.to_rfc3339(), "2021-10-05T14:30:00+00:00");
        assert_eq!(
            edit.period(),
            NaiveDate::from_ymd_opt(2021, 10, 5).unwrap()
        );
    }

    #[test]
    fn test_offset_timestamp_normalized_to_utc() {
        let edit = EditRecord::new("Page", "2021-10-05T23:30:00-02:00", vec![], vec![]).unwrap();
        // 23:30 at -02:00 is 01:30 UTC the next day.
        assert_eq!(
            edit.period(),
            NaiveDate::from_ymd_opt(2021, 10, 6).unwrap()
        );
    }

    #[test]
    fn test_malformed_timestamp_is_fatal() {
        let result = EditRecord::new("Page", "October 5th, 2021", vec![], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_links_extracted_from_added_text() {
        let edit = EditRecord::new(
            "Page",
            "2021-10-05T00:00:00Z",
            vec!["saw [[Alpha]] and".to_string(), "[[Beta|B]] react".to_string()],
            vec![],
        )
        .unwrap();
        assert_eq!(edit.referenced_entities.len(), 2);
        assert!(edit.referenced_entities.contains("Alpha"));
        assert!(edit.referenced_entities.contains("Beta"));
    }

    #[test]
    fn test_load_edits_dir() {
        let dir = tempfile::tempdir().unwrap();

        let mut f = File::create(dir.path().join("edits_Some Article.json")).unwrap();
        write!(
            f,
            r#"[{{"title": "Some Article", "timestamp": "2021-10-05T10:00:00Z",
                 "added": ["linked [[Other]]"], "deleted": []}},
                {{"title": "Some Article", "timestamp": "2021-10-06T10:00:00Z",
                 "added": [], "deleted": ["old text"]}}]"#
        )
        .unwrap();
        // Non-matching file names are skipped, not errors.
        File::create(dir.path().join("notes.txt")).unwrap();

        let edits = load_edits_dir(dir.path()).unwrap();
        assert_eq!(edits.len(), 2);
        assert!(edits.iter().all(|e| e.entity == "Some Article"));
        assert!(edits[0].referenced_entities.contains("Other")
            || edits[1].referenced_entities.contains("Other"));
    }

    #[test]
    fn test_load_edits_dir_malformed_json_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = File::create(dir.path().join("edits_Broken.json")).unwrap();
        write!(f, "not json").unwrap();
        assert!(load_edits_dir(dir.path()).is_err());
    }
}
