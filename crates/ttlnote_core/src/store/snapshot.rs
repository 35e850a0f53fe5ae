//! Snapshot wire format.
//!
//! One JSON array of records in ascending `id` order:
//! `{ id, title, content, tags, modified, deletionTime, isArchived }`.
//! There is no version field. Older snapshots may lack `tags`,
//! `isArchived`, `modified` or `deletionTime`; decoding fills those in.

use crate::model::note::Note;
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRecord {
    id: i64,
    title: String,
    content: String,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    modified: Option<i64>,
    #[serde(default)]
    deletion_time: Option<i64>,
    #[serde(default)]
    is_archived: Option<bool>,
}

impl From<&Note> for SnapshotRecord {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            content: note.content.clone(),
            tags: Some(note.tags.clone()),
            modified: Some(note.modified_at),
            deletion_time: Some(note.deletion_deadline),
            is_archived: Some(note.archived),
        }
    }
}

impl SnapshotRecord {
    fn into_note(self, fallback_deadline: i64) -> Note {
        Note {
            id: self.id,
            title: self.title,
            content: self.content,
            tags: self.tags.unwrap_or_default(),
            created_at: self.id,
            modified_at: self.modified.unwrap_or(self.id),
            deletion_deadline: self.deletion_time.unwrap_or(fallback_deadline),
            archived: self.is_archived.unwrap_or(false),
        }
    }
}

/// Serializes notes in the order given (callers pass canonical order).
pub fn encode_snapshot(notes: &[Note]) -> serde_json::Result<String> {
    let records: Vec<SnapshotRecord> = notes.iter().map(SnapshotRecord::from).collect();
    serde_json::to_string(&records)
}

/// Parses a snapshot into canonical order.
///
/// Records without `deletionTime` get `fallback_deadline`. When two records
/// share an id, the first one wins. Records with blank title or content are
/// kept unchanged and counted in the log.
pub fn decode_snapshot(payload: &str, fallback_deadline: i64) -> serde_json::Result<Vec<Note>> {
    let records: Vec<SnapshotRecord> = serde_json::from_str(payload)?;
    let mut notes: Vec<Note> = records
        .into_iter()
        .map(|record| record.into_note(fallback_deadline))
        .collect();

    notes.sort_by_key(|note| note.id);
    let before = notes.len();
    notes.dedup_by_key(|note| note.id);
    if notes.len() != before {
        warn!(
            "event=snapshot_decode module=store status=degraded duplicate_ids_dropped={}",
            before - notes.len()
        );
    }

    let blank = notes
        .iter()
        .filter(|note| note.title.trim().is_empty() || note.content.trim().is_empty())
        .count();
    if blank > 0 {
        warn!(
            "event=snapshot_decode module=store status=degraded blank_records={}",
            blank
        );
    }
    Ok(notes)
}
