//! Ordered note collection bound to one snapshot key.

use crate::model::note::{Note, NoteId};
use crate::repo::snapshot_repo::{RepoError, SnapshotRepository};
use crate::store::snapshot::{decode_snapshot, encode_snapshot};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// In-memory collection errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    NotFound(NoteId),
    DuplicateId(NoteId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::DuplicateId(id) => write!(f, "note id already exists: {id}"),
        }
    }
}

impl Error for StoreError {}

/// Snapshot read/write failures.
#[derive(Debug)]
pub enum PersistenceError {
    Read(RepoError),
    Write(RepoError),
    Corrupt(serde_json::Error),
    Encode(serde_json::Error),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(err) => write!(f, "failed to read notes snapshot: {err}"),
            Self::Write(err) => write!(f, "failed to write notes snapshot: {err}"),
            Self::Corrupt(err) => write!(f, "notes snapshot is not valid: {err}"),
            Self::Encode(err) => write!(f, "failed to encode notes snapshot: {err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read(err) | Self::Write(err) => Some(err),
            Self::Corrupt(err) | Self::Encode(err) => Some(err),
        }
    }
}

/// Canonical note collection bound to one snapshot key.
pub struct NoteStore {
    notes: Vec<Note>,
    repo: Box<dyn SnapshotRepository>,
    snapshot_key: String,
    dirty: bool,
}

impl NoteStore {
    /// Reads the snapshot under `snapshot_key`; a missing one yields an empty
    /// store.
    ///
    /// Legacy records without a deadline get `fallback_deadline`.
    ///
    /// # Errors
    /// - `Read` when the repository fails.
    /// - `Corrupt` when the payload cannot be decoded.
    pub fn load(
        repo: Box<dyn SnapshotRepository>,
        snapshot_key: impl Into<String>,
        fallback_deadline: i64,
    ) -> Result<Self, PersistenceError> {
        let snapshot_key = snapshot_key.into();
        let notes = match repo
            .read_snapshot(&snapshot_key)
            .map_err(PersistenceError::Read)?
        {
            Some(payload) => {
                decode_snapshot(&payload, fallback_deadline).map_err(PersistenceError::Corrupt)?
            }
            None => Vec::new(),
        };

        info!(
            "event=snapshot_load module=store status=ok notes={}",
            notes.len()
        );
        Ok(Self {
            notes,
            repo,
            snapshot_key,
            dirty: false,
        })
    }

    /// Replaces the stored snapshot with the whole current collection.
    ///
    /// On failure the collection is left as is and stays dirty, so the next
    /// call writes the then-current state.
    pub fn persist(&mut self, now: i64) -> Result<(), PersistenceError> {
        let result = encode_snapshot(&self.notes)
            .map_err(PersistenceError::Encode)
            .and_then(|payload| {
                self.repo
                    .write_snapshot(&self.snapshot_key, &payload, now)
                    .map_err(PersistenceError::Write)
            });

        match &result {
            Ok(()) => {
                self.dirty = false;
                info!(
                    "event=snapshot_persist module=store status=ok notes={}",
                    self.notes.len()
                );
            }
            Err(err) => {
                self.dirty = true;
                warn!(
                    "event=snapshot_persist module=store status=error notes={} error={}",
                    self.notes.len(),
                    err
                );
            }
        }
        result
    }

    /// Inserts `note` at its canonical position.
    pub fn add(&mut self, note: Note) -> Result<(), StoreError> {
        match self.notes.binary_search_by_key(&note.id, |existing| existing.id) {
            Ok(_) => Err(StoreError::DuplicateId(note.id)),
            Err(index) => {
                self.notes.insert(index, note);
                self.dirty = true;
                Ok(())
            }
        }
    }

    /// Applies `mutator` to the note with `id` in place.
    ///
    /// The mutator must not change `id` or `created_at`.
    pub fn update<R>(
        &mut self,
        id: NoteId,
        mutator: impl FnOnce(&mut Note) -> R,
    ) -> Result<R, StoreError> {
        let index = self.position(id).ok_or(StoreError::NotFound(id))?;
        let note = &mut self.notes[index];
        let output = mutator(&mut *note);
        debug_assert_eq!(note.id, id, "note identity must not change");
        self.dirty = true;
        Ok(output)
    }

    /// Removes the note with `id`; `None` when absent.
    pub fn remove(&mut self, id: NoteId) -> Option<Note> {
        let index = self.position(id)?;
        self.dirty = true;
        Some(self.notes.remove(index))
    }

    /// Removes every note matching `predicate`, returning them in canonical
    /// order.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&Note) -> bool) -> Vec<Note> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.notes.len());
        for note in self.notes.drain(..) {
            if predicate(&note) {
                removed.push(note);
            } else {
                kept.push(note);
            }
        }
        self.notes = kept;
        if !removed.is_empty() {
            self.dirty = true;
        }
        removed
    }

    /// Read-only view in canonical order.
    pub fn all(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.position(id).map(|index| &self.notes[index])
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Whether in-memory state differs from the last successful write.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns an unused id, `now` unless a note already sits at or after it.
    pub fn allocate_id(&self, now: i64) -> NoteId {
        match self.notes.last() {
            Some(last) if last.id >= now => last.id.saturating_add(1),
            _ => now,
        }
    }

    fn position(&self, id: NoteId) -> Option<usize> {
        self.notes
            .binary_search_by_key(&id, |note| note.id)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteStore, StoreError};
    use crate::db::open_db_in_memory;
    use crate::model::note::{Note, NoteDraft};
    use crate::repo::snapshot_repo::SqliteSnapshotRepository;

    fn empty_store() -> NoteStore {
        let repo = SqliteSnapshotRepository::try_new(open_db_in_memory().unwrap()).unwrap();
        NoteStore::load(Box::new(repo), "notes", 0).unwrap()
    }

    fn note(id: i64, tags: &str) -> Note {
        let draft = NoteDraft::parse("title", "content", tags).unwrap();
        Note::from_draft(id, draft, 1_000)
    }

    #[test]
    fn add_keeps_ascending_id_order_and_rejects_duplicates() {
        let mut store = empty_store();
        store.add(note(30, "")).unwrap();
        store.add(note(10, "")).unwrap();
        store.add(note(20, "")).unwrap();

        let ids: Vec<i64> = store.all().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(store.add(note(20, "")), Err(StoreError::DuplicateId(20)));
    }

    #[test]
    fn update_and_remove_report_missing_ids() {
        let mut store = empty_store();
        store.add(note(1, "")).unwrap();

        let err = store.update(2, |n| n.archived = true).unwrap_err();
        assert_eq!(err, StoreError::NotFound(2));
        assert!(store.remove(2).is_none());

        store.update(1, |n| n.archived = true).unwrap();
        assert!(store.get(1).unwrap().archived);
        assert_eq!(store.remove(1).map(|n| n.id), Some(1));
        assert!(store.is_empty());
    }

    #[test]
    fn allocate_id_never_reuses_existing_ids() {
        let mut store = empty_store();
        assert_eq!(store.allocate_id(100), 100);
        store.add(note(100, "")).unwrap();
        assert_eq!(store.allocate_id(100), 101);
        assert_eq!(store.allocate_id(99), 101);
        assert_eq!(store.allocate_id(500), 500);
    }

    #[test]
    fn dirty_flag_tracks_unpersisted_changes() {
        let mut store = empty_store();
        assert!(!store.is_dirty());
        store.add(note(1, "")).unwrap();
        assert!(store.is_dirty());
        store.persist(5).unwrap();
        assert!(!store.is_dirty());

        let removed = store.remove_where(|n| n.id == 1);
        assert_eq!(removed.len(), 1);
        assert!(store.is_dirty());
    }
}
