//! Note lifecycle engine.
//!
//! # Responsibility
//! - Apply create/edit/archive/unarchive/delete transitions.
//! - Run the warning and expiration sweep.
//! - Hold view state and signal re-renders to the presentation layer.
//!
//! # Invariants
//! - For a non-archived note, `deletion_deadline` is the last reset time
//!   (creation, edit or unarchive) plus the configured lifespan.
//! - At most one expiration warning per note per deadline epoch; resetting
//!   the deadline clears the warned mark.
//! - Archived notes are never removed by the sweep.
//! - A failed snapshot write never rolls back an in-memory transition.

use crate::clock::Clock;
use crate::config::{ConfigError, CoreConfig};
use crate::model::note::{Note, NoteDraft, NoteId, NoteStatus, NoteValidationError};
use crate::notify::{NotificationGateway, PermissionState};
use crate::repo::snapshot_repo::SnapshotRepository;
use crate::store::{NoteStore, PersistenceError, StoreError};
use crate::view::{compute_view, SortOrder, StatusFilter, ViewModel, ViewState};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// How much of the presentation needs refreshing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderRequest {
    /// Notes, filters or order changed.
    Full,
    /// Only live countdown text needs to move forward.
    TimersOnly,
}

/// Receives "state changed, please re-render" signals.
pub trait RenderListener: Send {
    fn on_render_request(&mut self, request: RenderRequest);
}

impl<F> RenderListener for F
where
    F: FnMut(RenderRequest) + Send,
{
    fn on_render_request(&mut self, request: RenderRequest) {
        self(request)
    }
}

/// Rejections of a lifecycle operation. The engine state is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    Validation(NoteValidationError),
    NotFound(NoteId),
    DuplicateId(NoteId),
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::DuplicateId(id) => write!(f, "note id already exists: {id}"),
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for LifecycleError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for LifecycleError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::DuplicateId(id) => Self::DuplicateId(id),
        }
    }
}

/// Startup failures of `LifecycleEngine::open`.
#[derive(Debug)]
pub enum EngineInitError {
    Config(ConfigError),
    Persistence(PersistenceError),
}

impl Display for EngineInitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EngineInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<ConfigError> for EngineInitError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<PersistenceError> for EngineInitError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

/// An applied transition plus the result of persisting it.
#[derive(Debug)]
pub struct MutationOutcome<T> {
    pub value: T,
    /// Set when the snapshot write failed; the transition still stands.
    pub persist_error: Option<PersistenceError>,
}

impl<T> MutationOutcome<T> {
    pub fn is_persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

/// Result of a state-targeted archive or unarchive call.
#[derive(Debug)]
pub enum ArchiveOutcome {
    Changed(MutationOutcome<Note>),
    /// The note was already in the requested state; nothing was reset.
    Unchanged,
}

/// What one sweep tick did.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub now: i64,
    /// Ids that received their expiration warning on this tick.
    pub warned: Vec<NoteId>,
    /// Ids removed on this tick, canonical order.
    pub expired: Vec<NoteId>,
    pub persist_error: Option<PersistenceError>,
}

impl SweepReport {
    pub fn is_idle(&self) -> bool {
        self.warned.is_empty() && self.expired.is_empty()
    }
}

/// Owns notes, the warned index and view state for one session.
pub struct LifecycleEngine {
    store: NoteStore,
    gateway: NotificationGateway,
    clock: Arc<dyn Clock>,
    config: CoreConfig,
    warned: HashSet<NoteId>,
    view_state: ViewState,
    listener: Option<Box<dyn RenderListener>>,
}

impl LifecycleEngine {
    /// Validates `config`, loads the snapshot and builds the engine.
    pub fn open(
        repo: Box<dyn SnapshotRepository>,
        gateway: NotificationGateway,
        clock: Arc<dyn Clock>,
        config: CoreConfig,
    ) -> Result<Self, EngineInitError> {
        config.validate()?;
        let fallback_deadline = clock.now_ms().saturating_add(config.lifespan_ms);
        let store = NoteStore::load(repo, config.snapshot_key.clone(), fallback_deadline)?;
        Ok(Self::new(store, gateway, clock, config))
    }

    /// Builds the engine around an already loaded store and asks for
    /// notification permission once.
    pub fn new(
        store: NoteStore,
        mut gateway: NotificationGateway,
        clock: Arc<dyn Clock>,
        config: CoreConfig,
    ) -> Self {
        let permission = gateway.request_permission();
        info!(
            "event=engine_start module=lifecycle status=ok notes={} permission={}",
            store.len(),
            permission.as_str()
        );
        Self {
            store,
            gateway,
            clock,
            config,
            warned: HashSet::new(),
            view_state: ViewState::default(),
            listener: None,
        }
    }

    pub fn set_render_listener(&mut self, listener: Box<dyn RenderListener>) {
        self.listener = Some(listener);
    }

    /// Creates an active, unwarned note.
    ///
    /// # Errors
    /// - `Validation` when title or content is blank after trimming.
    pub fn create(
        &mut self,
        title: &str,
        content: &str,
        tags_text: &str,
    ) -> Result<MutationOutcome<Note>, LifecycleError> {
        let draft = self.parse_draft("note_create", title, content, tags_text)?;
        let now = self.clock.now_ms();
        let id = self.store.allocate_id(now);
        let note = Note::from_draft(id, draft, self.config.lifespan_ms);
        self.store.add(note.clone())?;

        info!(
            "event=note_create module=lifecycle status=ok note_id={} tags={}",
            id,
            note.tags.len()
        );
        self.gateway.notify(
            "Note Saved!",
            &format!(
                "The note \"{}\" has been saved. It will be auto-deleted in {} unless archived.",
                note.title,
                describe_duration(self.config.lifespan_ms)
            ),
        );
        Ok(self.commit(note, now))
    }

    /// Replaces title, content and tags and restarts the lifespan.
    ///
    /// # Errors
    /// - `Validation` when title or content is blank after trimming.
    /// - `NotFound` when `id` is not stored.
    pub fn edit(
        &mut self,
        id: NoteId,
        title: &str,
        content: &str,
        tags_text: &str,
    ) -> Result<MutationOutcome<Note>, LifecycleError> {
        let draft = self.parse_draft("note_edit", title, content, tags_text)?;
        let now = self.clock.now_ms();
        let lifespan_ms = self.config.lifespan_ms;
        let note = self
            .store
            .update(id, |note| {
                note.apply_edit(draft, now, lifespan_ms);
                note.clone()
            })
            .inspect_err(|_| reject("note_edit", id))?;
        self.warned.remove(&id);

        info!(
            "event=note_edit module=lifecycle status=ok note_id={} archived={}",
            id, note.archived
        );
        self.gateway.notify(
            "Note Updated!",
            &format!(
                "The note \"{}\" has been updated. Its deletion timer has been reset to {}.",
                note.title,
                describe_duration(lifespan_ms)
            ),
        );
        Ok(self.commit(note, now))
    }

    /// Flips the archived flag.
    ///
    /// # Errors
    /// - `NotFound` when `id` is not stored.
    pub fn toggle_archive(&mut self, id: NoteId) -> Result<MutationOutcome<Note>, LifecycleError> {
        let archived = self
            .store
            .get(id)
            .map(|note| note.archived)
            .ok_or(LifecycleError::NotFound(id))
            .inspect_err(|_| reject("note_archive", id))?;
        self.apply_archived(id, !archived)
    }

    /// Archives `id` unless it already is.
    pub fn archive(&mut self, id: NoteId) -> Result<ArchiveOutcome, LifecycleError> {
        self.set_archived(id, true)
    }

    /// Unarchives `id` unless it already is active.
    pub fn unarchive(&mut self, id: NoteId) -> Result<ArchiveOutcome, LifecycleError> {
        self.set_archived(id, false)
    }

    /// Removes a note in any state. Confirmation is the caller's concern.
    ///
    /// # Errors
    /// - `NotFound` when `id` is not stored.
    pub fn delete(&mut self, id: NoteId) -> Result<MutationOutcome<Note>, LifecycleError> {
        let removed = self
            .store
            .remove(id)
            .ok_or(LifecycleError::NotFound(id))
            .inspect_err(|_| reject("note_delete", id))?;
        self.warned.remove(&id);

        info!(
            "event=note_delete module=lifecycle status=ok note_id={} archived={}",
            id, removed.archived
        );
        let now = self.clock.now_ms();
        Ok(self.commit(removed, now))
    }

    /// One sweep tick: warn notes entering the warning window, then remove
    /// every non-archived note whose deadline has been reached.
    pub fn sweep(&mut self) -> SweepReport {
        let now = self.clock.now_ms();
        let window_ms = self.config.warning_window_ms;
        let mut report = SweepReport {
            now,
            ..SweepReport::default()
        };

        for note in self.store.all() {
            if !note.is_in_warning_window(now, window_ms) || self.warned.contains(&note.id) {
                continue;
            }
            self.gateway.notify(
                "Note Expiration Warning",
                &format!(
                    "The note \"{}\" will be deleted in less than {}.",
                    note.title,
                    describe_duration(window_ms)
                ),
            );
            self.warned.insert(note.id);
            report.warned.push(note.id);
        }

        let expired = self.store.remove_where(|note| note.is_expired_at(now));
        for note in &expired {
            self.warned.remove(&note.id);
            report.expired.push(note.id);
        }

        if !report.warned.is_empty() {
            info!(
                "event=sweep_warn module=lifecycle status=ok warned={}",
                report.warned.len()
            );
        }
        if !report.expired.is_empty() {
            info!(
                "event=sweep_expire module=lifecycle status=ok expired={} remaining={}",
                report.expired.len(),
                self.store.len()
            );
            report.persist_error = self.store.persist(now).err();
            self.request_render(RenderRequest::Full);
        } else if self.view_state.show_deletion_timers {
            self.request_render(RenderRequest::TimersOnly);
        }
        report
    }

    /// Final write on teardown when the last persist did not go through.
    pub fn shutdown(&mut self) -> Result<(), PersistenceError> {
        if !self.store.is_dirty() {
            info!("event=engine_shutdown module=lifecycle status=ok flushed=false");
            return Ok(());
        }
        let result = self.store.persist(self.clock.now_ms());
        match &result {
            Ok(()) => info!("event=engine_shutdown module=lifecycle status=ok flushed=true"),
            Err(err) => warn!(
                "event=engine_shutdown module=lifecycle status=error error={}",
                err
            ),
        }
        result
    }

    pub fn notes(&self) -> &[Note] {
        self.store.all()
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.store.get(id)
    }

    /// Derived status, or `None` when the note does not exist.
    pub fn status_of(&self, id: NoteId) -> Option<NoteStatus> {
        self.store.get(id).map(|note| {
            if note.archived {
                NoteStatus::Archived
            } else if self.warned.contains(&id) {
                NoteStatus::Warned
            } else {
                NoteStatus::Active
            }
        })
    }

    pub fn is_warned(&self, id: NoteId) -> bool {
        self.warned.contains(&id)
    }

    pub fn permission(&self) -> PermissionState {
        self.gateway.permission()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Whether the in-memory notes differ from the last successful write.
    pub fn has_unsaved_changes(&self) -> bool {
        self.store.is_dirty()
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view_state
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.view_state.status_filter = filter;
        self.request_render(RenderRequest::Full);
    }

    pub fn set_tag_filter(&mut self, tag: Option<String>) {
        self.view_state.tag_filter = tag;
        self.request_render(RenderRequest::Full);
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.view_state.sort_order = order;
        self.request_render(RenderRequest::Full);
    }

    /// Flips countdown display; returns the new setting.
    pub fn toggle_deletion_timers(&mut self) -> bool {
        self.view_state.show_deletion_timers = !self.view_state.show_deletion_timers;
        self.request_render(RenderRequest::Full);
        self.view_state.show_deletion_timers
    }

    /// Runs the filter/sort pipeline over current notes at the current time.
    pub fn view(&self) -> ViewModel {
        compute_view(
            self.store.all(),
            &self.warned,
            &self.view_state,
            self.clock.now_ms(),
            self.config.modified_display_threshold_ms,
        )
    }

    fn set_archived(&mut self, id: NoteId, archived: bool) -> Result<ArchiveOutcome, LifecycleError> {
        let current = self
            .store
            .get(id)
            .map(|note| note.archived)
            .ok_or(LifecycleError::NotFound(id))
            .inspect_err(|_| reject("note_archive", id))?;
        if current == archived {
            debug!(
                "event=note_archive module=lifecycle status=unchanged note_id={} archived={}",
                id, archived
            );
            return Ok(ArchiveOutcome::Unchanged);
        }
        self.apply_archived(id, archived).map(ArchiveOutcome::Changed)
    }

    fn apply_archived(
        &mut self,
        id: NoteId,
        archived: bool,
    ) -> Result<MutationOutcome<Note>, LifecycleError> {
        let now = self.clock.now_ms();
        let lifespan_ms = self.config.lifespan_ms;
        let note = self.store.update(id, |note| {
            note.archived = archived;
            if !archived {
                note.reset_deadline(now, lifespan_ms);
            }
            note.clone()
        })?;

        info!(
            "event=note_archive module=lifecycle status=ok note_id={} archived={}",
            id, archived
        );
        if archived {
            self.gateway.notify(
                "Note Archived",
                &format!(
                    "\"{}\" is now archived and will not be auto-deleted.",
                    note.title
                ),
            );
        } else {
            self.warned.remove(&id);
            self.gateway.notify(
                "Note Unarchived",
                &format!(
                    "\"{}\" is now active. Its deletion timer has been reset to {}.",
                    note.title,
                    describe_duration(lifespan_ms)
                ),
            );
        }
        Ok(self.commit(note, now))
    }

    fn parse_draft(
        &self,
        event: &'static str,
        title: &str,
        content: &str,
        tags_text: &str,
    ) -> Result<NoteDraft, LifecycleError> {
        NoteDraft::parse(title, content, tags_text).map_err(|err| {
            info!(
                "event={} module=lifecycle status=rejected reason={:?}",
                event, err
            );
            LifecycleError::Validation(err)
        })
    }

    fn commit<T>(&mut self, value: T, now: i64) -> MutationOutcome<T> {
        let persist_error = self.store.persist(now).err();
        self.request_render(RenderRequest::Full);
        MutationOutcome {
            value,
            persist_error,
        }
    }

    fn request_render(&mut self, request: RenderRequest) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_render_request(request);
        }
    }
}

fn reject(event: &'static str, id: NoteId) {
    info!(
        "event={} module=lifecycle status=rejected reason=not_found note_id={}",
        event, id
    );
}

/// Human wording for a duration in the largest whole unit.
fn describe_duration(ms: i64) -> String {
    const UNITS: [(i64, &str); 5] = [
        (24 * 60 * 60 * 1000, "day"),
        (60 * 60 * 1000, "hour"),
        (60 * 1000, "minute"),
        (1000, "second"),
        (1, "millisecond"),
    ];
    let (size, unit) = UNITS
        .iter()
        .copied()
        .find(|(size, _)| ms >= *size && ms % size == 0)
        .unwrap_or((1, "millisecond"));
    let count = ms / size;
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}
