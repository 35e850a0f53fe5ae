//! Core logic for self-expiring notes.
//! Notes live for a fixed lifespan after their last reset unless archived;
//! this crate owns that lifecycle, its persistence and the derived views.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod store;
pub mod view;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{
    Note, NoteDraft, NoteId, NoteStatus, NoteValidationError, EXPIRATION_WARNING_WINDOW_MS,
    NOTE_LIFESPAN_MS,
};
pub use notify::{
    LogNotificationBackend, NotificationBackend, NotificationGateway, PermissionState,
    UnsupportedBackend,
};
pub use repo::snapshot_repo::{
    RepoError, RepoResult, SnapshotRepository, SqliteSnapshotRepository,
};
pub use service::lifecycle::{
    ArchiveOutcome, EngineInitError, LifecycleEngine, LifecycleError, MutationOutcome,
    RenderListener, RenderRequest, SweepReport,
};
pub use service::scheduler::{lock_engine, share_engine, start_sweeper, SharedEngine, SweepHandle};
pub use store::{NoteStore, PersistenceError, StoreError};
pub use view::{NoteView, SortOrder, StatusFilter, ViewModel, ViewState};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
