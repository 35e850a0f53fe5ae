#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use ttlnote_core::repo::snapshot_repo::{RepoError, RepoResult, SnapshotRepository};
use ttlnote_core::{
    CoreConfig, LifecycleEngine, ManualClock, NoteStore, NotificationBackend,
    NotificationGateway, PermissionState,
};

pub const START_MS: i64 = 1_700_000_000_000;

/// Granted backend that records every dispatched notification.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    pub shown: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingBackend {
    pub fn titles(&self) -> Vec<String> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .map(|(title, _)| title.clone())
            .collect()
    }

    pub fn last_body(&self) -> Option<String> {
        self.shown.lock().unwrap().last().map(|(_, body)| body.clone())
    }

    pub fn clear(&self) {
        self.shown.lock().unwrap().clear();
    }
}

impl NotificationBackend for RecordingBackend {
    fn initial_permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn prompt_permission(&mut self) -> PermissionState {
        PermissionState::Granted
    }

    fn dispatch(&mut self, title: &str, body: &str) {
        self.shown
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
    }
}

/// In-memory snapshot slots with switchable write failures.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    pub slots: Arc<Mutex<HashMap<String, String>>>,
    pub fail_writes: Arc<AtomicBool>,
    pub writes: Arc<AtomicUsize>,
}

impl MemoryRepository {
    pub fn with_payload(key: &str, payload: &str) -> Self {
        let repo = Self::default();
        repo.slots
            .lock()
            .unwrap()
            .insert(key.to_string(), payload.to_string());
        repo
    }

    pub fn payload(&self, key: &str) -> Option<String> {
        self.slots.lock().unwrap().get(key).cloned()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl SnapshotRepository for MemoryRepository {
    fn read_snapshot(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.payload(key))
    }

    fn write_snapshot(&mut self, key: &str, payload: &str, _written_at: i64) -> RepoResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepoError::MissingRequiredTable("snapshots"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.slots
            .lock()
            .unwrap()
            .insert(key.to_string(), payload.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub engine: LifecycleEngine,
    pub clock: ManualClock,
    pub notices: RecordingBackend,
    pub repo: MemoryRepository,
}

pub fn harness() -> Harness {
    harness_with_repo(MemoryRepository::default())
}

pub fn harness_with_repo(repo: MemoryRepository) -> Harness {
    let clock = ManualClock::new(START_MS);
    let notices = RecordingBackend::default();
    let config = CoreConfig::default();
    let store = NoteStore::load(
        Box::new(repo.clone()),
        config.snapshot_key.clone(),
        START_MS + config.lifespan_ms,
    )
    .unwrap();
    let engine = LifecycleEngine::new(
        store,
        NotificationGateway::new(Box::new(notices.clone())),
        Arc::new(clock.clone()),
        config,
    );
    Harness {
        engine,
        clock,
        notices,
        repo,
    }
}
