//! Canonical in-memory note collection and its persisted snapshot.
//!
//! # Responsibility
//! - Own every `Note`; nothing outside this module mutates one directly.
//! - Encode/decode the snapshot wire format.
//!
//! # Invariants
//! - In-memory order is ascending by `id` (canonical order).
//! - The in-memory collection stays authoritative when a write fails.

mod note_store;
pub mod snapshot;

pub use note_store::{NoteStore, PersistenceError, StoreError};
