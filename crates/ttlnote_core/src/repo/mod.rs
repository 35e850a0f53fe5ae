//! Repository layer for persisted snapshots.
//!
//! # Responsibility
//! - Define the storage contract the note store persists through.
//! - Keep SQL details out of store and engine code.
//!
//! # Invariants
//! - A snapshot write replaces the whole payload for its key or leaves the
//!   previous payload untouched.

pub mod snapshot_repo;
