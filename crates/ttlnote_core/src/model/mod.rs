//! Domain model for self-expiring notes.
//!
//! # Responsibility
//! - Define the canonical note record shared by store, engine and views.
//! - Keep input normalization (trim, tag parsing) in one place.
//!
//! # Invariants
//! - Every note is identified by its creation timestamp (`NoteId`).
//! - Notes created or edited through the engine never have an empty title
//!   or content; snapshot records are loaded as written.

pub mod note;
