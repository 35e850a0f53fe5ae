//! Lifecycle use-case services.
//!
//! # Responsibility
//! - Own every note state transition and the periodic expiration sweep.
//! - Drive the sweep on a cancellable schedule.
//!
//! # Invariants
//! - Exactly one operation (mutation, sweep tick or view pass) runs at a
//!   time against an engine.
//! - Every state change is followed by a whole-snapshot persist attempt.

pub mod lifecycle;
pub mod scheduler;
