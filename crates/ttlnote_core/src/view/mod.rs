//! Read-side projection from store contents to presentation-ready views.
//!
//! # Responsibility
//! - Filter by status and tag, then order for display.
//! - Derive per-note display fields (status, countdown, modified line).
//!
//! # Invariants
//! - Nothing here mutates notes or their canonical order.
//! - Sorting is stable, so equal keys keep filter order.

mod pipeline;
mod view_model;

pub use pipeline::{filter_sort, SortOrder, StatusFilter};
pub use view_model::{compute_view, distinct_tags, format_remaining, NoteView, ViewModel, ViewState};
