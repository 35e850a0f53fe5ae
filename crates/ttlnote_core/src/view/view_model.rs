//! Per-render view model built from the filtered, ordered notes.

use crate::model::note::{Note, NoteId, NoteStatus};
use crate::view::pipeline::{filter_sort, SortOrder, StatusFilter};
use std::collections::HashSet;

/// Presentation-owned view settings, held by the engine between renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub status_filter: StatusFilter,
    /// Exact tag to keep; `None` shows every tag.
    pub tag_filter: Option<String>,
    pub sort_order: SortOrder,
    /// Whether per-note countdowns are rendered.
    pub show_deletion_timers: bool,
}

/// One rendered note row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteView {
    pub note: Note,
    pub status: NoteStatus,
    /// Milliseconds until the deadline; negative once passed.
    pub remaining_ms: i64,
    /// `HH:MM:SS` countdown; `None` when timers are hidden or archived.
    pub timer_text: Option<String>,
    /// Whether a "Modified" line is worth showing.
    pub show_modified: bool,
}

/// Everything a presentation layer needs for one full render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub items: Vec<NoteView>,
    /// Tag filter choices across all notes, first-seen order.
    pub tags: Vec<String>,
    pub state: ViewState,
}

impl ViewModel {
    /// Whether the placeholder should be shown instead of a list.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Builds the view for `notes` (canonical order) under `state` at `now`.
///
/// `warned` is the engine's warned index for the current deadline epochs.
/// `modified_threshold_ms` de-noises the "Modified" line: it shows only when
/// `modified_at > created_at + modified_threshold_ms`.
pub fn compute_view(
    notes: &[Note],
    warned: &HashSet<NoteId>,
    state: &ViewState,
    now: i64,
    modified_threshold_ms: i64,
) -> ViewModel {
    let items = filter_sort(
        notes,
        state.status_filter,
        state.tag_filter.as_deref(),
        state.sort_order,
    )
    .into_iter()
    .map(|note| {
        let status = if note.archived {
            NoteStatus::Archived
        } else if warned.contains(&note.id) {
            NoteStatus::Warned
        } else {
            NoteStatus::Active
        };
        let remaining_ms = note.remaining_ms(now);
        let timer_text = (state.show_deletion_timers && !note.archived)
            .then(|| format_remaining(remaining_ms));

        NoteView {
            note: note.clone(),
            status,
            remaining_ms,
            timer_text,
            show_modified: note.modified_at > note.created_at.saturating_add(modified_threshold_ms),
        }
    })
    .collect();

    ViewModel {
        items,
        tags: distinct_tags(notes),
        state: state.clone(),
    }
}

/// Distinct tags across `notes` in first-seen order.
pub fn distinct_tags(notes: &[Note]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    notes
        .iter()
        .flat_map(|note| note.tags.iter())
        .filter(|tag| seen.insert(tag.as_str()))
        .cloned()
        .collect()
}

/// Formats a countdown as `HH:MM:SS`; negative values read as zero.
///
/// Hours are not wrapped, so a 30-day countdown reads `720:00:00`.
pub fn format_remaining(remaining_ms: i64) -> String {
    let total_seconds = remaining_ms.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::{compute_view, distinct_tags, format_remaining, ViewState};
    use crate::model::note::{Note, NoteStatus};
    use crate::view::pipeline::{SortOrder, StatusFilter};
    use std::collections::HashSet;

    fn note(id: i64, modified_at: i64, archived: bool, tags: &[&str]) -> Note {
        Note {
            id,
            title: format!("note {id}"),
            content: "c".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: id,
            modified_at,
            deletion_deadline: id + 10_000,
            archived,
        }
    }

    #[test]
    fn format_remaining_pads_and_clamps() {
        assert_eq!(format_remaining(0), "00:00:00");
        assert_eq!(format_remaining(-5_000), "00:00:00");
        assert_eq!(format_remaining(3_723_999), "01:02:03");
        assert_eq!(format_remaining(2_592_000_000), "720:00:00");
    }

    #[test]
    fn distinct_tags_dedupes_in_first_seen_order() {
        let notes = vec![note(1, 1, false, &["b", "a"]), note(2, 2, true, &["a", "c"])];
        assert_eq!(distinct_tags(&notes), vec!["b", "a", "c"]);
    }

    #[test]
    fn view_derives_status_and_timer_fields() {
        let notes = vec![
            note(1, 1, false, &["work"]),
            note(2, 2, false, &[]),
            note(3, 3, true, &["work"]),
        ];
        let warned: HashSet<i64> = [2].into_iter().collect();
        let state = ViewState {
            status_filter: StatusFilter::All,
            tag_filter: None,
            sort_order: SortOrder::CreatedAsc,
            show_deletion_timers: true,
        };

        let view = compute_view(&notes, &warned, &state, 5_001, 1_000);
        let statuses: Vec<NoteStatus> = view.items.iter().map(|item| item.status).collect();
        assert_eq!(
            statuses,
            vec![NoteStatus::Active, NoteStatus::Warned, NoteStatus::Archived]
        );
        assert_eq!(view.items[0].remaining_ms, 5_000);
        assert_eq!(view.items[0].timer_text.as_deref(), Some("00:00:05"));
        assert_eq!(view.items[2].timer_text, None);
        assert_eq!(view.tags, vec!["work"]);
        assert_eq!(view.state, state);
    }

    #[test]
    fn hidden_timers_produce_no_text() {
        let notes = vec![note(1, 1, false, &[])];
        let view = compute_view(&notes, &HashSet::new(), &ViewState::default(), 2, 1_000);
        assert_eq!(view.items[0].timer_text, None);
    }

    #[test]
    fn modified_line_needs_more_than_threshold() {
        let notes = vec![note(1_000, 2_000, false, &[]), note(5_000, 6_001, false, &[])];
        let state = ViewState {
            sort_order: SortOrder::CreatedAsc,
            ..ViewState::default()
        };
        let view = compute_view(&notes, &HashSet::new(), &state, 0, 1_000);
        assert!(!view.items[0].show_modified);
        assert!(view.items[1].show_modified);
    }

    #[test]
    fn tag_filter_keeps_exact_matches_and_empty_view_is_flagged() {
        let notes = vec![note(1, 1, false, &["Work"]), note(2, 2, false, &["work"])];
        let state = ViewState {
            tag_filter: Some("work".to_string()),
            ..ViewState::default()
        };
        let view = compute_view(&notes, &HashSet::new(), &state, 0, 1_000);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].note.id, 2);

        let none = ViewState {
            tag_filter: Some("missing".to_string()),
            ..ViewState::default()
        };
        assert!(compute_view(&notes, &HashSet::new(), &none, 0, 1_000).is_empty());
    }
}
