//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record and its derived lifecycle status.
//! - Validate and normalize user input before a note is built or edited.
//!
//! # Invariants
//! - `id == created_at` for the whole lifetime of a note.
//! - `title` and `content` built from a `NoteDraft` are trimmed and
//!   non-empty. Records decoded from a snapshot keep their stored text.
//! - `tags` are trimmed and non-empty; order is kept for display only.
//! - While `archived == false`, `deletion_deadline` equals the last reset
//!   time plus the configured lifespan.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Creation timestamp in epoch milliseconds, doubling as the note identity.
pub type NoteId = i64;

/// Thirty days in milliseconds.
pub const NOTE_LIFESPAN_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// Five minutes in milliseconds.
pub const EXPIRATION_WARNING_WINDOW_MS: i64 = 5 * 60 * 1000;

/// Single lifecycle status derived per note.
///
/// `Warned` is never persisted: it is derived from the engine's warned index
/// for the current deadline epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    /// Counting down towards the deadline, no warning emitted yet.
    Active,
    /// Inside the warning window and already warned once.
    Warned,
    /// Exempt from sweep expiration.
    Archived,
}

impl NoteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Warned => "warned",
            Self::Archived => "archived",
        }
    }
}

/// Input validation errors for note create/edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyTitle,
    EmptyContent,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be empty"),
            Self::EmptyContent => write!(f, "note content must not be empty"),
        }
    }
}

impl Error for NoteValidationError {}

/// Canonical note record owned by `NoteStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    /// Equal to `id`; kept as a named field so call sites read naturally.
    pub created_at: i64,
    /// Initialized to `created_at`, moved forward only by edit.
    pub modified_at: i64,
    /// Absolute expiration time in epoch milliseconds.
    pub deletion_deadline: i64,
    pub archived: bool,
}

/// Trimmed, validated fields for a create or edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl NoteDraft {
    /// Normalizes raw user input.
    ///
    /// # Errors
    /// - `EmptyTitle` when `title` is blank after trimming.
    /// - `EmptyContent` when `content` is blank after trimming.
    pub fn parse(
        title: &str,
        content: &str,
        tags_text: &str,
    ) -> Result<Self, NoteValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(NoteValidationError::EmptyTitle);
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(NoteValidationError::EmptyContent);
        }

        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
            tags: parse_tags(tags_text),
        })
    }
}

impl Note {
    /// Builds a fresh, unarchived note created at `id`.
    pub fn from_draft(id: NoteId, draft: NoteDraft, lifespan_ms: i64) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            tags: draft.tags,
            created_at: id,
            modified_at: id,
            deletion_deadline: id.saturating_add(lifespan_ms),
            archived: false,
        }
    }

    /// Overwrites user fields and restarts the lifespan at `now`.
    pub fn apply_edit(&mut self, draft: NoteDraft, now: i64, lifespan_ms: i64) {
        self.title = draft.title;
        self.content = draft.content;
        self.tags = draft.tags;
        self.modified_at = now;
        self.reset_deadline(now, lifespan_ms);
    }

    /// Restarts the lifespan at `now`.
    pub fn reset_deadline(&mut self, now: i64, lifespan_ms: i64) {
        self.deletion_deadline = now.saturating_add(lifespan_ms);
    }

    /// Milliseconds left until the deadline; negative once passed.
    pub fn remaining_ms(&self, now: i64) -> i64 {
        self.deletion_deadline.saturating_sub(now)
    }

    /// Whether the sweep should remove this note at `now`.
    ///
    /// Exactly hitting the deadline counts as expired.
    pub fn is_expired_at(&self, now: i64) -> bool {
        !self.archived && now >= self.deletion_deadline
    }

    /// Whether `now` falls strictly inside the warning window.
    pub fn is_in_warning_window(&self, now: i64, warning_window_ms: i64) -> bool {
        if self.archived {
            return false;
        }
        let remaining = self.remaining_ms(now);
        remaining > 0 && remaining < warning_window_ms
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|value| value == tag)
    }
}

/// Splits comma-separated tag text, trimming and dropping blanks.
pub fn parse_tags(tags_text: &str) -> Vec<String> {
    tags_text
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> NoteDraft {
        NoteDraft::parse(title, "body", "").expect("valid draft")
    }

    #[test]
    fn parse_tags_trims_and_drops_blanks() {
        assert_eq!(parse_tags(" x, y ,,  ,z"), vec!["x", "y", "z"]);
        assert!(parse_tags("   ").is_empty());
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn draft_rejects_blank_title_and_content() {
        assert_eq!(
            NoteDraft::parse("  ", "body", "").unwrap_err(),
            NoteValidationError::EmptyTitle
        );
        assert_eq!(
            NoteDraft::parse("title", "\n\t", "").unwrap_err(),
            NoteValidationError::EmptyContent
        );
    }

    #[test]
    fn draft_trims_fields() {
        let parsed = NoteDraft::parse("  A ", " body\n", "x, y").unwrap();
        assert_eq!(parsed.title, "A");
        assert_eq!(parsed.content, "body");
        assert_eq!(parsed.tags, vec!["x", "y"]);
    }

    #[test]
    fn warning_window_is_strict_on_both_ends() {
        let note = Note::from_draft(0, draft("A"), 1_000_000);
        let window = 300_000;

        assert!(!note.is_in_warning_window(1_000_000 - window, window));
        assert!(note.is_in_warning_window(1_000_000 - window + 1, window));
        assert!(note.is_in_warning_window(999_999, window));
        assert!(!note.is_in_warning_window(1_000_000, window));
    }

    #[test]
    fn deadline_equality_counts_as_expired() {
        let mut note = Note::from_draft(0, draft("A"), 1_000);
        assert!(!note.is_expired_at(999));
        assert!(note.is_expired_at(1_000));

        note.archived = true;
        assert!(!note.is_expired_at(i64::MAX));
        assert!(!note.is_in_warning_window(999, 300_000));
    }
}
