//! Status/tag filtering and display ordering of notes.

use crate::model::note::Note;
use feruca::Collator;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Which lifecycle bucket a view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Non-archived notes.
    #[default]
    Active,
    Archived,
    All,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
            Self::All => "all",
        }
    }

    /// Parses a UI key; unknown keys yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub fn matches(self, note: &Note) -> bool {
        match self {
            Self::Active => !note.archived,
            Self::Archived => note.archived,
            Self::All => true,
        }
    }
}

impl Display for StatusFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display order of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    CreatedAsc,
    CreatedDesc,
    TitleAsc,
    TitleDesc,
    /// Most recently modified first.
    #[default]
    ModifiedDesc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAsc => "created-asc",
            Self::CreatedDesc => "created-desc",
            Self::TitleAsc => "title-asc",
            Self::TitleDesc => "title-desc",
            Self::ModifiedDesc => "modified-desc",
        }
    }

    /// Parses a UI key; anything unrecognized falls back to `ModifiedDesc`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "created-asc" => Self::CreatedAsc,
            "created-desc" => Self::CreatedDesc,
            "title-asc" => Self::TitleAsc,
            "title-desc" => Self::TitleDesc,
            _ => Self::ModifiedDesc,
        }
    }

    fn compare(self, collator: &mut Collator, a: &Note, b: &Note) -> Ordering {
        match self {
            Self::CreatedAsc => a.id.cmp(&b.id),
            Self::CreatedDesc => b.id.cmp(&a.id),
            Self::TitleAsc => compare_titles(collator, &a.title, &b.title),
            Self::TitleDesc => compare_titles(collator, &b.title, &a.title),
            Self::ModifiedDesc => b.modified_at.cmp(&a.modified_at),
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters `notes` by status and exact tag, then stably sorts a copy.
pub fn filter_sort<'a>(
    notes: &'a [Note],
    status: StatusFilter,
    tag: Option<&str>,
    order: SortOrder,
) -> Vec<&'a Note> {
    let mut selected: Vec<&Note> = notes
        .iter()
        .filter(|note| status.matches(note))
        .filter(|note| tag.map_or(true, |wanted| note.has_tag(wanted)))
        .collect();
    let mut collator = Collator::default();
    selected.sort_by(|a, b| order.compare(&mut collator, a, b));
    selected
}

// CLDR root collation; the collator's byte tie-break keeps distinct titles
// strictly ordered.
fn compare_titles(collator: &mut Collator, a: &str, b: &str) -> Ordering {
    collator.collate(a, b)
}

#[cfg(test)]
mod tests {
    use super::{compare_titles, filter_sort, SortOrder, StatusFilter};
    use crate::model::note::Note;
    use feruca::Collator;
    use std::cmp::Ordering;

    fn note(id: i64, title: &str, modified_at: i64, archived: bool, tags: &[&str]) -> Note {
        Note {
            id,
            title: title.to_string(),
            content: "c".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: id,
            modified_at,
            deletion_deadline: id + 1_000,
            archived,
        }
    }

    fn ids(notes: &[&Note]) -> Vec<i64> {
        notes.iter().map(|n| n.id).collect()
    }

    #[test]
    fn keys_round_trip_and_unknown_sort_falls_back() {
        for order in [
            SortOrder::CreatedAsc,
            SortOrder::CreatedDesc,
            SortOrder::TitleAsc,
            SortOrder::TitleDesc,
            SortOrder::ModifiedDesc,
        ] {
            assert_eq!(SortOrder::parse(order.as_str()), order);
        }
        assert_eq!(SortOrder::parse("random"), SortOrder::ModifiedDesc);
        assert_eq!(StatusFilter::parse("archived"), Some(StatusFilter::Archived));
        assert_eq!(StatusFilter::parse("trash"), None);
        assert_eq!(SortOrder::default(), SortOrder::ModifiedDesc);
        assert_eq!(StatusFilter::default(), StatusFilter::Active);
    }

    #[test]
    fn status_filter_selects_bucket() {
        let notes = vec![
            note(1, "a", 1, false, &[]),
            note(2, "b", 2, true, &[]),
            note(3, "c", 3, false, &[]),
        ];
        let active = filter_sort(&notes, StatusFilter::Active, None, SortOrder::CreatedAsc);
        let archived = filter_sort(&notes, StatusFilter::Archived, None, SortOrder::CreatedAsc);
        let all = filter_sort(&notes, StatusFilter::All, None, SortOrder::CreatedAsc);
        assert_eq!(ids(&active), vec![1, 3]);
        assert_eq!(ids(&archived), vec![2]);
        assert_eq!(ids(&all), vec![1, 2, 3]);
    }

    #[test]
    fn modified_desc_is_default_order() {
        let notes = vec![
            note(1, "a", 50, false, &[]),
            note(2, "b", 70, false, &[]),
            note(3, "c", 60, false, &[]),
        ];
        let sorted = filter_sort(&notes, StatusFilter::All, None, SortOrder::default());
        assert_eq!(ids(&sorted), vec![2, 3, 1]);
    }

    #[test]
    fn title_sort_is_case_insensitive_and_stable_for_equal_titles() {
        let notes = vec![
            note(1, "beta", 1, false, &[]),
            note(2, "Alpha", 2, false, &[]),
            note(3, "same", 3, false, &[]),
            note(4, "same", 4, false, &[]),
            note(5, "alpha2", 5, false, &[]),
        ];
        let asc = filter_sort(&notes, StatusFilter::All, None, SortOrder::TitleAsc);
        assert_eq!(ids(&asc), vec![2, 5, 1, 3, 4]);
        let desc = filter_sort(&notes, StatusFilter::All, None, SortOrder::TitleDesc);
        assert_eq!(ids(&desc), vec![3, 4, 1, 5, 2]);
    }

    #[test]
    fn compare_titles_orders_case_variants_deterministically() {
        let mut collator = Collator::default();
        assert_eq!(compare_titles(&mut collator, "apple", "Apple"), Ordering::Less);
        assert_eq!(compare_titles(&mut collator, "Apple", "banana"), Ordering::Less);
        assert_eq!(compare_titles(&mut collator, "x", "x"), Ordering::Equal);
    }

    #[test]
    fn accented_titles_sort_beside_their_base_letters() {
        let notes = vec![
            note(1, "Zebra", 1, false, &[]),
            note(2, "Éclair", 2, false, &[]),
            note(3, "apple", 3, false, &[]),
            note(4, "eclair", 4, false, &[]),
        ];
        let asc = filter_sort(&notes, StatusFilter::All, None, SortOrder::TitleAsc);
        let titles: Vec<&str> = asc.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["apple", "eclair", "Éclair", "Zebra"]);

        let desc = filter_sort(&notes, StatusFilter::All, None, SortOrder::TitleDesc);
        assert_eq!(ids(&desc), vec![1, 2, 4, 3]);
    }

    #[test]
    fn input_slice_is_left_untouched() {
        let notes = vec![note(2, "b", 1, false, &[]), note(1, "a", 2, false, &[])];
        let before = notes.clone();
        let _ = filter_sort(&notes, StatusFilter::All, None, SortOrder::CreatedAsc);
        assert_eq!(notes, before);
    }
}
