//! crates/doodle_notes_core/src/pagination.rs
//!
//! Page/limit handling shared by every note listing.

use crate::domain::Note;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 5;

/// A validated page request. Both fields are always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Zero values fall back to the defaults.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: if page == 0 { DEFAULT_PAGE } else { page },
            limit: if limit == 0 { DEFAULT_LIMIT } else { limit },
        }
    }

    /// Builds a page request from raw query-string values. Only the leading
    /// digits count, so `"2abc"` and `"2.5"` both mean 2. Missing, non-numeric,
    /// zero and negative values fall back to the defaults instead of failing.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        Self::new(leading_number(page), leading_number(limit))
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of notes before this page: `(page - 1) * limit`.
    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    pub fn take(&self) -> u64 {
        u64::from(self.limit)
    }
}

/// 0 when there is no usable number (or it does not fit in a `u32`).
fn leading_number(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else { return 0 };
    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    unsigned[..end].parse().unwrap_or(0)
}

/// One page of a note listing plus enough context to page through the rest.
#[derive(Debug, Clone)]
pub struct NotePage {
    pub notes: Vec<Note>,
    pub page: u32,
    pub limit: u32,
    /// Number of notes matching the listing across all pages.
    pub total: u64,
}

impl NotePage {
    pub fn has_more(&self) -> bool {
        let seen = u64::from(self.page.saturating_sub(1)) * u64::from(self.limit) + self.notes.len() as u64;
        seen < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_garbage_values_use_defaults() {
        assert_eq!(Pagination::from_query(None, None), Pagination::default());
        assert_eq!(
            Pagination::from_query(Some("abc"), Some("")),
            Pagination::new(DEFAULT_PAGE, DEFAULT_LIMIT)
        );
        assert_eq!(Pagination::from_query(Some("-2"), Some("0")), Pagination::default());
    }

    #[test]
    fn numeric_values_are_kept() {
        let p = Pagination::from_query(Some("2"), Some(" 5 "));
        assert_eq!(p.page(), 2);
        assert_eq!(p.limit(), 5);
        assert_eq!(p.skip(), 5);
        assert_eq!(p.take(), 5);
    }

    #[test]
    fn trailing_junk_after_digits_is_ignored() {
        let p = Pagination::from_query(Some("2abc"), Some("2.5"));
        assert_eq!(p.page(), 2);
        assert_eq!(p.limit(), 2);

        let p = Pagination::from_query(Some("+3"), Some("10 notes"));
        assert_eq!(p.page(), 3);
        assert_eq!(p.limit(), 10);

        // a leading sign other than '+' or a leading dot leaves no digits
        assert_eq!(Pagination::from_query(Some("-3x"), Some(".5")), Pagination::default());
        assert_eq!(
            Pagination::from_query(Some("99999999999"), None),
            Pagination::default()
        );
    }

    #[test]
    fn skip_does_not_overflow_on_huge_pages() {
        let p = Pagination::new(u32::MAX, u32::MAX);
        assert_eq!(p.skip(), u64::from(u32::MAX - 1) * u64::from(u32::MAX));
    }

    #[test]
    fn has_more_tracks_the_total() {
        let page = NotePage {
            notes: Vec::new(),
            page: 3,
            limit: 5,
            total: 7,
        };
        assert!(!page.has_more());

        let page = NotePage {
            notes: Vec::new(),
            page: 1,
            limit: 5,
            total: 7,
        };
        assert!(page.has_more());
    }
}
