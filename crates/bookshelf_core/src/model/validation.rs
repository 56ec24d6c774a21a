//! Field-level validation rules for books and reviews.
//!
//! # Responsibility
//! - Check candidate field sets before they reach storage.
//! - Report every violation at once, keyed by wire field name.
//!
//! # Invariants
//! - Checks are pure: no I/O, no clamping, no coercion of input values.
//! - At most one message is kept per field; the first rule to fail wins.

use serde::Serialize;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const FIELD_TITLE: &str = "title";
pub const FIELD_AUTHOR: &str = "author";
pub const FIELD_PUBLISHED_YEAR: &str = "published_year";
pub const FIELD_BOOK: &str = "book";
pub const FIELD_RATING: &str = "rating";
pub const FIELD_COMMENT: &str = "comment";

/// Lowest accepted review rating.
pub const RATING_MIN: i64 = 1;
/// Highest accepted review rating.
pub const RATING_MAX: i64 = 5;

/// Set of field violations, ordered by field name.
///
/// Serializes as a flat `{field: message}` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    violations: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation unless `field` already has one.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.violations
            .entry(field)
            .or_insert_with(|| message.into());
    }

    /// Folds another violation set into this one.
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, message) in other.violations {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.violations.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.violations.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, &'static str, String> {
        self.violations.iter()
    }

    /// `Ok(())` when no violation was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "no validation errors");
        }
        let mut first = true;
        for (field, message) in &self.violations {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = (&'a &'static str, &'a String);
    type IntoIter = btree_map::Iter<'a, &'static str, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Candidate book state, as seen by the rules.
#[derive(Debug, Clone, Copy)]
pub struct BookFields<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub published_year: Option<i64>,
}

/// Parent reference of a candidate review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookRef {
    /// No book id was supplied.
    Missing,
    /// A book id was supplied but no such book is stored.
    Dangling(i64),
    /// The id resolves to a stored book.
    Existing(i64),
}

/// Candidate review state, as seen by the rules.
#[derive(Debug, Clone, Copy)]
pub struct ReviewFields<'a> {
    pub book: BookRef,
    pub rating: Option<i64>,
    pub comment: &'a str,
}

/// Checks title, author and publication year.
pub fn check_book(candidate: &BookFields<'_>) -> ValidationErrors {
    let mut errors = check_book_patch(Some(candidate.title), Some(candidate.author));
    if candidate.published_year.is_none() {
        errors.add(FIELD_PUBLISHED_YEAR, "published year is required");
    }
    errors
}

/// Checks the text fields a partial book update supplies.
pub fn check_book_patch(title: Option<&str>, author: Option<&str>) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if title.is_some_and(is_blank) {
        errors.add(FIELD_TITLE, "title is required");
    }
    if author.is_some_and(is_blank) {
        errors.add(FIELD_AUTHOR, "author is required");
    }
    errors
}

/// Checks parent reference, rating range and comment.
pub fn check_review(candidate: &ReviewFields<'_>) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    match candidate.book {
        BookRef::Missing => errors.add(FIELD_BOOK, "book is required"),
        BookRef::Dangling(id) => errors.add(FIELD_BOOK, format!("book {id} does not exist")),
        BookRef::Existing(_) => {}
    }
    if candidate.rating.is_none() {
        errors.add(FIELD_RATING, "rating is required");
    }
    errors.merge(check_review_patch(candidate.rating, Some(candidate.comment)));
    errors
}

/// Checks the rating and comment a partial review update supplies.
pub fn check_review_patch(rating: Option<i64>, comment: Option<&str>) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if rating.is_some_and(|rating| !is_valid_rating(rating)) {
        errors.add(
            FIELD_RATING,
            format!("rating must be between {RATING_MIN} and {RATING_MAX}"),
        );
    }
    if comment.is_some_and(is_blank) {
        errors.add(FIELD_COMMENT, "comment must not be blank");
    }
    errors
}

pub fn is_valid_rating(rating: i64) -> bool {
    (RATING_MIN..=RATING_MAX).contains(&rating)
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::{
        check_book, check_book_patch, check_review, check_review_patch, BookFields, BookRef, ReviewFields, ValidationErrors,
        FIELD_AUTHOR, FIELD_BOOK, FIELD_COMMENT, FIELD_PUBLISHED_YEAR, FIELD_RATING, FIELD_TITLE,
    };

    #[test]
    fn valid_book_has_no_violations() {
        let errors = check_book(&BookFields {
            title: "Refactoring",
            author: "Martin Fowler",
            published_year: Some(1999),
        });
        assert!(errors.is_empty());
    }

    #[test]
    fn book_reports_all_violations_together() {
        let errors = check_book(&BookFields {
            title: "   ",
            author: "",
            published_year: None,
        });
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(FIELD_TITLE));
        assert!(errors.contains(FIELD_AUTHOR));
        assert!(errors.contains(FIELD_PUBLISHED_YEAR));
    }

    #[test]
    fn rating_bounds_are_inclusive() {
        for rating in 1..=5 {
            let errors = check_review(&ReviewFields {
                book: BookRef::Existing(1),
                rating: Some(rating),
                comment: "ok",
            });
            assert!(errors.is_empty(), "rating {rating} should be accepted");
        }

        for rating in [0, 6, -1] {
            let errors = check_review(&ReviewFields {
                book: BookRef::Existing(1),
                rating: Some(rating),
                comment: "ok",
            });
            assert!(errors.contains(FIELD_RATING), "rating {rating} should fail");
        }
    }

    #[test]
    fn review_reports_missing_and_dangling_book() {
        let missing = check_review(&ReviewFields {
            book: BookRef::Missing,
            rating: None,
            comment: "\n",
        });
        assert_eq!(missing.get(FIELD_BOOK), Some("book is required"));
        assert!(missing.contains(FIELD_RATING));
        assert!(missing.contains(FIELD_COMMENT));

        let dangling = check_review(&ReviewFields {
            book: BookRef::Dangling(42),
            rating: Some(3),
            comment: "fine",
        });
        assert_eq!(dangling.get(FIELD_BOOK), Some("book 42 does not exist"));
        assert_eq!(dangling.len(), 1);
    }

    #[test]
    fn first_message_per_field_wins_and_merge_keeps_it() {
        let mut errors = ValidationErrors::new();
        errors.add(FIELD_RATING, "rating must be an integer");
        errors.add(FIELD_RATING, "rating is required");

        let mut other = ValidationErrors::new();
        other.add(FIELD_RATING, "ignored");
        other.add(FIELD_COMMENT, "comment must not be blank");
        errors.merge(other);

        assert_eq!(errors.get(FIELD_RATING), Some("rating must be an integer"));
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            "comment: comment must not be blank; rating: rating must be an integer"
        );
    }

    #[test]
    fn patch_checks_skip_absent_fields() {
        assert!(check_book_patch(None, None).is_empty());
        assert!(check_review_patch(None, None).is_empty());

        let book = check_book_patch(Some(""), None);
        assert!(book.contains(FIELD_TITLE));
        assert!(!book.contains(FIELD_AUTHOR));

        let review = check_review_patch(Some(0), Some("fine"));
        assert!(review.contains(FIELD_RATING));
        assert!(!review.contains(FIELD_COMMENT));
    }
}
