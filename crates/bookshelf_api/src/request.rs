//! JSON request bodies parsed into catalog candidates.
//!
//! # Responsibility
//! - Turn raw request text into drafts and patches.
//! - Report fields of the wrong JSON type as field violations.
//!
//! # Invariants
//! - Values are never coerced: `"1999"` is not a year, `4.5` is not a rating.
//! - An explicit `null` counts as supplied, so it is validated like a blank.

use bookshelf_core::model::validation::{
    FIELD_AUTHOR, FIELD_BOOK, FIELD_COMMENT, FIELD_PUBLISHED_YEAR, FIELD_RATING, FIELD_TITLE,
};
use bookshelf_core::{BookDraft, BookId, BookPatch, ReviewDraft, ReviewPatch, ValidationErrors};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Request text that cannot be read as candidate fields at all.
#[derive(Debug)]
pub enum RequestError {
    /// Body is not valid JSON.
    MalformedJson(serde_json::Error),
    /// Body is valid JSON but not an object.
    NotAnObject,
}

impl Display for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedJson(err) => write!(f, "malformed JSON body: {err}"),
            Self::NotAnObject => write!(f, "request body must be a JSON object"),
        }
    }
}

impl Error for RequestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedJson(err) => Some(err),
            Self::NotAnObject => None,
        }
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(value: serde_json::Error) -> Self {
        Self::MalformedJson(value)
    }
}

/// A parsed candidate plus the type violations found while reading it.
#[derive(Debug)]
pub struct Parsed<T> {
    pub value: T,
    pub violations: ValidationErrors,
}

/// Review creation request; `book_id` is `None` when not supplied.
#[derive(Debug)]
pub struct ReviewRequest {
    pub book_id: Option<BookId>,
    pub draft: ReviewDraft,
}

pub fn parse_book_draft(body: &str) -> Result<Parsed<BookDraft>, RequestError> {
    let mut reader = FieldReader::new(body)?;
    let value = BookDraft {
        title: reader.text(FIELD_TITLE).unwrap_or_default(),
        author: reader.text(FIELD_AUTHOR).unwrap_or_default(),
        published_year: reader
            .integer(FIELD_PUBLISHED_YEAR, FIELD_PUBLISHED_YEAR, "published year")
            .flatten(),
    };
    Ok(reader.finish(value))
}

pub fn parse_book_patch(body: &str) -> Result<Parsed<BookPatch>, RequestError> {
    let mut reader = FieldReader::new(body)?;
    let title = reader.text(FIELD_TITLE);
    let author = reader.text(FIELD_AUTHOR);
    let supplied_year = reader.integer(FIELD_PUBLISHED_YEAR, FIELD_PUBLISHED_YEAR, "published year");
    let published_year = match supplied_year {
        Some(None) => {
            reader.violate(FIELD_PUBLISHED_YEAR, "published year is required");
            None
        }
        other => other.flatten(),
    };
    Ok(reader.finish(BookPatch {
        title,
        author,
        published_year,
    }))
}

pub fn parse_review_request(body: &str) -> Result<Parsed<ReviewRequest>, RequestError> {
    let mut reader = FieldReader::new(body)?;
    let book_id = reader.integer("book_id", FIELD_BOOK, "book").flatten();
    let draft = ReviewDraft {
        rating: reader.integer(FIELD_RATING, FIELD_RATING, "rating").flatten(),
        comment: reader.text(FIELD_COMMENT).unwrap_or_default(),
    };
    Ok(reader.finish(ReviewRequest { book_id, draft }))
}

/// Parses a review update; `book_id` is ignored because a review never
/// changes its parent.
pub fn parse_review_patch(body: &str) -> Result<Parsed<ReviewPatch>, RequestError> {
    let mut reader = FieldReader::new(body)?;
    let rating = match reader.integer(FIELD_RATING, FIELD_RATING, "rating") {
        Some(None) => {
            reader.violate(FIELD_RATING, "rating is required");
            None
        }
        other => other.flatten(),
    };
    let comment = reader.text(FIELD_COMMENT);
    Ok(reader.finish(ReviewPatch { rating, comment }))
}

struct FieldReader {
    fields: Map<String, Value>,
    violations: ValidationErrors,
}

impl FieldReader {
    fn new(body: &str) -> Result<Self, RequestError> {
        match serde_json::from_str::<Value>(body)? {
            Value::Object(fields) => Ok(Self {
                fields,
                violations: ValidationErrors::new(),
            }),
            _ => Err(RequestError::NotAnObject),
        }
    }

    /// `None` when absent; `null` reads as an empty string.
    fn text(&mut self, field: &'static str) -> Option<String> {
        match self.fields.get(field)? {
            Value::String(value) => Some(value.clone()),
            Value::Null => Some(String::new()),
            _ => {
                self.violate(field, format!("{field} must be a string"));
                Some(String::new())
            }
        }
    }

    /// Outer `None` when absent, inner `None` for `null` or a wrong type.
    /// Type violations are reported under `key`.
    fn integer(&mut self, field: &str, key: &'static str, label: &str) -> Option<Option<i64>> {
        match self.fields.get(field)? {
            Value::Null => Some(None),
            Value::Number(number) => match number.as_i64() {
                Some(value) => Some(Some(value)),
                None => {
                    self.violate(key, format!("{label} must be an integer"));
                    Some(None)
                }
            },
            _ => {
                self.violate(key, format!("{label} must be an integer"));
                Some(None)
            }
        }
    }

    fn violate(&mut self, field: &'static str, message: impl Into<String>) {
        self.violations.add(field, message);
    }

    fn finish<T>(self, value: T) -> Parsed<T> {
        Parsed {
            value,
            violations: self.violations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        parse_book_draft, parse_book_patch, parse_review_patch, parse_review_request,
        RequestError,
    };

    #[test]
    fn book_draft_reads_fields_without_coercion() {
        let parsed =
            parse_book_draft(r#"{"title":"Dune","author":"Herbert","published_year":"1965"}"#)
                .unwrap();

        assert_eq!(parsed.value.title, "Dune");
        assert_eq!(parsed.value.published_year, None);
        assert_eq!(
            parsed.violations.get("published_year"),
            Some("published year must be an integer")
        );
    }

    #[test]
    fn book_patch_keeps_absent_fields_unset() {
        let parsed = parse_book_patch(r#"{"title":"X"}"#).unwrap();

        assert_eq!(parsed.value.title.as_deref(), Some("X"));
        assert_eq!(parsed.value.author, None);
        assert_eq!(parsed.value.published_year, None);
        assert!(parsed.violations.is_empty());
    }

    #[test]
    fn null_in_patch_is_treated_as_supplied() {
        let parsed = parse_book_patch(r#"{"author":null,"published_year":null}"#).unwrap();

        assert_eq!(parsed.value.author.as_deref(), Some(""));
        assert_eq!(
            parsed.violations.get("published_year"),
            Some("published year is required")
        );
    }

    #[test]
    fn review_request_maps_book_id_violations_to_book() {
        let parsed =
            parse_review_request(r#"{"book_id":"one","rating":4.5,"comment":"ok"}"#).unwrap();

        assert_eq!(parsed.value.book_id, None);
        assert_eq!(parsed.value.draft.rating, None);
        assert_eq!(parsed.violations.get("book"), Some("book must be an integer"));
        assert_eq!(
            parsed.violations.get("rating"),
            Some("rating must be an integer")
        );
    }

    #[test]
    fn review_patch_rejects_null_rating() {
        let parsed = parse_review_patch(r#"{"rating":null}"#).unwrap();
        assert_eq!(parsed.violations.get("rating"), Some("rating is required"));
    }

    #[test]
    fn non_object_bodies_are_malformed() {
        assert!(matches!(
            parse_book_draft("[1, 2]"),
            Err(RequestError::NotAnObject)
        ));
        assert!(matches!(
            parse_book_draft("{\"title\":"),
            Err(RequestError::MalformedJson(_))
        ));
    }
}
