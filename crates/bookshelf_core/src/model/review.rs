//! Review entity, draft and partial-update shapes.
//!
//! # Responsibility
//! - Model one rating + comment owned by a single book.
//! - Stamp the creation time once, when a draft is bound to its book.
//!
//! # Invariants
//! - `rating` stays within `RATING_MIN..=RATING_MAX`.
//! - `created_at` and the parent book never change through updates.
//! - Timestamps are Unix epoch milliseconds (UTC).

use crate::model::book::{Book, BookId};
use crate::model::validation::{
    check_review, check_review_patch, is_valid_rating, BookRef, ReviewFields, ValidationErrors,
    FIELD_RATING, RATING_MAX, RATING_MIN,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Storage-assigned review identity.
pub type ReviewId = i64;

/// Wire format for review timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Review fields supplied by a caller before any identity exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDraft {
    pub rating: Option<i64>,
    pub comment: String,
}

/// Validated review bound to its book, waiting for a storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview<'a> {
    pub book_id: BookId,
    pub rating: u8,
    pub comment: &'a str,
    pub created_at: i64,
}

impl ReviewDraft {
    pub fn new(rating: i64, comment: impl Into<String>) -> Self {
        Self {
            rating: Some(rating),
            comment: comment.into(),
        }
    }

    /// Checks the draft against the given parent reference.
    pub fn validate_for(&self, book: BookRef) -> Result<(), ValidationErrors> {
        check_review(&ReviewFields {
            book,
            rating: self.rating,
            comment: &self.comment,
        })
        .into_result()
    }

    /// Validates the draft against `book`, stamps `created_at` with the
    /// current time, stores it through `store`, and attaches the resulting
    /// review to `book`.
    ///
    /// `store` is never invoked for an invalid draft.
    pub fn promote<E>(
        &self,
        book: &mut Book,
        store: impl FnOnce(&NewReview<'_>) -> Result<ReviewId, E>,
    ) -> Result<Review, E>
    where
        E: From<ValidationErrors>,
    {
        self.validate_for(BookRef::Existing(book.id()))?;
        let rating = checked_rating(self.rating)?;
        let pending = NewReview {
            book_id: book.id(),
            rating,
            comment: &self.comment,
            created_at: now_epoch_ms(),
        };
        let id = store(&pending)?;

        let mut review = Review {
            id,
            book_id: None,
            rating,
            comment: self.comment.clone(),
            created_at: pending.created_at,
        };
        book.add_review(&mut review);
        Ok(review)
    }
}

/// Partial update: `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPatch {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

impl ReviewPatch {
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.comment.is_none()
    }

    /// Checks only the supplied fields; absent fields are always valid.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        check_review_patch(self.rating, self.comment.as_deref()).into_result()
    }
}

/// Stored review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    id: ReviewId,
    book_id: Option<BookId>,
    rating: u8,
    comment: String,
    #[serde(serialize_with = "serialize_timestamp")]
    created_at: i64,
}

impl Review {
    /// Rebuilds a review from persisted state.
    pub(crate) fn from_stored(
        id: ReviewId,
        book_id: Option<BookId>,
        rating: u8,
        comment: String,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            book_id,
            rating,
            comment,
            created_at,
        }
    }

    pub fn id(&self) -> ReviewId {
        self.id
    }

    /// Parent book, or `None` once detached from it.
    pub fn book_id(&self) -> Option<BookId> {
        self.book_id
    }

    pub fn is_detached(&self) -> bool {
        self.book_id.is_none()
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// `created_at` rendered as `YYYY-MM-DD HH:MM:SS` (UTC).
    pub fn created_at_text(&self) -> String {
        format_timestamp(self.created_at)
    }

    /// Rejects ratings outside `RATING_MIN..=RATING_MAX` without changing state.
    pub fn set_rating(&mut self, rating: i64) -> Result<(), ValidationErrors> {
        self.rating = checked_rating(Some(rating))?;
        Ok(())
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    /// Applies the fields present in `patch` after checking the merged state.
    ///
    /// On error the review is left untouched.
    pub fn apply(&mut self, patch: &ReviewPatch) -> Result<(), ValidationErrors> {
        let rating = patch.rating.unwrap_or(i64::from(self.rating));
        let comment = patch.comment.as_deref().unwrap_or(&self.comment);
        let book = match self.book_id {
            Some(id) => BookRef::Existing(id),
            None => BookRef::Missing,
        };
        check_review(&ReviewFields {
            book,
            rating: Some(rating),
            comment,
        })
        .into_result()?;

        self.set_rating(rating)?;
        if let Some(comment) = &patch.comment {
            self.set_comment(comment.as_str());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let book = match self.book_id {
            Some(id) => BookRef::Existing(id),
            None => BookRef::Missing,
        };
        check_review(&ReviewFields {
            book,
            rating: Some(i64::from(self.rating)),
            comment: &self.comment,
        })
        .into_result()
    }

    pub(crate) fn attach_to(&mut self, book_id: BookId) {
        self.book_id = Some(book_id);
    }

    pub(crate) fn detach(&mut self) {
        self.book_id = None;
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Renders epoch milliseconds as `YYYY-MM-DD HH:MM:SS` (UTC).
///
/// Values outside chrono's range fall back to the raw number.
pub fn format_timestamp(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|value| value.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| epoch_ms.to_string())
}

fn serialize_timestamp<S: Serializer>(epoch_ms: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(*epoch_ms))
}

fn checked_rating(rating: Option<i64>) -> Result<u8, ValidationErrors> {
    rating
        .filter(|value| is_valid_rating(*value))
        .and_then(|value| u8::try_from(value).ok())
        .ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.add(
                FIELD_RATING,
                format!("rating must be between {RATING_MIN} and {RATING_MAX}"),
            );
            errors
        })
}
