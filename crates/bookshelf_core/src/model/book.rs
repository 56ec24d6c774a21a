//! Book entity, draft and partial-update shapes.
//!
//! # Responsibility
//! - Model a catalog item and the ids of the reviews it owns.
//! - Run the add/remove protocol that keeps review back-references in step.
//!
//! # Invariants
//! - `id` is assigned by storage and never changes afterwards.
//! - `reviews` holds each review id at most once.
//! - A review's `book_id` is only touched through `add_review`/`remove_review`.

use crate::model::review::{Review, ReviewId};
use crate::model::validation::{check_book, check_book_patch, BookFields, ValidationErrors};
use serde::{Deserialize, Serialize};

/// Storage-assigned book identity.
pub type BookId = i64;

/// Book fields supplied by a caller before any identity exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    /// Optional so that an absent year surfaces as a violation, not a default.
    pub published_year: Option<i64>,
}

impl BookDraft {
    pub fn new(title: impl Into<String>, author: impl Into<String>, published_year: i64) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            published_year: Some(published_year),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        check_book(&BookFields {
            title: &self.title,
            author: &self.author,
            published_year: self.published_year,
        })
        .into_result()
    }

    /// Validates the draft, hands its fields to `store`, and wraps the id
    /// returned by `store` into a `Book` with no reviews.
    ///
    /// `store` is never invoked for an invalid draft.
    pub fn promote<E>(
        &self,
        store: impl FnOnce(&str, &str, i64) -> Result<BookId, E>,
    ) -> Result<Book, E>
    where
        E: From<ValidationErrors>,
    {
        self.validate()?;
        let published_year = self.published_year.ok_or_else(ValidationErrors::new)?;
        let id = store(&self.title, &self.author, published_year)?;
        Ok(Book {
            id,
            title: self.title.clone(),
            author: self.author.clone(),
            published_year,
            reviews: Vec::new(),
        })
    }
}

/// Partial update: `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_year: Option<i64>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.published_year.is_none()
    }

    /// Checks only the supplied fields; absent fields are always valid.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        check_book_patch(self.title.as_deref(), self.author.as_deref()).into_result()
    }
}

/// Stored catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    id: BookId,
    title: String,
    author: String,
    published_year: i64,
    #[serde(rename = "review_ids")]
    reviews: Vec<ReviewId>,
}

impl Book {
    /// Rebuilds a book from persisted state.
    pub(crate) fn from_stored(
        id: BookId,
        title: String,
        author: String,
        published_year: i64,
        reviews: Vec<ReviewId>,
    ) -> Self {
        Self {
            id,
            title,
            author,
            published_year,
            reviews,
        }
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn published_year(&self) -> i64 {
        self.published_year
    }

    /// Owned review ids, in the order they were loaded or attached.
    pub fn reviews(&self) -> &[ReviewId] {
        &self.reviews
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
    }

    pub fn set_published_year(&mut self, published_year: i64) {
        self.published_year = published_year;
    }

    /// Applies only the fields present in `patch`.
    pub fn apply(&mut self, patch: &BookPatch) {
        if let Some(title) = &patch.title {
            self.set_title(title.as_str());
        }
        if let Some(author) = &patch.author {
            self.set_author(author.as_str());
        }
        if let Some(published_year) = patch.published_year {
            self.set_published_year(published_year);
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        check_book(&BookFields {
            title: &self.title,
            author: &self.author,
            published_year: Some(self.published_year),
        })
        .into_result()
    }

    /// Attaches `review` to this book.
    ///
    /// Returns `false` (and changes nothing) when the review is already
    /// listed. Otherwise the id is recorded and the review's back-reference
    /// is pointed at this book.
    pub fn add_review(&mut self, review: &mut Review) -> bool {
        if self.reviews.contains(&review.id()) {
            return false;
        }
        self.reviews.push(review.id());
        review.attach_to(self.id);
        true
    }

    /// Detaches `review` from this book.
    ///
    /// Returns `false` when the review is not listed. The back-reference is
    /// cleared only if it still points at this book.
    pub fn remove_review(&mut self, review: &mut Review) -> bool {
        let Some(position) = self.reviews.iter().position(|id| *id == review.id()) else {
            return false;
        };
        self.reviews.remove(position);
        if review.book_id() == Some(self.id) {
            review.detach();
        }
        true
    }
}
