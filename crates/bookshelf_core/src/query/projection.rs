use crate::model::book::{Book, BookId};
use crate::model::review::Review;
use serde::Serialize;

/// One row of the catalog listing.
///
/// `reviews` is always empty; listing never loads the children of every book.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSummary {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub published_year: i64,
    /// Mean of the attached ratings, `None` when the book has no reviews.
    pub average_rating: Option<f64>,
    /// Always empty; serializes as `[]`.
    pub reviews: [Review; 0],
}

/// One book with its full review collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookDetail {
    pub book: Book,
    pub average_rating: Option<f64>,
    /// Most recent first; equal timestamps keep insertion order.
    pub reviews: Vec<Review>,
}

impl BookDetail {
    pub fn id(&self) -> BookId {
        self.book.id()
    }

    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }
}
