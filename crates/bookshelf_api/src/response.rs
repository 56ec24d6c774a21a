//! Status codes and JSON bodies returned by the catalog endpoints.

use bookshelf_core::{Book, BookDetail, BookSummary, Review, ValidationErrors};
use serde_json::{json, Value};

/// Status code plus JSON body; `body` is `null` for `204 No Content`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn created(body: Value) -> Self {
        Self { status: 201, body }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: Value::Null,
        }
    }

    /// `400` with `{"errors": {field: message}}`.
    pub fn invalid(errors: &ValidationErrors) -> Self {
        Self {
            status: 400,
            body: json!({ "errors": errors }),
        }
    }

    /// `400` with `{"error": message}`, for bodies that are not readable at all.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: 404,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn internal() -> Self {
        Self {
            status: 500,
            body: json!({ "error": "internal error" }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Listing row; reviews are never loaded here, so the array is always empty.
pub(crate) fn book_list_item(summary: &BookSummary) -> Value {
    json!({
        "id": summary.id,
        "title": summary.title,
        "author": summary.author,
        "published_year": summary.published_year,
        "average_rating": summary.average_rating,
        "reviews": [],
    })
}

pub(crate) fn book_detail(detail: &BookDetail) -> Value {
    book_body(
        &detail.book,
        detail.average_rating,
        detail.reviews.iter().map(review_item).collect(),
    )
}

/// A freshly created book has no reviews and therefore no average.
pub(crate) fn new_book(book: &Book) -> Value {
    book_body(book, None, Vec::new())
}

pub(crate) fn review_body(review: &Review) -> Value {
    json!({
        "id": review.id(),
        "book_id": review.book_id(),
        "rating": review.rating(),
        "comment": review.comment(),
        "created_at": review.created_at_text(),
    })
}

fn book_body(book: &Book, average_rating: Option<f64>, reviews: Vec<Value>) -> Value {
    json!({
        "id": book.id(),
        "title": book.title(),
        "author": book.author(),
        "published_year": book.published_year(),
        "average_rating": average_rating,
        "reviews": reviews,
    })
}

/// Nested review shape inside a book detail.
fn review_item(review: &Review) -> Value {
    json!({
        "id": review.id(),
        "rating": review.rating(),
        "comment": review.comment(),
        "created_at": review.created_at_text(),
    })
}

#[cfg(test)]
mod tests {
    use super::ApiResponse;
    use bookshelf_core::BookDraft;

    #[test]
    fn invalid_wraps_errors_under_errors_key() {
        let errors = BookDraft::default().validate().unwrap_err();
        let response = ApiResponse::invalid(&errors);

        assert_eq!(response.status, 400);
        assert_eq!(response.body["errors"]["title"], "title is required");
        assert!(!response.is_success());
    }

    #[test]
    fn no_content_has_null_body() {
        let response = ApiResponse::no_content();
        assert_eq!(response.status, 204);
        assert!(response.body.is_null());
        assert!(response.is_success());
    }
}
