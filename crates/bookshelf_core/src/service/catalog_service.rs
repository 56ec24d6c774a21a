//! Catalog use-case service.
//!
//! # Responsibility
//! - Provide the book/review entry points consumed by outer layers.
//! - Log one event per operation with ids, outcome and duration.
//!
//! # Invariants
//! - Service APIs never bypass repository validation or transactions.
//! - Log events carry ids and error codes only, never titles or comments.

use crate::model::book::{Book, BookDraft, BookId, BookPatch};
use crate::model::review::{Review, ReviewDraft, ReviewId, ReviewPatch};
use crate::query::{BookDetail, BookSummary};
use crate::repo::book_repo::BookRepository;
use crate::repo::catalog_repo::{RepoError, RepoResult};
use crate::repo::review_repo::ReviewRepository;
use log::{debug, error, info, warn};
use std::time::Instant;

/// Use-case facade over an aggregate repository.
pub struct CatalogService<R> {
    repo: R,
}

impl<R: BookRepository + ReviewRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_book(&self, draft: &BookDraft) -> RepoResult<Book> {
        observe("book_create", None, || self.repo.create_book(draft), |book: &Book| {
            format!("book_id={}", book.id())
        })
    }

    /// Partially updates a book; absent patch fields are left unchanged.
    pub fn update_book(&self, id: BookId, patch: &BookPatch) -> RepoResult<BookDetail> {
        if patch.is_empty() {
            debug!("event=book_update module=catalog status=noop book_id={id}");
        }
        observe(
            "book_update",
            Some(id),
            || self.repo.update_book(id, patch),
            |detail: &BookDetail| format!("review_count={}", detail.review_count()),
        )
    }

    /// Deletes a book together with all of its reviews.
    pub fn delete_book(&self, id: BookId) -> RepoResult<()> {
        observe("book_delete", Some(id), || self.repo.delete_book(id), |_: &()| {
            String::new()
        })
    }

    pub fn list_books(&self) -> RepoResult<Vec<BookSummary>> {
        observe("book_list", None, || self.repo.list_books(), |items: &Vec<BookSummary>| {
            format!("count={}", items.len())
        })
    }

    pub fn get_book(&self, id: BookId) -> RepoResult<BookDetail> {
        observe("book_get", Some(id), || self.repo.get_book(id), |detail: &BookDetail| {
            format!("review_count={}", detail.review_count())
        })
    }

    pub fn create_review(&self, book_id: BookId, draft: &ReviewDraft) -> RepoResult<Review> {
        observe(
            "review_create",
            Some(book_id),
            || self.repo.create_review(book_id, draft),
            |review: &Review| format!("review_id={}", review.id()),
        )
    }

    pub fn update_review(&self, id: ReviewId, patch: &ReviewPatch) -> RepoResult<Review> {
        observe(
            "review_update",
            None,
            || self.repo.update_review(id, patch),
            |review: &Review| format!("review_id={}", review.id()),
        )
    }

    pub fn delete_review(&self, id: ReviewId) -> RepoResult<()> {
        observe("review_delete", None, || self.repo.delete_review(id), |_: &()| {
            format!("review_id={id}")
        })
    }

    pub fn get_review(&self, id: ReviewId) -> RepoResult<Review> {
        observe("review_get", None, || self.repo.get_review(id), |review: &Review| {
            format!("review_id={}", review.id())
        })
    }

    pub fn list_reviews(&self, book_id: BookId) -> RepoResult<Vec<Review>> {
        observe(
            "review_list",
            Some(book_id),
            || self.repo.list_reviews(book_id),
            |reviews: &Vec<Review>| format!("count={}", reviews.len()),
        )
    }
}

fn observe<T>(
    event: &'static str,
    book_id: Option<BookId>,
    run: impl FnOnce() -> RepoResult<T>,
    describe: impl FnOnce(&T) -> String,
) -> RepoResult<T> {
    let started_at = Instant::now();
    let scope = book_id.map(|id| format!(" book_id={id}")).unwrap_or_default();
    let result = run();
    let duration_ms = started_at.elapsed().as_millis();

    match &result {
        Ok(value) => {
            let details = describe(value);
            let details = if details.is_empty() {
                String::new()
            } else {
                format!(" {details}")
            };
            info!("event={event} module=catalog status=ok{scope}{details} duration_ms={duration_ms}");
        }
        Err(err) if is_caller_error(err) => {
            warn!(
                "event={event} module=catalog status=rejected{scope} error_code={} duration_ms={duration_ms}",
                err.code()
            );
        }
        Err(err) => {
            error!(
                "event={event} module=catalog status=error{scope} error_code={} duration_ms={duration_ms} error={err}",
                err.code()
            );
        }
    }
    result
}

fn is_caller_error(err: &RepoError) -> bool {
    err.is_not_found() || matches!(err, RepoError::Validation(_))
}
