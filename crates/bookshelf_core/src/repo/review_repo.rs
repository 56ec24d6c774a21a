//! Review persistence contract and its SQLite implementation.
//!
//! # Responsibility
//! - Create reviews under an existing book, update rating/comment, delete.
//!
//! # Invariants
//! - A review is only inserted while its book row is locked by the same
//!   write transaction, so a concurrent book delete can never orphan it.
//! - `book_id` and `created_at` are never written by update paths.

use crate::model::book::BookId;
use crate::model::review::{
    now_epoch_ms, NewReview, Review, ReviewDraft, ReviewId, ReviewPatch,
};
use crate::query::reader::{book_exists, load_book, load_review, load_reviews_for_book};
use crate::repo::catalog_repo::{RepoError, RepoResult, SqliteCatalogRepository};
use rusqlite::params;

/// Repository interface for the review side of the aggregate.
pub trait ReviewRepository {
    /// Creates a review under `book_id`, stamping `created_at`.
    fn create_review(&self, book_id: BookId, draft: &ReviewDraft) -> RepoResult<Review>;
    /// Applies supplied rating/comment fields after re-validation.
    fn update_review(&self, id: ReviewId, patch: &ReviewPatch) -> RepoResult<Review>;
    /// Detaches the review from its book and removes it.
    fn delete_review(&self, id: ReviewId) -> RepoResult<()>;
    fn get_review(&self, id: ReviewId) -> RepoResult<Review>;
    /// Reviews of one book, most recent first.
    fn list_reviews(&self, book_id: BookId) -> RepoResult<Vec<Review>>;
}

impl ReviewRepository for SqliteCatalogRepository<'_> {
    fn create_review(&self, book_id: BookId, draft: &ReviewDraft) -> RepoResult<Review> {
        let tx = self.begin_immediate()?;
        let mut book = load_book(&tx, book_id)?.ok_or(RepoError::BookNotFound(book_id))?;

        let review = draft.promote(&mut book, |pending: &NewReview<'_>| -> RepoResult<ReviewId> {
            tx.execute(
                "INSERT INTO reviews (book_id, rating, comment, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4);",
                params![
                    pending.book_id,
                    pending.rating,
                    pending.comment,
                    pending.created_at,
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })?;

        tx.commit()?;
        Ok(review)
    }

    fn update_review(&self, id: ReviewId, patch: &ReviewPatch) -> RepoResult<Review> {
        let tx = self.begin_immediate()?;
        let mut review = load_review(&tx, id)?.ok_or(RepoError::ReviewNotFound(id))?;
        review.apply(patch)?;

        tx.execute(
            "UPDATE reviews
             SET
                rating = ?2,
                comment = ?3,
                updated_at = ?4
             WHERE id = ?1;",
            params![id, review.rating(), review.comment(), now_epoch_ms()],
        )?;

        tx.commit()?;
        Ok(review)
    }

    fn delete_review(&self, id: ReviewId) -> RepoResult<()> {
        let tx = self.begin_immediate()?;
        let mut review = load_review(&tx, id)?.ok_or(RepoError::ReviewNotFound(id))?;
        let book_id = review.book_id().ok_or_else(|| {
            RepoError::InvalidData(format!("review {id} has no book in reviews.book_id"))
        })?;
        let mut book = load_book(&tx, book_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("review {id} references missing book {book_id}"))
        })?;

        if !book.remove_review(&mut review) || !review.is_detached() {
            return Err(RepoError::InvalidData(format!(
                "review {id} is not listed under book {book_id}"
            )));
        }

        tx.execute("DELETE FROM reviews WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(())
    }

    fn get_review(&self, id: ReviewId) -> RepoResult<Review> {
        load_review(self.conn, id)?.ok_or(RepoError::ReviewNotFound(id))
    }

    fn list_reviews(&self, book_id: BookId) -> RepoResult<Vec<Review>> {
        if !book_exists(self.conn, book_id)? {
            return Err(RepoError::BookNotFound(book_id));
        }
        load_reviews_for_book(self.conn, book_id)
    }
}
