//! Book persistence contract and its SQLite implementation.
//!
//! # Responsibility
//! - Create, partially update and delete books.
//! - Serve the list and detail projections.
//!
//! # Invariants
//! - Deleting a book removes its reviews in the same transaction; if any
//!   review survives, the transaction is rolled back.
//! - Updates never touch review rows.

use crate::model::book::{Book, BookDraft, BookId, BookPatch};
use crate::model::review::now_epoch_ms;
use crate::query::reader::{
    book_exists, count_reviews_for_book, list_book_summaries, load_book, load_book_detail,
};
use crate::query::{BookDetail, BookSummary};
use crate::repo::catalog_repo::{RepoError, RepoResult, SqliteCatalogRepository};
use rusqlite::params;

/// Repository interface for the book side of the aggregate.
pub trait BookRepository {
    /// Validates and stores a new book; the result has no reviews.
    fn create_book(&self, draft: &BookDraft) -> RepoResult<Book>;
    /// Applies supplied fields, re-validates, and returns the book with its
    /// current reviews.
    fn update_book(&self, id: BookId, patch: &BookPatch) -> RepoResult<BookDetail>;
    /// Removes the book and every review it owns, atomically.
    fn delete_book(&self, id: BookId) -> RepoResult<()>;
    /// Lists all books with their average rating.
    fn list_books(&self) -> RepoResult<Vec<BookSummary>>;
    /// Loads one book with reviews, most recent first.
    fn get_book(&self, id: BookId) -> RepoResult<BookDetail>;
}

impl BookRepository for SqliteCatalogRepository<'_> {
    fn create_book(&self, draft: &BookDraft) -> RepoResult<Book> {
        draft.promote(|title, author, published_year| -> RepoResult<BookId> {
            self.conn.execute(
                "INSERT INTO books (title, author, published_year, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4);",
                params![title, author, published_year, now_epoch_ms()],
            )?;
            Ok(self.conn.last_insert_rowid())
        })
    }

    fn update_book(&self, id: BookId, patch: &BookPatch) -> RepoResult<BookDetail> {
        let tx = self.begin_immediate()?;
        let mut book = load_book(&tx, id)?.ok_or(RepoError::BookNotFound(id))?;
        book.apply(patch);
        book.validate()?;

        tx.execute(
            "UPDATE books
             SET
                title = ?2,
                author = ?3,
                published_year = ?4,
                updated_at = ?5
             WHERE id = ?1;",
            params![
                id,
                book.title(),
                book.author(),
                book.published_year(),
                now_epoch_ms(),
            ],
        )?;

        let detail = load_book_detail(&tx, id)?.ok_or(RepoError::BookNotFound(id))?;
        tx.commit()?;
        Ok(detail)
    }

    fn delete_book(&self, id: BookId) -> RepoResult<()> {
        let tx = self.begin_immediate()?;
        if !book_exists(&tx, id)? {
            return Err(RepoError::BookNotFound(id));
        }

        tx.execute("DELETE FROM reviews WHERE book_id = ?1;", [id])?;
        tx.execute("DELETE FROM books WHERE id = ?1;", [id])?;

        let remaining = count_reviews_for_book(&tx, id)?;
        if remaining != 0 {
            // Dropping `tx` rolls back both deletes.
            return Err(RepoError::CascadeIncomplete {
                book_id: id,
                remaining,
            });
        }

        tx.commit()?;
        Ok(())
    }

    fn list_books(&self) -> RepoResult<Vec<BookSummary>> {
        list_book_summaries(self.conn)
    }

    fn get_book(&self, id: BookId) -> RepoResult<BookDetail> {
        load_book_detail(self.conn, id)?.ok_or(RepoError::BookNotFound(id))
    }
}
