//! SQL read paths shared by the repository implementations.

use super::projection::{BookDetail, BookSummary};
use crate::model::book::{Book, BookId};
use crate::model::review::{Review, ReviewId};
use crate::model::validation::is_valid_rating;
use crate::repo::catalog_repo::{RepoError, RepoResult};
use rusqlite::{Connection, OptionalExtension, Row};

const REVIEW_SELECT_SQL: &str = "SELECT
    id,
    book_id,
    rating,
    comment,
    created_at
FROM reviews";

const REVIEW_ORDER_SQL: &str = "ORDER BY created_at DESC, id ASC";

/// Loads one book with its review ids in detail order.
pub(crate) fn load_book(conn: &Connection, id: BookId) -> RepoResult<Option<Book>> {
    let Some((title, author, published_year)) = load_book_fields(conn, id)? else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(&format!(
        "SELECT id FROM reviews WHERE book_id = ?1 {REVIEW_ORDER_SQL};"
    ))?;
    let mut rows = stmt.query([id])?;
    let mut review_ids = Vec::new();
    while let Some(row) = rows.next()? {
        review_ids.push(row.get::<_, ReviewId>(0)?);
    }

    Ok(Some(Book::from_stored(
        id,
        title,
        author,
        published_year,
        review_ids,
    )))
}

/// Loads one book, its reviews and their average rating.
pub(crate) fn load_book_detail(conn: &Connection, id: BookId) -> RepoResult<Option<BookDetail>> {
    let Some((title, author, published_year)) = load_book_fields(conn, id)? else {
        return Ok(None);
    };

    let reviews = load_reviews_for_book(conn, id)?;
    let review_ids = reviews.iter().map(Review::id).collect();
    let average_rating = average_rating(conn, id)?;

    Ok(Some(BookDetail {
        book: Book::from_stored(id, title, author, published_year, review_ids),
        average_rating,
        reviews,
    }))
}

/// Lists every book with its average rating, ordered by id.
pub(crate) fn list_book_summaries(conn: &Connection) -> RepoResult<Vec<BookSummary>> {
    let mut stmt = conn.prepare(
        "SELECT
            b.id AS id,
            b.title AS title,
            b.author AS author,
            b.published_year AS published_year,
            AVG(r.rating) AS average_rating
         FROM books b
         LEFT JOIN reviews r ON r.book_id = b.id
         GROUP BY b.id
         ORDER BY b.id ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(BookSummary {
            id: row.get("id")?,
            title: row.get("title")?,
            author: row.get("author")?,
            published_year: row.get("published_year")?,
            average_rating: row.get("average_rating")?,
            reviews: [],
        });
    }
    Ok(items)
}

pub(crate) fn load_review(conn: &Connection, id: ReviewId) -> RepoResult<Option<Review>> {
    let mut stmt = conn.prepare(&format!("{REVIEW_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_review_row(row)?));
    }
    Ok(None)
}

pub(crate) fn load_reviews_for_book(conn: &Connection, book_id: BookId) -> RepoResult<Vec<Review>> {
    let mut stmt = conn.prepare(&format!(
        "{REVIEW_SELECT_SQL} WHERE book_id = ?1 {REVIEW_ORDER_SQL};"
    ))?;
    let mut rows = stmt.query([book_id])?;
    let mut reviews = Vec::new();
    while let Some(row) = rows.next()? {
        reviews.push(parse_review_row(row)?);
    }
    Ok(reviews)
}

/// `SUM(rating) / COUNT(rating)` over the reviews currently attached.
pub(crate) fn average_rating(conn: &Connection, book_id: BookId) -> RepoResult<Option<f64>> {
    let average = conn.query_row(
        "SELECT AVG(rating) FROM reviews WHERE book_id = ?1;",
        [book_id],
        |row| row.get::<_, Option<f64>>(0),
    )?;
    Ok(average)
}

pub(crate) fn book_exists(conn: &Connection, id: BookId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM books WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn count_reviews_for_book(conn: &Connection, book_id: BookId) -> RepoResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM reviews WHERE book_id = ?1;",
        [book_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn load_book_fields(conn: &Connection, id: BookId) -> RepoResult<Option<(String, String, i64)>> {
    let fields = conn
        .query_row(
            "SELECT title, author, published_year FROM books WHERE id = ?1;",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    Ok(fields)
}

fn parse_review_row(row: &Row<'_>) -> RepoResult<Review> {
    let id: ReviewId = row.get("id")?;
    let rating: i64 = row.get("rating")?;
    let rating = u8::try_from(rating)
        .ok()
        .filter(|value| is_valid_rating(i64::from(*value)))
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid rating `{rating}` in reviews.rating for review {id}"
            ))
        })?;

    Ok(Review::from_stored(
        id,
        Some(row.get("book_id")?),
        rating,
        row.get("comment")?,
        row.get("created_at")?,
    ))
}
