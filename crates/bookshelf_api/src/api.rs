//! Per-endpoint catalog operations over a SQLite connection.
//!
//! # Responsibility
//! - Map each catalog endpoint to a service call and shape its response.
//! - Translate core errors to status codes.
//!
//! # Invariants
//! - Endpoints never panic; every failure becomes an `ApiResponse`.
//! - Type violations from request parsing are merged with core validation,
//!   so a single `400` lists every offending field.

use crate::request::{
    parse_book_draft, parse_book_patch, parse_review_patch, parse_review_request, RequestError,
};
use crate::response::{book_detail, book_list_item, new_book, review_body, ApiResponse};
use bookshelf_core::{
    BookId, BookRef, CatalogService, RepoError, ReviewId, SqliteCatalogRepository,
    ValidationErrors,
};
use log::{error, warn};
use rusqlite::Connection;
use serde_json::Value;

type Service<'conn> = CatalogService<SqliteCatalogRepository<'conn>>;

/// `GET /books`
pub fn list_books(conn: &Connection) -> ApiResponse {
    with_service(conn, |service| match service.list_books() {
        Ok(items) => ApiResponse::ok(Value::Array(items.iter().map(book_list_item).collect())),
        Err(err) => repo_failure(err),
    })
}

/// `GET /books/{id}`
pub fn get_book(conn: &Connection, id: BookId) -> ApiResponse {
    with_service(conn, |service| match service.get_book(id) {
        Ok(detail) => ApiResponse::ok(book_detail(&detail)),
        Err(err) => repo_failure(err),
    })
}

/// `POST /books`
pub fn create_book(conn: &Connection, body: &str) -> ApiResponse {
    let parsed = match parse_book_draft(body) {
        Ok(parsed) => parsed,
        Err(err) => return malformed("book_create", err),
    };
    if !parsed.violations.is_empty() {
        return invalid_with(parsed.violations, parsed.value.validate());
    }

    with_service(conn, |service| match service.create_book(&parsed.value) {
        Ok(book) => ApiResponse::created(new_book(&book)),
        Err(err) => repo_failure(err),
    })
}

/// `PUT /books/{id}`; absent fields keep their stored values.
pub fn update_book(conn: &Connection, id: BookId, body: &str) -> ApiResponse {
    let parsed = match parse_book_patch(body) {
        Ok(parsed) => parsed,
        Err(err) => return malformed("book_update", err),
    };

    with_service(conn, |service| {
        if !parsed.violations.is_empty() {
            // Existence is still checked first so an unknown id stays a 404.
            return match service.get_book(id) {
                Ok(detail) => {
                    let mut merged = detail.book.clone();
                    merged.apply(&parsed.value);
                    invalid_with(parsed.violations, merged.validate())
                }
                Err(err) => repo_failure(err),
            };
        }
        match service.update_book(id, &parsed.value) {
            Ok(detail) => ApiResponse::ok(book_detail(&detail)),
            Err(err) => repo_failure(err),
        }
    })
}

/// `DELETE /books/{id}`; reviews of the book go with it.
pub fn delete_book(conn: &Connection, id: BookId) -> ApiResponse {
    with_service(conn, |service| match service.delete_book(id) {
        Ok(()) => ApiResponse::no_content(),
        Err(err) => repo_failure(err),
    })
}

/// `POST /reviews`
///
/// A missing or unknown `book_id` is a field violation (`400`), not a `404`.
pub fn create_review(conn: &Connection, body: &str) -> ApiResponse {
    let parsed = match parse_review_request(body) {
        Ok(parsed) => parsed,
        Err(err) => return malformed("review_create", err),
    };
    let request = parsed.value;

    let Some(book_id) = request.book_id else {
        return invalid_with(
            parsed.violations,
            request.draft.validate_for(BookRef::Missing),
        );
    };

    with_service(conn, |service| {
        if !parsed.violations.is_empty() {
            let book = match service.get_book(book_id) {
                Ok(_) => BookRef::Existing(book_id),
                Err(RepoError::BookNotFound(_)) => BookRef::Dangling(book_id),
                Err(err) => return repo_failure(err),
            };
            return invalid_with(parsed.violations, request.draft.validate_for(book));
        }
        match service.create_review(book_id, &request.draft) {
            Ok(review) => ApiResponse::created(review_body(&review)),
            Err(RepoError::BookNotFound(_)) => invalid_with(
                ValidationErrors::new(),
                request.draft.validate_for(BookRef::Dangling(book_id)),
            ),
            Err(err) => repo_failure(err),
        }
    })
}

/// `GET /reviews/{id}`
pub fn get_review(conn: &Connection, id: ReviewId) -> ApiResponse {
    with_service(conn, |service| match service.get_review(id) {
        Ok(review) => ApiResponse::ok(review_body(&review)),
        Err(err) => repo_failure(err),
    })
}

/// `PUT /reviews/{id}`; only `rating` and `comment` can change.
pub fn update_review(conn: &Connection, id: ReviewId, body: &str) -> ApiResponse {
    let parsed = match parse_review_patch(body) {
        Ok(parsed) => parsed,
        Err(err) => return malformed("review_update", err),
    };

    with_service(conn, |service| {
        if !parsed.violations.is_empty() {
            return match service.get_review(id) {
                Ok(mut review) => {
                    invalid_with(parsed.violations, review.apply(&parsed.value))
                }
                Err(err) => repo_failure(err),
            };
        }
        match service.update_review(id, &parsed.value) {
            Ok(review) => ApiResponse::ok(review_body(&review)),
            Err(err) => repo_failure(err),
        }
    })
}

/// `DELETE /reviews/{id}`
pub fn delete_review(conn: &Connection, id: ReviewId) -> ApiResponse {
    with_service(conn, |service| match service.delete_review(id) {
        Ok(()) => ApiResponse::no_content(),
        Err(err) => repo_failure(err),
    })
}

fn with_service<'conn>(
    conn: &'conn Connection,
    run: impl FnOnce(&Service<'conn>) -> ApiResponse,
) -> ApiResponse {
    match SqliteCatalogRepository::try_new(conn) {
        Ok(repo) => run(&CatalogService::new(repo)),
        Err(err) => repo_failure(err),
    }
}

fn repo_failure(err: RepoError) -> ApiResponse {
    match err {
        RepoError::Validation(errors) => ApiResponse::invalid(&errors),
        RepoError::BookNotFound(_) | RepoError::ReviewNotFound(_) => {
            ApiResponse::not_found(err.to_string())
        }
        other => {
            error!(
                "event=api_request module=api status=error error_code={} error={other}",
                other.code()
            );
            ApiResponse::internal()
        }
    }
}

fn malformed(event: &'static str, err: RequestError) -> ApiResponse {
    warn!("event={event} module=api status=rejected error_code=malformed_request");
    ApiResponse::bad_request(err.to_string())
}

/// Type violations win over core messages for the same field.
fn invalid_with(
    mut violations: ValidationErrors,
    core: Result<(), ValidationErrors>,
) -> ApiResponse {
    if let Err(core) = core {
        violations.merge(core);
    }
    ApiResponse::invalid(&violations)
}
