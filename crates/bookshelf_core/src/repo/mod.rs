//! Aggregate repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Define use-case oriented persistence contracts for books and reviews.
//! - Isolate SQLite details from service orchestration.
//!
//! # Invariants
//! - Write paths validate the merged entity state before any SQL mutation.
//! - Multi-statement writes run inside one `BEGIN IMMEDIATE` transaction.
//! - APIs return semantic errors (`BookNotFound`, `ReviewNotFound`) in
//!   addition to storage errors.

pub mod book_repo;
pub mod catalog_repo;
pub mod review_repo;
