//! Read-side projections of the catalog.
//!
//! # Responsibility
//! - Define the list and detail shapes handed to outer layers.
//! - Keep read SQL (aggregation, review ordering) in one place.
//!
//! # Invariants
//! - Average ratings are computed by SQLite at read time, never stored.
//! - A book without reviews has no average (`None`), never `0.0`.
//! - Reviews of one book are ordered `created_at DESC, id ASC`.

mod projection;
pub(crate) mod reader;

pub use projection::{BookDetail, BookSummary};
