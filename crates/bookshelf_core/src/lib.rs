//! Core domain logic for the Bookshelf catalog.
//! This crate is the single source of truth for the Book/Review aggregate
//! rules: validation, cascade delete and rating aggregation.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use config::{CatalogConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::book::{Book, BookDraft, BookId, BookPatch};
pub use model::review::{format_timestamp, Review, ReviewDraft, ReviewId, ReviewPatch};
pub use model::validation::{BookRef, ValidationErrors};
pub use query::{BookDetail, BookSummary};
pub use repo::book_repo::BookRepository;
pub use repo::catalog_repo::{RepoError, RepoResult, SqliteCatalogRepository};
pub use repo::review_repo::ReviewRepository;
pub use service::catalog_service::CatalogService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
