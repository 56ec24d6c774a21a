//! Catalog domain model.
//!
//! # Responsibility
//! - Define the Book/Review aggregate and its identity lifecycle.
//! - Keep field validation explicit and decoupled from storage.
//!
//! # Invariants
//! - Entities with identity (`Book`, `Review`) only come into existence after
//!   a successful store; callers hold drafts until then.
//! - Ownership is directed: a Book lists its review ids, a Review carries its
//!   parent book id. Neither holds the other by value.

pub mod book;
pub mod review;
pub mod validation;
