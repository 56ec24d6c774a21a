//! JSON request/response layer over `bookshelf_core`.
//!
//! Each endpoint function takes an open connection plus path ids and raw
//! request text, and returns the status code and body to send back.

pub mod api;
pub mod request;
pub mod response;

pub use request::RequestError;
pub use response::ApiResponse;
