//! # Blogicum Shared
//!
//! Wire types of the HTTP API. Kept free of domain logic so clients can
//! depend on it alone.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
