//! # Blogicum Core
//!
//! The domain layer of the Blogicum blog service.
//! Entities, the publication rules, pagination, the ownership guard, form
//! validation and the request flows live here, with zero infrastructure
//! dependencies. Storage is reached only through the traits in [`ports`].

pub mod access;
pub mod domain;
pub mod error;
pub mod forms;
pub mod pagination;
pub mod ports;
pub mod services;
pub mod visibility;

pub use error::{DomainError, RepoError};
pub use services::{BlogService, Outcome, Repositories, Submission};

/// Number of characters of a title, name or comment text shown in display names.
pub const VISIBLE_TITLE_CHARS: usize = 21;
