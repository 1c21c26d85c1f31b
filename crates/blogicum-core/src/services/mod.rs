//! Request flows - what each endpoint does, independent of the HTTP layer.

mod blog;

use std::sync::Arc;

use crate::access::Destination;
use crate::forms::FormErrors;
use crate::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};

pub use blog::{BlogService, CategoryListing, PostDetail, ProfileListing};

/// Storage handles the service works with.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

/// Result of opening a page that may be refused to non-authors.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Render(T),
    Redirect(Destination),
}

/// Result of submitting a form.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Saved (or refused to a non-author); continue at the destination.
    Redirect(Destination),
    /// Nothing saved; show the form again with these errors.
    Invalid(FormErrors),
}
