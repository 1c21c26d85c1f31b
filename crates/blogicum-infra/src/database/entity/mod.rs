//! SeaORM entities of the blog schema.

pub mod category;
pub mod comment;
pub mod location;
pub mod post;
pub mod user;
