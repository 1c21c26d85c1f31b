use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Author, Category, Location, truncate_chars};
use crate::VISIBLE_TITLE_CHARS;

/// Post entity - a blog publication.
///
/// `pub_date` may lie in the future, which schedules the post: it stays out
/// of public listings until that instant passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

impl Post {
    /// Create a new, published post.
    pub fn new(author_id: Uuid, title: String, text: String, pub_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            text,
            image: None,
            pub_date,
            is_published: true,
            created_at: Utc::now(),
            author_id,
            location_id: None,
            category_id: None,
        }
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(truncate_chars(&self.title, VISIBLE_TITLE_CHARS))
    }
}

/// A post with its relations loaded, as shown in listings and detail pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostEntry {
    pub post: Post,
    pub author: Author,
    pub category: Option<Category>,
    pub location: Option<Location>,
    /// Present only when the query asked for the comment count.
    pub comment_count: Option<u64>,
}
