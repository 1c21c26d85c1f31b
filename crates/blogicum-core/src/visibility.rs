//! The publication rule and the post filter built on top of it.
//!
//! A post is publicly visible when it is published, its publication date has
//! passed and its category, if it has one, is published. Every listing goes
//! through [`PostFilter`]; storage backends translate the filter once and
//! reuse that translation for all endpoints.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Post};

/// Whether `post` may be shown to anyone at `now`.
///
/// `category` is the post's category row, if the post has one.
pub fn is_publicly_visible(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.is_published && post.pub_date <= now && category.is_none_or(|c| c.is_published)
}

/// Which posts a listing starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    /// Only publicly visible posts.
    Visible,
    /// Every post, including drafts and scheduled ones.
    All,
}

/// A composable post query: base scope plus optional narrowing.
#[derive(Debug, Clone)]
pub struct PostFilter {
    pub scope: PostScope,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub with_comment_count: bool,
    pub now: DateTime<Utc>,
}

impl PostFilter {
    pub fn visible(now: DateTime<Utc>) -> Self {
        Self::new(PostScope::Visible, now)
    }

    pub fn all(now: DateTime<Utc>) -> Self {
        Self::new(PostScope::All, now)
    }

    fn new(scope: PostScope, now: DateTime<Utc>) -> Self {
        Self {
            scope,
            category_id: None,
            author_id: None,
            with_comment_count: false,
            now,
        }
    }

    pub fn in_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn by_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn with_comment_count(mut self) -> Self {
        self.with_comment_count = true;
        self
    }

    /// Evaluate the filter against a single post in memory.
    pub fn admits(&self, post: &Post, category: Option<&Category>) -> bool {
        if self.scope == PostScope::Visible && !is_publicly_visible(post, category, self.now) {
            return false;
        }
        if self.category_id.is_some() && post.category_id != self.category_id {
            return false;
        }
        if self.author_id.is_some_and(|id| id != post.author_id) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn post(pub_date: DateTime<Utc>) -> Post {
        Post::new(Uuid::new_v4(), "Title".into(), "Text".into(), pub_date)
    }

    fn category(is_published: bool) -> Category {
        let mut category = Category::new("Travel".into(), "Trips".into(), "travel".into());
        category.is_published = is_published;
        category
    }

    #[test]
    fn test_published_past_post_without_category_is_visible() {
        let now = Utc::now();
        assert!(is_publicly_visible(&post(now - TimeDelta::minutes(1)), None, now));
    }

    #[test]
    fn test_pub_date_equal_to_now_is_visible() {
        let now = Utc::now();
        assert!(is_publicly_visible(&post(now), None, now));
    }

    #[test]
    fn test_future_post_is_hidden() {
        let now = Utc::now();
        assert!(!is_publicly_visible(&post(now + TimeDelta::hours(1)), None, now));
    }

    #[test]
    fn test_unpublished_post_is_hidden() {
        let now = Utc::now();
        let mut draft = post(now - TimeDelta::days(1));
        draft.is_published = false;
        assert!(!is_publicly_visible(&draft, None, now));
    }

    #[test]
    fn test_category_publication_gates_visibility() {
        let now = Utc::now();
        let p = post(now - TimeDelta::days(1));
        assert!(is_publicly_visible(&p, Some(&category(true)), now));
        assert!(!is_publicly_visible(&p, Some(&category(false)), now));
    }

    #[test]
    fn test_filter_narrows_by_category_and_author() {
        let now = Utc::now();
        let travel = category(true);
        let mut p = post(now - TimeDelta::days(1));
        p.category_id = Some(travel.id);

        assert!(PostFilter::visible(now).in_category(travel.id).admits(&p, Some(&travel)));
        assert!(!PostFilter::visible(now).in_category(Uuid::new_v4()).admits(&p, Some(&travel)));
        assert!(PostFilter::visible(now).by_author(p.author_id).admits(&p, Some(&travel)));
        assert!(!PostFilter::visible(now).by_author(Uuid::new_v4()).admits(&p, Some(&travel)));
    }

    #[test]
    fn test_all_scope_ignores_publication_state() {
        let now = Utc::now();
        let mut draft = post(now + TimeDelta::hours(3));
        draft.is_published = false;

        assert!(!PostFilter::visible(now).admits(&draft, Some(&category(false))));
        assert!(PostFilter::all(now).admits(&draft, Some(&category(false))));
    }
}
