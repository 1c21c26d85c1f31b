//! Domain entities - the core business objects.

mod category;
mod comment;
mod location;
mod post;
mod user;

pub use category::Category;
pub use comment::{Comment, CommentEntry};
pub use location::Location;
pub use post::{Post, PostEntry};
pub use user::{Author, User};

/// Cut `text` down to at most `limit` characters, respecting char boundaries.
pub(crate) fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_chars;

    #[test]
    fn test_truncate_chars_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("Путешествие на Байкал", 11), "Путешествие");
        assert_eq!(truncate_chars("short", 21), "short");
        assert_eq!(truncate_chars("", 3), "");
    }
}
