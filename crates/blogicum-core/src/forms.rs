//! User-submitted forms and their validation.
//!
//! Forms deserialize leniently (missing fields become empty) so that every
//! problem is reported as a field error instead of a parse failure.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Post, User};

pub const TITLE_MAX_CHARS: usize = 256;
pub const USERNAME_MAX_CHARS: usize = 150;
pub const NAME_MAX_CHARS: usize = 150;

const REQUIRED: &str = "This field is required.";

/// Validation errors keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(value)` when nothing was reported.
    pub fn finish<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

fn require_text(errors: &mut FormErrors, field: &str, value: &str, max_chars: Option<usize>) {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED);
        return;
    }
    if let Some(max) = max_chars {
        let len = value.chars().count();
        if len > max {
            errors.add(
                field,
                format!("Ensure this value has at most {max} characters (it has {len})."),
            );
        }
    }
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS]`, `YYYY-MM-DD HH:MM[:SS]` and a bare
/// `YYYY-MM-DD` (midnight UTC). Naive values are taken as UTC.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for format in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Post create/edit form. Author, publication flag and creation time are
/// never read from the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub pub_date: String,
    pub location: Option<Uuid>,
    pub category: Option<Uuid>,
}

/// A validated [`PostForm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInput {
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
    pub location_id: Option<Uuid>,
    pub category_id: Uuid,
}

impl PostForm {
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            image: post.image.clone(),
            pub_date: post.pub_date.to_rfc3339(),
            location: post.location_id,
            category: post.category_id,
        }
    }

    /// Field-level validation. References to categories and locations are
    /// checked against storage by the caller.
    pub fn clean(&self) -> Result<PostInput, FormErrors> {
        let mut errors = FormErrors::new();
        require_text(&mut errors, "title", &self.title, Some(TITLE_MAX_CHARS));
        require_text(&mut errors, "text", &self.text, None);

        let pub_date = if self.pub_date.trim().is_empty() {
            errors.add("pub_date", REQUIRED);
            None
        } else {
            let parsed = parse_pub_date(&self.pub_date);
            if parsed.is_none() {
                errors.add("pub_date", "Enter a valid date/time.");
            }
            parsed
        };

        if self.category.is_none() {
            errors.add("category", REQUIRED);
        }

        match (pub_date, self.category) {
            (Some(pub_date), Some(category_id)) if errors.is_empty() => Ok(PostInput {
                title: self.title.trim().to_string(),
                text: self.text.clone(),
                image: self
                    .image
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from),
                pub_date,
                location_id: self.location,
                category_id,
            }),
            _ => Err(errors),
        }
    }
}

impl PostInput {
    /// Build a new post owned by `author_id`.
    pub fn into_post(self, author_id: Uuid) -> Post {
        let mut post = Post::new(author_id, String::new(), String::new(), self.pub_date);
        self.apply_to(&mut post);
        post
    }

    /// Overwrite the editable fields of `post`.
    pub fn apply_to(self, post: &mut Post) {
        post.title = self.title;
        post.text = self.text;
        post.image = self.image;
        post.pub_date = self.pub_date;
        post.location_id = self.location_id;
        post.category_id = Some(self.category_id);
    }
}

/// Comment create/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn clean(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::new();
        require_text(&mut errors, "text", &self.text, None);
        errors.finish(self.text.clone())
    }
}

/// Account edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }

    /// Field-level validation. Username uniqueness is checked by the caller.
    pub fn clean(&self) -> Result<ProfileForm, FormErrors> {
        let mut errors = FormErrors::new();
        let username = self.username.trim();
        require_text(&mut errors, "username", username, Some(USERNAME_MAX_CHARS));
        if !username.is_empty() && !is_valid_username(username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        let email = self.email.trim();
        if !email.is_empty() && !looks_like_email(email) {
            errors.add("email", "Enter a valid email address.");
        }

        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            let len = value.trim().chars().count();
            if len > NAME_MAX_CHARS {
                errors.add(
                    field,
                    format!("Ensure this value has at most {NAME_MAX_CHARS} characters (it has {len})."),
                );
            }
        }

        errors.finish(ProfileForm {
            username: username.to_string(),
            email: email.to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
        })
    }
}

pub fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

pub fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Timelike};

    use super::*;

    fn valid_post_form() -> PostForm {
        PostForm {
            title: "Baikal in winter".into(),
            text: "Ice everywhere".into(),
            image: None,
            pub_date: "2023-07-13".into(),
            location: None,
            category: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn test_pub_date_formats() {
        let midnight = Utc.with_ymd_and_hms(2023, 7, 13, 0, 0, 0).unwrap();
        assert_eq!(parse_pub_date("2023-07-13"), Some(midnight));
        assert_eq!(
            parse_pub_date("2023-07-13T19:59").map(|d| (d.hour(), d.minute())),
            Some((19, 59))
        );
        assert_eq!(
            parse_pub_date("2023-07-13T22:59:00+03:00"),
            Some(Utc.with_ymd_and_hms(2023, 7, 13, 19, 59, 0).unwrap())
        );
        assert_eq!(parse_pub_date("13.07.2023"), None);
    }

    #[test]
    fn test_valid_post_form_cleans() {
        let form = valid_post_form();
        let input = form.clean().unwrap();

        assert_eq!(input.title, "Baikal in winter");
        assert_eq!(Some(input.category_id), form.category);
        assert_eq!(input.location_id, None);
    }

    #[test]
    fn test_post_form_reports_each_field() {
        let form = PostForm {
            title: "x".repeat(TITLE_MAX_CHARS + 1),
            pub_date: "not a date".into(),
            ..PostForm::default()
        };
        let errors = form.clean().unwrap_err();

        assert_eq!(errors.field("title").len(), 1);
        assert_eq!(errors.field("text"), [REQUIRED.to_string()]);
        assert_eq!(errors.field("pub_date"), ["Enter a valid date/time.".to_string()]);
        assert_eq!(errors.field("category"), [REQUIRED.to_string()]);
        assert!(errors.field("image").is_empty());
    }

    #[test]
    fn test_post_form_ignores_blank_image() {
        let form = PostForm {
            image: Some("  ".into()),
            ..valid_post_form()
        };
        assert_eq!(form.clean().unwrap().image, None);
    }

    #[test]
    fn test_post_form_deserializes_with_missing_fields() {
        let form: PostForm = serde_json::from_str(r#"{"title": "Only title"}"#).unwrap();
        assert_eq!(form.title, "Only title");
        assert!(form.clean().is_err());
    }

    #[test]
    fn test_input_apply_keeps_author_and_flags() {
        let author = Uuid::new_v4();
        let mut post = Post::new(author, "Old".into(), "Old".into(), Utc::now());
        post.is_published = false;

        valid_post_form().clean().unwrap().apply_to(&mut post);

        assert_eq!(post.title, "Baikal in winter");
        assert_eq!(post.author_id, author);
        assert!(!post.is_published);
    }

    #[test]
    fn test_comment_form_requires_text() {
        assert!(CommentForm { text: "   ".into() }.clean().is_err());
        assert_eq!(CommentForm { text: "Hi".into() }.clean().unwrap(), "Hi");
    }

    #[test]
    fn test_profile_form_validation() {
        let form = ProfileForm {
            username: "bad name!".into(),
            email: "nope".into(),
            first_name: "Anna".into(),
            last_name: String::new(),
        };
        let errors = form.clean().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["email", "username"]);

        let ok = ProfileForm {
            username: " anna.k ".into(),
            email: "anna@example.com".into(),
            ..ProfileForm::default()
        }
        .clean()
        .unwrap();
        assert_eq!(ok.username, "anna.k");
    }

    #[test]
    fn test_email_shapes() {
        assert!(looks_like_email("a@b.io"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.io"));
        assert!(!looks_like_email("a b@c.io"));
    }
}
