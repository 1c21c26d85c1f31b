use chrono::Utc;
use uuid::Uuid;

use super::{Outcome, Repositories, Submission};
use crate::access::{Access, Destination, authorize, is_author};
use crate::domain::{Category, Comment, CommentEntry, Post, PostEntry, User};
use crate::error::DomainError;
use crate::forms::{CommentForm, FormErrors, PostForm, PostInput, ProfileForm};
use crate::pagination::{Page, PageRequest};
use crate::ports::{
    BaseRepository, CategoryRepository, CommentRepository, PostRepository, UserRepository,
};
use crate::visibility::PostFilter;

const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Posts of a published category.
#[derive(Debug, Clone)]
pub struct CategoryListing {
    pub category: Category,
    pub page: Page<PostEntry>,
}

/// Posts of one author, as seen by the requester.
#[derive(Debug, Clone)]
pub struct ProfileListing {
    pub profile: User,
    pub page: Page<PostEntry>,
}

/// A post page: the post, its comments oldest first and a blank comment form.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub entry: PostEntry,
    pub comments: Vec<CommentEntry>,
    pub form: CommentForm,
}

/// The blog's request flows.
pub struct BlogService {
    repos: Repositories,
}

impl BlogService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Front page: every visible post, newest first.
    pub async fn index(&self, page: PageRequest) -> Result<Page<PostEntry>, DomainError> {
        let filter = PostFilter::visible(Utc::now()).with_comment_count();
        Ok(self.repos.posts.list(&filter, page).await?)
    }

    /// Visible posts of a category. Unknown and unpublished categories are not found.
    pub async fn category_posts(
        &self,
        slug: &str,
        page: PageRequest,
    ) -> Result<CategoryListing, DomainError> {
        let category = self
            .repos
            .categories
            .find_by_slug(slug)
            .await?
            .filter(|category| category.is_published)
            .ok_or_else(|| DomainError::not_found("category", slug))?;

        let filter = PostFilter::visible(Utc::now())
            .in_category(category.id)
            .with_comment_count();
        let page = self.repos.posts.list(&filter, page).await?;

        Ok(CategoryListing { category, page })
    }

    /// A single post. Authors see their own drafts and scheduled posts;
    /// everyone else only gets publicly visible ones.
    pub async fn post_detail(
        &self,
        requester: Option<Uuid>,
        post_id: Uuid,
    ) -> Result<PostDetail, DomainError> {
        let post = self.load_post(post_id).await?;
        let now = Utc::now();
        let filter = if is_author(requester, &post) {
            PostFilter::all(now)
        } else {
            PostFilter::visible(now)
        };

        let entry = self
            .repos
            .posts
            .find_entry(post_id, &filter)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;
        let comments = self.repos.comments.list_for_post(post_id).await?;

        Ok(PostDetail {
            entry,
            comments,
            form: CommentForm::default(),
        })
    }

    /// Posts of `username`: everything for the owner, visible ones for others.
    pub async fn profile(
        &self,
        requester: Option<Uuid>,
        username: &str,
        page: PageRequest,
    ) -> Result<ProfileListing, DomainError> {
        let profile = self
            .repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;

        let now = Utc::now();
        let base = if requester == Some(profile.id) {
            PostFilter::all(now)
        } else {
            PostFilter::visible(now)
        };
        let filter = base.by_author(profile.id).with_comment_count();
        let page = self.repos.posts.list(&filter, page).await?;

        Ok(ProfileListing { profile, page })
    }

    /// The requester's account form, filled with current values.
    pub async fn profile_form(&self, requester: Uuid) -> Result<ProfileForm, DomainError> {
        let user = self.current_user(requester).await?;
        Ok(ProfileForm::from_user(&user))
    }

    pub async fn edit_profile(
        &self,
        requester: Uuid,
        form: ProfileForm,
    ) -> Result<Submission, DomainError> {
        let mut user = self.current_user(requester).await?;
        let cleaned = match form.clean() {
            Ok(cleaned) => cleaned,
            Err(errors) => return Ok(Submission::Invalid(errors)),
        };

        if let Some(other) = self.repos.users.find_by_username(&cleaned.username).await? {
            if other.id != user.id {
                let mut errors = FormErrors::new();
                errors.add("username", USERNAME_TAKEN);
                return Ok(Submission::Invalid(errors));
            }
        }

        user.username = cleaned.username;
        user.email = cleaned.email;
        user.first_name = cleaned.first_name;
        user.last_name = cleaned.last_name;
        user.updated_at = Utc::now();
        let user = self.repos.users.save(user).await?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(Submission::Redirect(Destination::Profile(user.username)))
    }

    /// Publish a new post as the requester.
    pub async fn create_post(
        &self,
        requester: Uuid,
        form: PostForm,
    ) -> Result<Submission, DomainError> {
        let author = self.current_user(requester).await?;
        let input = match self.clean_post_form(&form).await? {
            Ok(input) => input,
            Err(errors) => return Ok(Submission::Invalid(errors)),
        };

        let post = self.repos.posts.save(input.into_post(author.id)).await?;
        tracing::info!(post_id = %post.id, author_id = %author.id, "Post created");

        Ok(Submission::Redirect(Destination::Profile(author.username)))
    }

    pub async fn edit_post(
        &self,
        requester: Uuid,
        post_id: Uuid,
    ) -> Result<Outcome<PostForm>, DomainError> {
        let post = self.load_post(post_id).await?;
        if let Access::Denied(destination) = authorize(requester, &post) {
            return Ok(Outcome::Redirect(destination));
        }
        Ok(Outcome::Render(PostForm::from_post(&post)))
    }

    pub async fn update_post(
        &self,
        requester: Uuid,
        post_id: Uuid,
        form: PostForm,
    ) -> Result<Submission, DomainError> {
        let mut post = self.load_post(post_id).await?;
        if let Access::Denied(destination) = authorize(requester, &post) {
            return Ok(Submission::Redirect(destination));
        }

        let input = match self.clean_post_form(&form).await? {
            Ok(input) => input,
            Err(errors) => return Ok(Submission::Invalid(errors)),
        };
        input.apply_to(&mut post);
        let post = self.repos.posts.save(post).await?;
        tracing::info!(post_id = %post.id, "Post updated");

        Ok(Submission::Redirect(Destination::PostDetail(post.id)))
    }

    /// Confirmation page before deleting a post.
    pub async fn delete_post_confirm(
        &self,
        requester: Uuid,
        post_id: Uuid,
    ) -> Result<Outcome<Post>, DomainError> {
        let post = self.load_post(post_id).await?;
        match authorize(requester, &post) {
            Access::Granted => Ok(Outcome::Render(post)),
            Access::Denied(destination) => Ok(Outcome::Redirect(destination)),
        }
    }

    pub async fn delete_post(
        &self,
        requester: Uuid,
        post_id: Uuid,
    ) -> Result<Destination, DomainError> {
        let post = self.load_post(post_id).await?;
        if let Access::Denied(destination) = authorize(requester, &post) {
            return Ok(destination);
        }

        self.repos.posts.delete(post.id).await?;
        tracing::info!(post_id = %post.id, "Post deleted");
        Ok(Destination::Index)
    }

    /// Attach a comment by the requester to the post in the path.
    pub async fn add_comment(
        &self,
        requester: Uuid,
        post_id: Uuid,
        form: CommentForm,
    ) -> Result<Submission, DomainError> {
        let author = self.current_user(requester).await?;
        let post = self.load_post(post_id).await?;
        let text = match form.clean() {
            Ok(text) => text,
            Err(errors) => return Ok(Submission::Invalid(errors)),
        };

        let comment = self
            .repos
            .comments
            .save(Comment::new(post.id, author.id, text))
            .await?;
        tracing::info!(comment_id = %comment.id, post_id = %post.id, "Comment added");

        Ok(Submission::Redirect(Destination::PostDetail(post.id)))
    }

    pub async fn edit_comment(
        &self,
        requester: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Outcome<CommentForm>, DomainError> {
        let comment = self.load_comment(post_id, comment_id).await?;
        match authorize(requester, &comment) {
            Access::Granted => Ok(Outcome::Render(CommentForm { text: comment.text })),
            Access::Denied(destination) => Ok(Outcome::Redirect(destination)),
        }
    }

    pub async fn update_comment(
        &self,
        requester: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
        form: CommentForm,
    ) -> Result<Submission, DomainError> {
        let mut comment = self.load_comment(post_id, comment_id).await?;
        if let Access::Denied(destination) = authorize(requester, &comment) {
            return Ok(Submission::Redirect(destination));
        }

        comment.text = match form.clean() {
            Ok(text) => text,
            Err(errors) => return Ok(Submission::Invalid(errors)),
        };
        let comment = self.repos.comments.save(comment).await?;
        tracing::info!(comment_id = %comment.id, "Comment updated");

        Ok(Submission::Redirect(Destination::PostDetail(comment.post_id)))
    }

    pub async fn delete_comment_confirm(
        &self,
        requester: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Outcome<Comment>, DomainError> {
        let comment = self.load_comment(post_id, comment_id).await?;
        match authorize(requester, &comment) {
            Access::Granted => Ok(Outcome::Render(comment)),
            Access::Denied(destination) => Ok(Outcome::Redirect(destination)),
        }
    }

    pub async fn delete_comment(
        &self,
        requester: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Destination, DomainError> {
        let comment = self.load_comment(post_id, comment_id).await?;
        if let Access::Denied(destination) = authorize(requester, &comment) {
            return Ok(destination);
        }

        self.repos.comments.delete(comment.id).await?;
        tracing::info!(comment_id = %comment.id, "Comment deleted");
        Ok(Destination::PostDetail(comment.post_id))
    }

    /// The ownership guard on its own, for callers that must decide before
    /// reading a submitted body.
    pub async fn post_access(&self, requester: Uuid, post_id: Uuid) -> Result<Access, DomainError> {
        let post = self.load_post(post_id).await?;
        Ok(authorize(requester, &post))
    }

    pub async fn comment_access(
        &self,
        requester: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Access, DomainError> {
        let comment = self.load_comment(post_id, comment_id).await?;
        Ok(authorize(requester, &comment))
    }

    async fn current_user(&self, requester: Uuid) -> Result<User, DomainError> {
        self.repos
            .users
            .find_by_id(requester)
            .await?
            .ok_or(DomainError::Unauthorized)
    }

    async fn load_post(&self, post_id: Uuid) -> Result<Post, DomainError> {
        self.repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    /// A comment addressed through its post; a mismatching pair is not found.
    async fn load_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Comment, DomainError> {
        self.repos
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|comment| comment.post_id == post_id)
            .ok_or_else(|| DomainError::not_found("comment", comment_id))
    }

    /// Field validation plus existence of the referenced category and location.
    async fn clean_post_form(
        &self,
        form: &PostForm,
    ) -> Result<Result<PostInput, FormErrors>, DomainError> {
        let cleaned = form.clean();
        let mut errors = cleaned.as_ref().err().cloned().unwrap_or_default();

        if let Some(category_id) = form.category {
            if self.repos.categories.find_by_id(category_id).await?.is_none() {
                errors.add("category", INVALID_CHOICE);
            }
        }
        if let Some(location_id) = form.location {
            if self.repos.locations.find_by_id(location_id).await?.is_none() {
                errors.add("location", INVALID_CHOICE);
            }
        }

        Ok(match cleaned {
            Ok(input) if errors.is_empty() => Ok(input),
            _ => Err(errors),
        })
    }
}
