//! Domain values rendered as response DTOs.

use blogicum_core::domain::{Author, Category, CommentEntry, Location, PostEntry, User};
use blogicum_core::pagination::Page;
use blogicum_shared::dto::{
    AuthorResponse, CategoryResponse, CommentResponse, LocationResponse, PageResponse,
    PostResponse, UserResponse,
};

pub fn author(author: &Author) -> AuthorResponse {
    let full_name = format!("{} {}", author.first_name, author.last_name);
    AuthorResponse {
        id: author.id,
        username: author.username.clone(),
        full_name: full_name.trim().to_string(),
    }
}

/// A user profile. The email is only shown to the account itself.
pub fn user(user: &User, with_email: bool) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: with_email.then(|| user.email.clone()),
        date_joined: user.created_at,
    }
}

pub fn category(category: &Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        title: category.title.clone(),
        description: category.description.clone(),
        slug: category.slug.clone(),
    }
}

pub fn location(location: &Location) -> LocationResponse {
    LocationResponse {
        id: location.id,
        name: location.name.clone(),
    }
}

pub fn post(entry: &PostEntry) -> PostResponse {
    let post = &entry.post;
    PostResponse {
        id: post.id,
        title: post.title.clone(),
        text: post.text.clone(),
        image: post.image.clone(),
        pub_date: post.pub_date,
        is_published: post.is_published,
        created_at: post.created_at,
        author: author(&entry.author),
        category: entry.category.as_ref().map(category),
        location: entry.location.as_ref().map(location),
        comment_count: entry.comment_count,
    }
}

pub fn comment(entry: &CommentEntry) -> CommentResponse {
    CommentResponse {
        id: entry.comment.id,
        post_id: entry.comment.post_id,
        text: entry.comment.text.clone(),
        created_at: entry.comment.created_at,
        author: author(&entry.author),
    }
}

pub fn page(page: &Page<PostEntry>) -> PageResponse<PostResponse> {
    PageResponse {
        items: page.items.iter().map(post).collect(),
        number: page.number,
        total_pages: page.total_pages,
        total_items: page.total_items,
        has_next: page.has_next(),
        has_previous: page.has_previous(),
    }
}
