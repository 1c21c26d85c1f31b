//! Listings, post detail and the post create/edit/delete pages.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::forms::PostForm;
use blogicum_core::Outcome;
use blogicum_core::access::Access;
use blogicum_shared::dto::{CategoryPageResponse, FormResponse, IndexResponse, PostDetailResponse};

use super::{PageQuery, parse_form, present, redirect, submitted};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state.blog.index(query.request()).await?;
    Ok(HttpResponse::Ok().json(IndexResponse {
        page_obj: present::page(&page),
    }))
}

/// GET /category/{slug}/
pub async fn category_posts(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let listing = state.blog.category_posts(&slug, query.request()).await?;
    Ok(HttpResponse::Ok().json(CategoryPageResponse {
        category: present::category(&listing.category),
        page_obj: present::page(&listing.page),
    }))
}

/// GET /posts/{post_id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let detail = state.blog.post_detail(identity.user_id(), *post_id).await?;
    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post: present::post(&detail.entry),
        comments: detail.comments.iter().map(present::comment).collect(),
        form: detail.form,
    }))
}

/// GET /posts/create/
pub async fn create_form(_identity: Identity) -> HttpResponse {
    HttpResponse::Ok().json(FormResponse::<PostForm, ()> {
        form: PostForm::default(),
        instance: None,
    })
}

/// POST /posts/create/
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    tracing::debug!(username = %identity.username, "Creating post");
    let submission = state.blog.create_post(identity.user_id, form.clone()).await?;
    Ok(submitted(submission, form))
}

/// GET /posts/{post_id}/edit/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    Ok(match state.blog.edit_post(identity.user_id, *post_id).await? {
        Outcome::Render(form) => HttpResponse::Ok().json(FormResponse::<PostForm, ()> {
            form,
            instance: None,
        }),
        Outcome::Redirect(destination) => redirect(&destination),
    })
}

/// POST /posts/{post_id}/edit/
///
/// The body is only decoded once the requester is known to be the author.
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    if let Access::Denied(destination) =
        state.blog.post_access(identity.user_id, *post_id).await?
    {
        return Ok(redirect(&destination));
    }
    let form: PostForm = parse_form(&body)?;
    let submission = state
        .blog
        .update_post(identity.user_id, *post_id, form.clone())
        .await?;
    Ok(submitted(submission, form))
}

/// GET /posts/{post_id}/delete/
pub async fn delete_confirm(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    Ok(match state.blog.delete_post_confirm(identity.user_id, *post_id).await? {
        Outcome::Render(post) => HttpResponse::Ok().json(FormResponse {
            form: PostForm::from_post(&post),
            instance: Some(post),
        }),
        Outcome::Redirect(destination) => redirect(&destination),
    })
}

/// POST /posts/{post_id}/delete/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let destination = state.blog.delete_post(identity.user_id, *post_id).await?;
    Ok(redirect(&destination))
}
