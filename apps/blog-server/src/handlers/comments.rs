//! Comment pages. Comments are always addressed through their post.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::Outcome;
use blogicum_core::access::Access;
use blogicum_core::forms::CommentForm;
use blogicum_shared::dto::FormResponse;

use super::{parse_form, redirect, submitted};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /posts/{post_id}/comment/
pub async fn add(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    body: web::Json<CommentForm>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    let submission = state
        .blog
        .add_comment(identity.user_id, *post_id, form.clone())
        .await?;
    Ok(submitted(submission, form))
}

/// GET /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    Ok(
        match state.blog.edit_comment(identity.user_id, post_id, comment_id).await? {
            Outcome::Render(form) => HttpResponse::Ok().json(FormResponse::<CommentForm, ()> {
                form,
                instance: None,
            }),
            Outcome::Redirect(destination) => redirect(&destination),
        },
    )
}

/// POST /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    if let Access::Denied(destination) = state
        .blog
        .comment_access(identity.user_id, post_id, comment_id)
        .await?
    {
        return Ok(redirect(&destination));
    }
    let form: CommentForm = parse_form(&body)?;
    let submission = state
        .blog
        .update_comment(identity.user_id, post_id, comment_id, form.clone())
        .await?;
    Ok(submitted(submission, form))
}

/// GET /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete_confirm(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    Ok(
        match state
            .blog
            .delete_comment_confirm(identity.user_id, post_id, comment_id)
            .await?
        {
            Outcome::Render(comment) => HttpResponse::Ok().json(FormResponse {
                form: CommentForm {
                    text: comment.text.clone(),
                },
                instance: Some(comment),
            }),
            Outcome::Redirect(destination) => redirect(&destination),
        },
    )
}

/// POST /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let destination = state
        .blog
        .delete_comment(identity.user_id, post_id, comment_id)
        .await?;
    Ok(redirect(&destination))
}
