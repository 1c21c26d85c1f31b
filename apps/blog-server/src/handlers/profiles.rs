//! Profile listing and account editing.

use actix_web::{HttpResponse, web};

use blogicum_core::forms::ProfileForm;
use blogicum_shared::dto::{FormResponse, ProfilePageResponse};

use super::{PageQuery, present, submitted};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let requester = identity.user_id();
    let listing = state
        .blog
        .profile(requester, &username, query.request())
        .await?;
    let is_owner = requester == Some(listing.profile.id);

    Ok(HttpResponse::Ok().json(ProfilePageResponse {
        profile: present::user(&listing.profile, is_owner),
        page_obj: present::page(&listing.page),
    }))
}

/// GET /edit_profile/
pub async fn edit_form(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let form = state.blog.profile_form(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(FormResponse::<ProfileForm, ()> {
        form,
        instance: None,
    }))
}

/// POST /edit_profile/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<ProfileForm>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    let submission = state.blog.edit_profile(identity.user_id, form.clone()).await?;
    Ok(submitted(submission, form))
}
