//! Registration, login and the current account.

use std::sync::Arc;

use actix_web::{HttpResponse, web};

use blogicum_core::domain::User;
use blogicum_core::forms::{FormErrors, USERNAME_MAX_CHARS, is_valid_username, looks_like_email};
use blogicum_core::ports::{BaseRepository, PasswordService, TokenService, UserRepository};
use blogicum_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest};

use super::present;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const MIN_PASSWORD_CHARS: usize = 8;

fn validate_registration(req: &RegisterUserRequest) -> Result<(), FormErrors> {
    let mut errors = FormErrors::new();
    let username = req.username.trim();

    if username.is_empty() {
        errors.add("username", "This field is required.");
    } else if username.chars().count() > USERNAME_MAX_CHARS || !is_valid_username(username) {
        errors.add(
            "username",
            "Enter a valid username of at most 150 letters, digits and @/./+/-/_ characters.",
        );
    }
    if !req.email.is_empty() && !looks_like_email(&req.email) {
        errors.add("email", "Enter a valid email address.");
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        errors.add("password", "Password must be at least 8 characters.");
    }

    errors.finish(())
}

fn issue_token(token_service: &dyn TokenService, user: &User) -> AppResult<AuthResponse> {
    let token = token_service
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: token_service.expiration_seconds().max(0) as u64,
    })
}

/// POST /auth/registration/
pub async fn register(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    validate_registration(&req).map_err(AppError::Validation)?;

    let username = req.username.trim();
    if state.users.find_by_username(username).await?.is_some() {
        return Err(AppError::Conflict(
            "A user with that username already exists.".to_string(),
        ));
    }

    let password_hash = password_service
        .hash(&req.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = state
        .users
        .save(User::new(username.to_string(), req.email, password_hash))
        .await?;
    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(HttpResponse::Created().json(issue_token(token_service.get_ref().as_ref(), &user)?))
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = password_service
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        return Err(AppError::Unauthorized);
    }

    Ok(HttpResponse::Ok().json(issue_token(token_service.get_ref().as_ref(), &user)?))
}

/// GET /auth/me/
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(HttpResponse::Ok().json(present::user(&user, true)))
}
