//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod health;
mod posts;
mod present;
mod profiles;

use actix_web::http::header;
use actix_web::{HttpResponse, web};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use blogicum_core::Submission;
use blogicum_core::access::Destination;
use blogicum_core::pagination::PageRequest;
use blogicum_shared::dto::InvalidFormResponse;

use crate::middleware::error::{AppError, AppResult};

/// `?page=` as typed by the client; anything unparsable means the first page.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::from_param(self.page.as_deref())
    }
}

/// 302 to the page a flow ends on.
pub(crate) fn redirect(destination: &Destination) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, destination.path()))
        .finish()
}

/// Answer a form submission: follow the redirect, or hand the submitted
/// values back with the field errors.
pub(crate) fn submitted<F: Serialize>(submission: Submission, form: F) -> HttpResponse {
    match submission {
        Submission::Redirect(destination) => redirect(&destination),
        Submission::Invalid(errors) => {
            HttpResponse::UnprocessableEntity().json(InvalidFormResponse { form, errors })
        }
    }
}

/// Decode a form body read as raw bytes. Author-only endpoints call this
/// after the ownership guard, so a non-author never sees a parse error.
pub(crate) fn parse_form<F: DeserializeOwned>(body: &[u8]) -> AppResult<F> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid form body: {e}")))
}

/// Malformed JSON bodies get a problem document instead of plain text.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(health::health_check))
        .service(
            web::scope("/auth")
                .route("/registration/", web::post().to(auth::register))
                .route("/login/", web::post().to(auth::login))
                .route("/me/", web::get().to(auth::me)),
        )
        .route("/", web::get().to(posts::index))
        .route("/category/{slug}/", web::get().to(posts::category_posts))
        // Must precede `/posts/{post_id}/`.
        .service(
            web::resource("/posts/create/")
                .route(web::get().to(posts::create_form))
                .route(web::post().to(posts::create)),
        )
        .route("/posts/{post_id}/", web::get().to(posts::post_detail))
        .service(
            web::resource("/posts/{post_id}/edit/")
                .route(web::get().to(posts::edit_form))
                .route(web::post().to(posts::edit)),
        )
        .service(
            web::resource("/posts/{post_id}/delete/")
                .route(web::get().to(posts::delete_confirm))
                .route(web::post().to(posts::delete)),
        )
        .route("/posts/{post_id}/comment/", web::post().to(comments::add))
        .service(
            web::resource("/posts/{post_id}/edit_comment/{comment_id}/")
                .route(web::get().to(comments::edit_form))
                .route(web::post().to(comments::edit)),
        )
        .service(
            web::resource("/posts/{post_id}/delete_comment/{comment_id}/")
                .route(web::get().to(comments::delete_confirm))
                .route(web::post().to(comments::delete)),
        )
        .route("/profile/{username}/", web::get().to(profiles::profile))
        .service(
            web::resource("/edit_profile/")
                .route(web::get().to(profiles::edit_form))
                .route(web::post().to(profiles::edit)),
        );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use chrono::{TimeDelta, Utc};
    use serde_json::{Value, json};
    use uuid::Uuid;

    use blogicum_core::domain::{Category, Comment, Post, User};
    use blogicum_core::ports::{BaseRepository, PasswordService, TokenService};
    use blogicum_core::Repositories;
    use blogicum_infra::{Argon2PasswordService, InMemoryStore, JwtConfig, JwtTokenService};

    use super::*;
    use crate::state::AppState;

    struct Harness {
        repos: Repositories,
        tokens: Arc<dyn TokenService>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                repos: InMemoryStore::new().repositories(),
                tokens: Arc::new(JwtTokenService::new(JwtConfig::default())),
            }
        }

        async fn user(&self, username: &str) -> (User, String) {
            let user = self
                .repos
                .users
                .save(User::new(username.into(), String::new(), "hash".into()))
                .await
                .unwrap();
            let token = self.tokens.generate_token(user.id, &user.username).unwrap();
            (user, format!("Bearer {token}"))
        }

        async fn post(&self, author: &User, offset_hours: i64) -> Post {
            let post = Post::new(
                author.id,
                "Baikal".into(),
                "Ice".into(),
                Utc::now() + TimeDelta::hours(offset_hours),
            );
            self.repos.posts.save(post).await.unwrap()
        }

        async fn category(&self, slug: &str, is_published: bool) -> Category {
            let mut category = Category::new("Travel".into(), "Trips".into(), slug.into());
            category.is_published = is_published;
            self.repos.categories.save(category).await.unwrap()
        }
    }

    macro_rules! app {
        ($harness:expr) => {{
            let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppState::from_repositories(
                        $harness.repos.clone(),
                    )))
                    .app_data(web::Data::new($harness.tokens.clone()))
                    .app_data(web::Data::new(passwords))
                    .app_data(json_config())
                    .configure(configure_routes),
            )
            .await
        }};
    }

    fn location(resp: &actix_web::dev::ServiceResponse) -> &str {
        resp.headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    #[actix_rt::test]
    async fn test_health_check() {
        let harness = Harness::new();
        let app = app!(harness);

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "ok");
    }

    #[actix_rt::test]
    async fn test_index_treats_garbage_page_as_first() {
        let harness = Harness::new();
        let (anna, _) = harness.user("anna").await;
        for _ in 0..12 {
            harness.post(&anna, -1).await;
        }
        let app = app!(harness);

        let req = test::TestRequest::get().uri("/?page=abc").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["page_obj"]["number"], 1);
        assert_eq!(body["page_obj"]["items"].as_array().unwrap().len(), 10);
        assert_eq!(body["page_obj"]["has_next"], true);
        assert_eq!(body["page_obj"]["items"][0]["comment_count"], 0);

        let req = test::TestRequest::get().uri("/?page=40").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["page_obj"]["number"], 2);
        assert_eq!(body["page_obj"]["items"].as_array().unwrap().len(), 2);
    }

    #[actix_rt::test]
    async fn test_unpublished_category_is_404() {
        let harness = Harness::new();
        harness.category("hidden", false).await;
        harness.category("open", true).await;
        let app = app!(harness);

        let req = test::TestRequest::get().uri("/category/hidden/").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/category/open/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["category"]["slug"], "open");
    }

    #[actix_rt::test]
    async fn test_create_requires_login() {
        let harness = Harness::new();
        let app = app!(harness);

        let req = test::TestRequest::post()
            .uri("/posts/create/")
            .set_json(json!({"title": "t", "text": "t"}))
            .to_request();

        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_create_post_redirects_to_profile() {
        let harness = Harness::new();
        let (_, auth) = harness.user("anna").await;
        let category = harness.category("travel", true).await;
        let app = app!(harness);

        let req = test::TestRequest::post()
            .uri("/posts/create/")
            .insert_header((header::AUTHORIZATION, auth))
            .set_json(json!({
                "title": "Baikal",
                "text": "Ice",
                "pub_date": "2023-07-13",
                "category": category.id,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/profile/anna/");
    }

    #[actix_rt::test]
    async fn test_invalid_post_form_echoes_errors() {
        let harness = Harness::new();
        let (_, auth) = harness.user("anna").await;
        let app = app!(harness);

        let req = test::TestRequest::post()
            .uri("/posts/create/")
            .insert_header((header::AUTHORIZATION, auth))
            .set_json(json!({"text": "no title"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["form"]["text"], "no title");
        assert!(body["errors"]["title"].is_array());
        assert!(body["errors"]["category"].is_array());
    }

    #[actix_rt::test]
    async fn test_non_author_edit_redirects_to_detail() {
        let harness = Harness::new();
        let (anna, _) = harness.user("anna").await;
        let (_, boris_auth) = harness.user("boris").await;
        let post = harness.post(&anna, -1).await;
        let app = app!(harness);

        for uri in [
            format!("/posts/{}/edit/", post.id),
            format!("/posts/{}/delete/", post.id),
        ] {
            let req = test::TestRequest::get()
                .uri(&uri)
                .insert_header((header::AUTHORIZATION, boris_auth.clone()))
                .to_request();
            let resp = test::call_service(&app, req).await;

            assert_eq!(resp.status(), StatusCode::FOUND);
            assert_eq!(location(&resp), format!("/posts/{}/", post.id));
        }

        let req = test::TestRequest::post()
            .uri(&format!("/posts/{}/delete/", post.id))
            .insert_header((header::AUTHORIZATION, boris_auth))
            .to_request();
        test::call_service(&app, req).await;
        assert!(harness.repos.posts.find_by_id(post.id).await.unwrap().is_some());
    }

    #[actix_rt::test]
    async fn test_scheduled_post_detail() {
        let harness = Harness::new();
        let (anna, anna_auth) = harness.user("anna").await;
        let post = harness.post(&anna, 1).await;
        let app = app!(harness);
        let uri = format!("/posts/{}/", post.id);

        let req = test::TestRequest::get().uri(&uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header((header::AUTHORIZATION, anna_auth))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["post"]["id"], json!(post.id));
        assert_eq!(body["form"]["text"], "");
    }

    #[actix_rt::test]
    async fn test_unknown_and_malformed_post_ids_are_404() {
        let harness = Harness::new();
        let app = app!(harness);

        for uri in [format!("/posts/{}/", Uuid::new_v4()), "/posts/not-a-uuid/".to_string()] {
            let req = test::TestRequest::get().uri(&uri).to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        }
    }

    #[actix_rt::test]
    async fn test_foreign_comment_edit_keeps_text() {
        let harness = Harness::new();
        let (anna, anna_auth) = harness.user("anna").await;
        let (boris, _) = harness.user("boris").await;
        let post = harness.post(&anna, -1).await;
        let comment = harness
            .repos
            .comments
            .save(Comment::new(post.id, boris.id, "first!".into()))
            .await
            .unwrap();
        let app = app!(harness);

        let req = test::TestRequest::post()
            .uri(&format!("/posts/{}/edit_comment/{}/", post.id, comment.id))
            .insert_header((header::AUTHORIZATION, anna_auth))
            .set_json(json!({"text": "rewritten"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), format!("/posts/{}/", post.id));
        let stored = harness.repos.comments.find_by_id(comment.id).await.unwrap().unwrap();
        assert_eq!(stored.text, "first!");
    }

    #[actix_rt::test]
    async fn test_profile_hides_email_from_others() {
        let harness = Harness::new();
        let (anna, anna_auth) = harness.user("anna").await;
        harness.post(&anna, 2).await;
        let app = app!(harness);

        let req = test::TestRequest::get().uri("/profile/anna/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["profile"].get("email").is_none());
        assert_eq!(body["page_obj"]["total_items"], 0);

        let req = test::TestRequest::get()
            .uri("/profile/anna/")
            .insert_header((header::AUTHORIZATION, anna_auth))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["profile"]["email"], "");
        assert_eq!(body["page_obj"]["total_items"], 1);
    }

    #[actix_rt::test]
    async fn test_register_login_me() {
        let harness = Harness::new();
        let app = app!(harness);

        let req = test::TestRequest::post()
            .uri("/auth/registration/")
            .set_json(json!({"username": "anna", "email": "anna@example.com", "password": "s3cret-pass"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/auth/registration/")
            .set_json(json!({"username": "anna", "password": "another-pass"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post()
            .uri("/auth/login/")
            .set_json(json!({"username": "anna", "password": "wrong-pass"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/auth/login/")
            .set_json(json!({"username": "anna", "password": "s3cret-pass"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let token = body["access_token"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/auth/me/")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["username"], "anna");
        assert_eq!(body["email"], "anna@example.com");
    }

    #[actix_rt::test]
    async fn test_non_author_with_unreadable_body_is_redirected() {
        let harness = Harness::new();
        let (anna, _) = harness.user("anna").await;
        let (_, boris_auth) = harness.user("boris").await;
        let post = harness.post(&anna, -1).await;
        let comment = harness
            .repos
            .comments
            .save(Comment::new(post.id, anna.id, "mine".into()))
            .await
            .unwrap();
        let app = app!(harness);
        let detail = format!("/posts/{}/", post.id);

        let req = test::TestRequest::post()
            .uri(&format!("/posts/{}/edit/", post.id))
            .insert_header((header::AUTHORIZATION, boris_auth.clone()))
            .set_json(json!({"category": "travel"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), detail);

        let req = test::TestRequest::post()
            .uri(&format!("/posts/{}/edit_comment/{}/", post.id, comment.id))
            .insert_header((header::AUTHORIZATION, boris_auth))
            .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
            .set_payload("text=hacked")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), detail);

        let stored = harness.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored, post);
        let stored = harness.repos.comments.find_by_id(comment.id).await.unwrap().unwrap();
        assert_eq!(stored.text, "mine");
    }

    #[actix_rt::test]
    async fn test_author_with_unreadable_body_gets_bad_request() {
        let harness = Harness::new();
        let (anna, anna_auth) = harness.user("anna").await;
        let post = harness.post(&anna, -1).await;
        let app = app!(harness);

        let req = test::TestRequest::post()
            .uri(&format!("/posts/{}/edit/", post.id))
            .insert_header((header::AUTHORIZATION, anna_auth.clone()))
            .set_json(json!({"category": "travel"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], 400);

        let req = test::TestRequest::post()
            .uri("/posts/create/")
            .insert_header((header::AUTHORIZATION, anna_auth))
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["title"], "Bad Request");
    }

    #[actix_rt::test]
    async fn test_short_password_is_rejected() {
        let harness = Harness::new();
        let app = app!(harness);

        let req = test::TestRequest::post()
            .uri("/auth/registration/")
            .set_json(json!({"username": "anna", "password": "short"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["errors"]["password"].is_array());
    }
}
