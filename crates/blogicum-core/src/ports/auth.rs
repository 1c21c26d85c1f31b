//! Ports for signing in authors.

use uuid::Uuid;

/// Who a session token belongs to.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub username: String,
    pub exp: i64,
}

/// Issues and checks the session token a signed-in author carries.
pub trait TokenService: Send + Sync {
    fn generate_token(&self, user_id: Uuid, username: &str) -> Result<String, AuthError>;

    /// Resolve a token back to its author. Expired tokens yield `TokenExpired`.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Seconds a freshly issued session stays valid.
    fn expiration_seconds(&self) -> i64;
}

/// Stores and checks author passwords.
pub trait PasswordService: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// `Ok(false)` for a wrong password; `Err` only when the stored hash is unreadable.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Wrong username or password")]
    InvalidCredentials,

    #[error("Session expired")]
    TokenExpired,

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Sign in required")]
    MissingAuth,

    #[error("Password hashing failed: {0}")]
    HashingError(String),
}
