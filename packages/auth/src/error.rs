// ABOUTME: Error types for the credential lifecycle subsystem
// ABOUTME: Covers store I/O, token refresh/exchange failures, and the interactive login flow

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("token store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed token data: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("delegated token exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("interactive login failed: {0}")]
    LoginFailed(String),

    #[error("canceled while waiting for authorization")]
    Canceled,

    #[error("callback server error: {0}")]
    CallbackServer(String),

    #[error("state mismatch: CSRF protection failed")]
    StateMismatch,

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("PKCE error: {0}")]
    Pkce(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}
