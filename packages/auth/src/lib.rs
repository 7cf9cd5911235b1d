// ABOUTME: padcli authentication library providing the OAuth credential lifecycle
// ABOUTME: Interactive PKCE login, persistent token store, and delegated token exchange

pub mod config;
pub mod error;
pub mod oauth;
pub mod store;

// Re-export main types
pub use config::{ProviderConfig, DEFAULT_CALLBACK_PORT, DEFAULT_ORIGIN};
pub use error::{AuthError, AuthResult};
pub use oauth::{
    CallbackServer, InteractiveLogin, LoginFlow, PkceChallenge, TokenClient, TokenManager,
    TokenResponse, TokenSource,
};
pub use store::{StoreFile, Token, TokenStore};
