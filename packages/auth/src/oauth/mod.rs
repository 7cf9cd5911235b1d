// ABOUTME: OAuth module providing the credential lifecycle flows
// ABOUTME: Includes PKCE, the callback listener, token endpoint client, login, and the manager

pub mod client;
pub mod login;
pub mod manager;
pub mod pkce;
pub mod server;
pub mod types;

pub use client::TokenClient;
pub use login::{InteractiveLogin, LoginFlow};
pub use manager::{fallback_order, TokenManager, TokenSource};
pub use server::CallbackServer;
pub use types::{PkceChallenge, TokenResponse};
