// ABOUTME: HTTP client for the provider's token endpoint
// ABOUTME: Handles refresh grants, delegated scope exchanges, and the login code exchange

use reqwest::Client;
use tracing::debug;

use crate::{
    config::ProviderConfig,
    error::{AuthError, AuthResult},
    oauth::types::TokenResponse,
    store::Token,
};

/// Issues token endpoint requests. Every request carries the fixed
/// `Origin` header from the provider configuration; the provider
/// rejects token requests without it.
pub struct TokenClient {
    config: ProviderConfig,
    http: Client,
}

impl TokenClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn token_request(&self) -> reqwest::RequestBuilder {
        self.http
            .post(&self.config.token_url)
            .header("Origin", &self.config.origin)
    }

    /// Exchange the held refresh token for a new access token.
    ///
    /// A still-fresh token is returned as-is without a network call, so
    /// repeated lookups against a valid cache entry stay local. Fails
    /// with [`AuthError::RefreshFailed`] when no refresh token is held
    /// or the provider rejects the grant; callers treat that as a cache
    /// miss, not a fatal condition.
    pub async fn refresh(&self, token: &Token) -> AuthResult<Token> {
        if token.is_fresh() {
            return Ok(token.clone());
        }
        if !token.has_refresh_token() {
            return Err(AuthError::RefreshFailed("no refresh token held".to_string()));
        }

        debug!("refreshing token against {}", self.config.token_url);
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", token.refresh_token.as_str()),
            ("client_id", self.config.client_id.as_str()),
        ];

        let response = self
            .token_request()
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::RefreshFailed(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::RefreshFailed(format!("malformed token response: {e}")))?;

        Ok(body.into_token(Some(&token.refresh_token)))
    }

    /// Refresh-token grant with a substituted scope, producing a token
    /// for a specific audience.
    pub async fn exchange_delegated(&self, refresh_token: &str, scope: &str) -> AuthResult<Token> {
        debug!("requesting delegated token for scope {scope}");
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("scope", scope),
            ("client_id", self.config.client_id.as_str()),
        ];

        let response = self
            .token_request()
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::ExchangeFailed(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::ExchangeFailed(format!("malformed token response: {e}")))?;

        Ok(body.into_token(None))
    }

    /// Authorization-code-for-token exchange, presenting the PKCE verifier.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> AuthResult<Token> {
        debug!("exchanging authorization code for token");
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("code_verifier", code_verifier),
            ("redirect_uri", redirect_uri),
            ("client_id", self.config.client_id.as_str()),
        ];

        let response = self
            .token_request()
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::LoginFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::LoginFailed(format!(
                "code exchange returned {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::LoginFailed(format!("malformed token response: {e}")))?;

        Ok(body.into_token(None))
    }
}
