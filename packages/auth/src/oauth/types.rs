// ABOUTME: Wire types for the OAuth token endpoint
// ABOUTME: Includes the token response shape and the PKCE challenge type

use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::store::Token;

/// Conservative validity assumed when the provider omits an expiry.
/// Bounds blind trust without forcing an immediate re-exchange.
pub const IMPUTED_VALIDITY_SECS: i64 = 3600;

/// Token endpoint response body for all grant types.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenResponse {
    /// Convert into a stored [`Token`], stamping an absolute expiry.
    ///
    /// Providers may omit the refresh token when it is not rotated;
    /// `previous_refresh` keeps the one already held in that case.
    pub fn into_token(self, previous_refresh: Option<&str>) -> Token {
        let expires_in = match self.expires_in {
            Some(secs) if secs > 0 => secs,
            _ => IMPUTED_VALIDITY_SECS,
        };

        Token {
            access_token: self.access_token,
            token_type: self.token_type,
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string))
                .unwrap_or_default(),
            expiry: Utc::now() + Duration::seconds(expires_in),
            expires_in,
        }
    }
}

/// PKCE challenge material for the authorization code flow.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
}
