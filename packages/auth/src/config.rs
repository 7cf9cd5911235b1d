// ABOUTME: Identity provider configuration for the OAuth flows
// ABOUTME: Built once at startup and passed into the token manager and login flow

/// Default port for the local OAuth callback listener.
pub const DEFAULT_CALLBACK_PORT: u16 = 3737;

/// Azure Entra ID requires an `Origin` header on token requests made by
/// app registrations configured as Single Page Applications. The value
/// is irrelevant; the header just has to be present.
pub const DEFAULT_ORIGIN: &str = "does-not-matter-but-is-required";

/// Identity provider endpoints and client identity.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub authorize_url: String,
    pub token_url: String,
    pub callback_port: u16,
    /// Sent as the `Origin` header on every token endpoint request.
    pub origin: String,
    /// Scopes requested during interactive login.
    pub login_scopes: Vec<String>,
}

impl ProviderConfig {
    /// Configuration for an Azure Entra ID tenant and app registration.
    pub fn entra(tenant_id: &str, client_id: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            authorize_url: format!(
                "https://login.microsoftonline.com/{tenant_id}/oauth2/v2.0/authorize"
            ),
            token_url: format!(
                "https://login.microsoftonline.com/{tenant_id}/oauth2/v2.0/token"
            ),
            callback_port: DEFAULT_CALLBACK_PORT,
            origin: DEFAULT_ORIGIN.to_string(),
            login_scopes: vec!["openid".to_string()],
        }
    }
}
