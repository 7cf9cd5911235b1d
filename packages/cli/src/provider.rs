// ABOUTME: Process-wide provider configuration for the padcli binary
// ABOUTME: Built once at startup from environment overrides or the baked-in tenant

use std::env;

use padcli_auth::{AuthResult, ProviderConfig, StoreFile, TokenManager};

// Tenant and app registration of the padcli deployment. The app
// registration must be the Single Page Application variant so the
// PKCE flow is permitted.
const DEFAULT_TENANT_ID: &str = "b7f3a2c4-8d15-4e9a-b1c6-0f2d7e5a9c31";
const DEFAULT_CLIENT_ID: &str = "4e81d9f6-2a7b-4c3e-9d58-6b1f0c4a8e72";

pub fn provider_config() -> ProviderConfig {
    let tenant_id =
        env::var("PADCLI_TENANT_ID").unwrap_or_else(|_| DEFAULT_TENANT_ID.to_string());
    let client_id =
        env::var("PADCLI_CLIENT_ID").unwrap_or_else(|_| DEFAULT_CLIENT_ID.to_string());
    ProviderConfig::entra(&tenant_id, &client_id)
}

pub fn default_manager() -> AuthResult<TokenManager> {
    let store_file = StoreFile::at_default()?;
    Ok(TokenManager::new(provider_config(), store_file))
}
