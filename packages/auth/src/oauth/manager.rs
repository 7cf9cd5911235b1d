// ABOUTME: Token manager walking the delegated-token fallback chain
// ABOUTME: Tries the cached delegated token, then a primary refresh, then interactive login

use tracing::{debug, info};

use crate::{
    config::ProviderConfig,
    error::{AuthError, AuthResult},
    oauth::{
        client::TokenClient,
        login::{InteractiveLogin, LoginFlow},
    },
    store::{StoreFile, Token, TokenStore},
};

/// Tier of the fallback chain a delegated token can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    CachedDelegated,
    PrimaryRefresh,
    InteractiveLogin,
}

/// Deterministic order in which the tiers are attempted. Cache validity
/// is favored over freshness of the primary session, so a cached entry
/// is always tried first when one exists.
pub fn fallback_order(has_cached_entry: bool) -> &'static [TokenSource] {
    if has_cached_entry {
        &[
            TokenSource::CachedDelegated,
            TokenSource::PrimaryRefresh,
            TokenSource::InteractiveLogin,
        ]
    } else {
        &[TokenSource::PrimaryRefresh, TokenSource::InteractiveLogin]
    }
}

/// Front door of the credential subsystem: loads the persistent store,
/// hands out audience-scoped delegated tokens, and falls back to the
/// interactive login when nothing cached can be refreshed.
pub struct TokenManager {
    client: TokenClient,
    store_file: StoreFile,
    login: Box<dyn LoginFlow>,
}

impl TokenManager {
    pub fn new(config: ProviderConfig, store_file: StoreFile) -> Self {
        let login = Box::new(InteractiveLogin::new(config.clone()));
        Self {
            client: TokenClient::new(config),
            store_file,
            login,
        }
    }

    /// Substitute the login flow. Tests use this to count invocations
    /// without opening a browser.
    pub fn with_login(
        config: ProviderConfig,
        store_file: StoreFile,
        login: Box<dyn LoginFlow>,
    ) -> Self {
        Self {
            client: TokenClient::new(config),
            store_file,
            login,
        }
    }

    /// Run the interactive login and persist the new primary token
    /// immediately.
    pub async fn login(&self) -> AuthResult<Token> {
        let mut store = self.store_file.load().await?;
        let token = self.login.login().await?;
        store.upsert_primary(token.clone());
        self.store_file.save(&store).await?;
        Ok(token)
    }

    /// Return a valid token scoped to `identifier`, walking the
    /// fallback chain in order. Only refresh failures fall through to
    /// the next tier; exchange and login failures propagate.
    pub async fn get_delegated_token(&self, identifier: &str, scope: &str) -> AuthResult<Token> {
        let mut store = self.store_file.load().await?;

        for source in fallback_order(store.delegated(identifier).is_some()) {
            match self.acquire(*source, &mut store, identifier, scope).await {
                Ok(token) => {
                    debug!(identifier, source = ?source, "delegated token acquired");
                    return Ok(token);
                }
                Err(AuthError::RefreshFailed(reason)) => {
                    debug!(identifier, source = ?source, "tier unavailable: {reason}");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AuthError::LoginFailed(
            "no token source could produce a delegated token".to_string(),
        ))
    }

    async fn acquire(
        &self,
        source: TokenSource,
        store: &mut TokenStore,
        identifier: &str,
        scope: &str,
    ) -> AuthResult<Token> {
        match source {
            TokenSource::CachedDelegated => {
                let cached = store.delegated(identifier).cloned().ok_or_else(|| {
                    AuthError::RefreshFailed("no cached delegated token".to_string())
                })?;
                self.client.refresh(&cached).await
            }
            TokenSource::PrimaryRefresh => {
                let primary = self.client.refresh(&store.primary).await?;
                self.issue_delegated(store, identifier, scope, &primary).await
            }
            TokenSource::InteractiveLogin => {
                info!("no refreshable session; starting interactive login");
                let primary = self.login.login().await?;
                store.upsert_primary(primary.clone());
                self.store_file.save(store).await?;
                self.issue_delegated(store, identifier, scope, &primary).await
            }
        }
    }

    /// Derive a delegated token from a valid primary session, cache it,
    /// and persist the store before returning.
    async fn issue_delegated(
        &self,
        store: &mut TokenStore,
        identifier: &str,
        scope: &str,
        primary: &Token,
    ) -> AuthResult<Token> {
        let token = self
            .client
            .exchange_delegated(&primary.refresh_token, scope)
            .await?;

        store.upsert_delegated(identifier, token.clone());
        self.store_file.save(store).await?;
        Ok(token)
    }
}
