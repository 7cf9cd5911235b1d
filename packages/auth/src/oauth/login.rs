// ABOUTME: Interactive Authorization-Code-with-PKCE login flow
// ABOUTME: Runs listener, browser, and exchange phases under one cancellation scope

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use crate::{
    config::ProviderConfig,
    error::{AuthError, AuthResult},
    oauth::{
        client::TokenClient,
        pkce::generate_pkce_challenge,
        server::CallbackServer,
        types::PkceChallenge,
    },
    store::Token,
};

/// Seam for the interactive login so the fallback chain can be tested
/// with a double instead of a browser.
#[async_trait]
pub trait LoginFlow: Send + Sync {
    async fn login(&self) -> AuthResult<Token>;
}

/// The real login flow: local callback listener, browser redirect, and
/// authorization-code exchange, joined under a shared cancellation
/// token. The first phase to fail cancels the others; all phases have
/// completed when `login` returns.
pub struct InteractiveLogin {
    config: ProviderConfig,
    client: TokenClient,
    cancel: CancellationToken,
}

impl InteractiveLogin {
    pub fn new(config: ProviderConfig) -> Self {
        let client = TokenClient::new(config.clone());
        Self {
            config,
            client,
            cancel: CancellationToken::new(),
        }
    }

    /// Tie the flow to an external cancellation signal. An operator
    /// timeout, if desired, wraps the whole login call through this.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn build_authorize_url(
        &self,
        redirect_uri: &str,
        pkce: &PkceChallenge,
        state: &str,
    ) -> AuthResult<String> {
        let mut url = Url::parse(&self.config.authorize_url)
            .map_err(|e| AuthError::Configuration(format!("invalid authorize URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.login_scopes.join(" "))
            .append_pair("code_challenge", &pkce.code_challenge)
            .append_pair("code_challenge_method", &pkce.code_challenge_method)
            .append_pair("state", state);

        Ok(url.to_string())
    }

    async fn run_flow(
        &self,
        server: CallbackServer,
        ready_tx: oneshot::Sender<String>,
        auth_url: String,
        pkce: &PkceChallenge,
        expected_state: &str,
        redirect_uri: &str,
    ) -> AuthResult<Token> {
        // The listener is already bound, so the browser phase may proceed.
        let _ = ready_tx.send(auth_url);

        let (code, returned_state) = tokio::select! {
            result = server.wait_for_callback() => result?,
            _ = self.cancel.cancelled() => return Err(AuthError::Canceled),
        };

        if returned_state != expected_state {
            return Err(AuthError::StateMismatch);
        }

        // The exchange races the same signal; a cancellation fired
        // after the redirect still unblocks a hung token endpoint call.
        info!("exchanging authorization code for token");
        tokio::select! {
            result = self.client.exchange_code(&code, &pkce.code_verifier, redirect_uri) => result,
            _ = self.cancel.cancelled() => Err(AuthError::Canceled),
        }
    }
}

#[async_trait]
impl LoginFlow for InteractiveLogin {
    async fn login(&self) -> AuthResult<Token> {
        let pkce = generate_pkce_challenge()?;
        let expected_state = nanoid::nanoid!();

        // Bind before anything touches the browser; the provider must
        // never redirect into an unbound port.
        let server = CallbackServer::bind(self.config.callback_port).await?;
        let redirect_uri = server.redirect_uri();
        let auth_url = self.build_authorize_url(&redirect_uri, &pkce, &expected_state)?;

        let cancel = self.cancel.child_token();
        let (ready_tx, ready_rx) = oneshot::channel::<String>();

        // Browser phase: waits for the listener's ready signal, then
        // opens the default browser. A launch failure is logged but does
        // not fail the flow; the user can still navigate manually.
        let browser = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {}
                    url = ready_rx => {
                        if let Ok(url) = url {
                            info!("opening browser for authentication: {url}");
                            if let Err(e) = open::that(&url) {
                                warn!("could not open the browser: {e}; please visit the URL manually");
                            }
                        }
                    }
                }
            }
        });

        let result = self
            .run_flow(server, ready_tx, auth_url, &pkce, &expected_state, &redirect_uri)
            .await;

        // Whatever happened, tear the remaining phases down and join
        // them before surfacing the result.
        cancel.cancel();
        if browser.await.is_err() {
            warn!("browser task panicked");
        }

        result.map_err(|e| match e {
            AuthError::Canceled | AuthError::StateMismatch | AuthError::LoginFailed(_) => e,
            other => AuthError::LoginFailed(other.to_string()),
        })
    }
}
