// ABOUTME: Integration tests for the delegated-token fallback chain
// ABOUTME: Uses a fake token endpoint to verify cache hits, fallbacks, and the Origin header

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use padcli_auth::{
    AuthError, AuthResult, LoginFlow, ProviderConfig, StoreFile, Token, TokenClient, TokenManager,
    TokenStore, DEFAULT_ORIGIN,
};

const TERMPAD_SCOPE: &str = "api://termpad/access";

fn provider_config(mock_uri: &str) -> ProviderConfig {
    let mut config = ProviderConfig::entra("test-tenant", "test-client");
    config.token_url = format!("{mock_uri}/token");
    config.authorize_url = format!("{mock_uri}/authorize");
    config
}

fn test_token(access: &str, refresh: &str, expires_in_seconds: i64) -> Token {
    Token {
        access_token: access.to_string(),
        token_type: "Bearer".to_string(),
        refresh_token: refresh.to_string(),
        expiry: Utc::now() + Duration::seconds(expires_in_seconds),
        expires_in: expires_in_seconds,
    }
}

fn token_body(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "access_token": access,
        "token_type": "Bearer",
        "refresh_token": refresh,
        "expires_in": 3600,
    })
}

/// Login double that hands out a fixed token and counts invocations.
struct FakeLogin {
    token: Token,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl LoginFlow for FakeLogin {
    async fn login(&self) -> AuthResult<Token> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.token.clone())
    }
}

async fn seeded_store(dir: &TempDir, store: &TokenStore) -> StoreFile {
    let file = StoreFile::new(dir.path().join("tokens.json"));
    file.save(store).await.unwrap();
    file
}

#[tokio::test]
async fn test_fresh_cached_token_needs_no_network() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock)
        .await;

    let dir = TempDir::new().unwrap();
    let mut store = TokenStore::default();
    store.upsert_delegated("termpad", test_token("cached-access", "cached-refresh", 600));
    let file = seeded_store(&dir, &store).await;

    let manager = TokenManager::new(provider_config(&mock.uri()), file);

    let first = manager
        .get_delegated_token("termpad", TERMPAD_SCOPE)
        .await
        .unwrap();
    let second = manager
        .get_delegated_token("termpad", TERMPAD_SCOPE)
        .await
        .unwrap();

    assert_eq!(first.access_token, "cached-access");
    assert_eq!(second.access_token, "cached-access");
}

#[tokio::test]
async fn test_cache_refresh_failure_falls_back_to_primary() {
    let mock = MockServer::start().await;

    // Cached entry's refresh token is rejected by the provider.
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("refresh_token=dead-refresh"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .expect(1)
        .mount(&mock)
        .await;

    // Delegated exchange against the (fresh) primary session succeeds.
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("refresh_token=primary-refresh"))
        .and(body_string_contains("scope="))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_body("new-delegated", "new-refresh")),
        )
        .expect(1)
        .mount(&mock)
        .await;

    let dir = TempDir::new().unwrap();
    let mut store = TokenStore::default();
    store.upsert_primary(test_token("primary-access", "primary-refresh", 600));
    store.upsert_delegated("termpad", test_token("stale", "dead-refresh", -600));
    let file = seeded_store(&dir, &store).await;

    let manager = TokenManager::new(provider_config(&mock.uri()), file.clone());

    let token = manager
        .get_delegated_token("termpad", TERMPAD_SCOPE)
        .await
        .unwrap();
    assert_eq!(token.access_token, "new-delegated");

    // The newly derived delegated token was persisted.
    let reloaded = file.load().await.unwrap();
    assert_eq!(
        reloaded.delegated("termpad").unwrap().access_token,
        "new-delegated"
    );
}

#[tokio::test]
async fn test_unrefreshable_session_triggers_login_once() {
    let mock = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("refresh_token=dead-refresh"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("refresh_token=primary-refresh"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&mock)
        .await;
    // Only the post-login session can mint the delegated token.
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("refresh_token=login-refresh"))
        .and(body_string_contains("scope="))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("post-login-delegated", "post-login-refresh")),
        )
        .expect(1)
        .mount(&mock)
        .await;

    let dir = TempDir::new().unwrap();
    let mut store = TokenStore::default();
    store.upsert_primary(test_token("stale-primary", "primary-refresh", -600));
    store.upsert_delegated("termpad", test_token("stale", "dead-refresh", -600));
    let file = seeded_store(&dir, &store).await;

    let calls = Arc::new(AtomicUsize::new(0));
    let login = FakeLogin {
        token: test_token("login-access", "login-refresh", 600),
        calls: calls.clone(),
    };

    let manager = TokenManager::with_login(
        provider_config(&mock.uri()),
        file.clone(),
        Box::new(login),
    );

    let token = manager
        .get_delegated_token("termpad", TERMPAD_SCOPE)
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(token.access_token, "post-login-delegated");

    // The fresh primary was persisted before the exchange.
    let reloaded = file.load().await.unwrap();
    assert_eq!(reloaded.primary.access_token, "login-access");
    assert_eq!(
        reloaded.delegated("termpad").unwrap().access_token,
        "post-login-delegated"
    );
}

#[tokio::test]
async fn test_exchange_failure_is_terminal_and_caches_nothing() {
    let mock = MockServer::start().await;

    // Primary refresh and delegated exchange both hit this endpoint;
    // the exchange (scope present) is rejected.
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("scope="))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock)
        .await;

    let dir = TempDir::new().unwrap();
    let mut store = TokenStore::default();
    store.upsert_primary(test_token("primary-access", "primary-refresh", 600));
    let file = seeded_store(&dir, &store).await;

    let manager = TokenManager::new(provider_config(&mock.uri()), file.clone());

    let err = manager
        .get_delegated_token("termpad", TERMPAD_SCOPE)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::ExchangeFailed(_)));

    let reloaded = file.load().await.unwrap();
    assert!(reloaded.delegated("termpad").is_none());
}

#[tokio::test]
async fn test_every_token_request_carries_origin_header() {
    let mock = MockServer::start().await;

    // Requests without the Origin header fall through to a 404 and fail.
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("Origin", DEFAULT_ORIGIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("issued", "rotated")))
        .expect(3)
        .mount(&mock)
        .await;

    let client = TokenClient::new(provider_config(&mock.uri()));

    client
        .refresh(&test_token("stale", "some-refresh", -600))
        .await
        .unwrap();
    client
        .exchange_delegated("some-refresh", TERMPAD_SCOPE)
        .await
        .unwrap();
    client
        .exchange_code("auth-code", "verifier", "http://localhost:3737/auth/callback")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_missing_expiry_imputes_one_hour() {
    let mock = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "no-expiry-token",
            "token_type": "Bearer",
        })))
        .mount(&mock)
        .await;

    let client = TokenClient::new(provider_config(&mock.uri()));
    let before = Utc::now();
    let token = client
        .exchange_delegated("some-refresh", TERMPAD_SCOPE)
        .await
        .unwrap();

    assert_eq!(token.expires_in, 3600);
    assert!(token.expiry >= before + Duration::seconds(3590));
    assert!(token.expiry <= Utc::now() + Duration::seconds(3610));
}

#[tokio::test]
async fn test_end_to_end_from_seeded_store_file() {
    let mock = MockServer::start().await;

    // Primary refresh grant: rotates R into R2.
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("refresh_token=R&"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A2", "R2")))
        .expect(1)
        .mount(&mock)
        .await;
    // Delegated grant against the refreshed session.
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("refresh_token=R2"))
        .and(body_string_contains("scope="))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_body("issued-delegated-token", "DR")),
        )
        .expect(1)
        .mount(&mock)
        .await;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tokens.json");
    let past = (Utc::now() - Duration::hours(2)).to_rfc3339();
    std::fs::write(
        &path,
        format!(
            r#"{{"primary":{{"access_token":"A","refresh_token":"R","expiry":"{past}"}},"delegated_access_tokens":{{}}}}"#
        ),
    )
    .unwrap();

    let file = StoreFile::new(&path);
    let manager = TokenManager::new(provider_config(&mock.uri()), file.clone());

    let token = manager
        .get_delegated_token("termpad", TERMPAD_SCOPE)
        .await
        .unwrap();
    assert_eq!(token.access_token, "issued-delegated-token");

    let reloaded = file.load().await.unwrap();
    assert_eq!(
        reloaded.delegated("termpad").unwrap().access_token,
        "issued-delegated-token"
    );
}
