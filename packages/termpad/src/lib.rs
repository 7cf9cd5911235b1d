// ABOUTME: Thin HTTP client for the termpad paste service
// ABOUTME: Posts and retrieves snippets with a bearer token supplied by the caller

use reqwest::Client;
use tracing::debug;

pub type TermpadResult<T> = Result<T, TermpadError>;

#[derive(thiserror::Error, Debug)]
pub enum TermpadError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("termpad returned {0}")]
    Status(reqwest::StatusCode),
}

pub const DEFAULT_BASE_URL: &str = "https://termpad.your-domain.com";

pub struct TermpadClient {
    base_url: String,
    http: Client,
}

impl TermpadClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    /// Post a snippet; returns the service's response body (the paste URL).
    pub async fn post(&self, access_token: &str, body: String) -> TermpadResult<String> {
        debug!("posting {} bytes to {}", body.len(), self.base_url);
        let response = self
            .http
            .post(&self.base_url)
            .bearer_auth(access_token)
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TermpadError::Status(response.status()));
        }

        Ok(response.text().await?)
    }

    /// Fetch the raw content of a paste by its identifier.
    pub async fn get(&self, access_token: &str, identifier: &str) -> TermpadResult<String> {
        let url = format!("{}/raw/{identifier}", self.base_url);
        debug!("fetching {url}");
        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TermpadError::Status(response.status()));
        }

        Ok(response.text().await?)
    }
}
