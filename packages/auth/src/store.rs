// ABOUTME: Persistent token store backing the credential lifecycle
// ABOUTME: Caches the primary session token plus per-audience delegated tokens as JSON on disk

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// A single OAuth2 credential grant.
///
/// A stale token (past its expiry) is not necessarily unusable: its
/// refresh token may still be exchanged for a fresh one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: String,
    pub expiry: DateTime<Utc>,
    pub expires_in: i64,
}

impl Default for Token {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            token_type: String::new(),
            refresh_token: String::new(),
            expiry: DateTime::UNIX_EPOCH,
            expires_in: 0,
        }
    }
}

impl Token {
    /// True while the access token has not yet passed its expiry.
    pub fn is_fresh(&self) -> bool {
        Utc::now() < self.expiry
    }

    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

/// The persisted root object: the user's own session credential plus a
/// map of delegated tokens keyed by audience identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenStore {
    pub primary: Token,
    pub delegated_access_tokens: HashMap<String, Token>,
}

impl TokenStore {
    /// Replace the primary token. Does not persist; saving is an
    /// explicit caller step so multiple mutations batch into one write.
    pub fn upsert_primary(&mut self, token: Token) {
        self.primary = token;
    }

    /// Insert or overwrite the delegated entry for `identifier`.
    pub fn upsert_delegated(&mut self, identifier: impl Into<String>, token: Token) {
        self.delegated_access_tokens.insert(identifier.into(), token);
    }

    pub fn delegated(&self, identifier: &str) -> Option<&Token> {
        self.delegated_access_tokens.get(identifier)
    }
}

/// Handle on the token store's fixed on-disk location.
#[derive(Debug, Clone)]
pub struct StoreFile {
    path: PathBuf,
}

impl StoreFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The user-scoped default location, `<config dir>/padcli/tokens.json`.
    pub fn default_path() -> AuthResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            AuthError::Configuration("could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("padcli").join("tokens.json"))
    }

    pub fn at_default() -> AuthResult<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the store from disk. A missing file is an empty store, not
    /// an error; malformed JSON is.
    pub async fn load(&self) -> AuthResult<TokenStore> {
        if !self.path.exists() {
            debug!("no token store at {}, starting empty", self.path.display());
            return Ok(TokenStore::default());
        }

        let data = fs::read_to_string(&self.path).await?;
        let store = serde_json::from_str(&data)?;
        Ok(store)
    }

    /// Rewrite the store file in full with indented JSON, owner
    /// read/write only. No cross-process locking; the last writer
    /// wins. The in-memory store stays valid if this fails.
    pub async fn save(&self, store: &TokenStore) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_string_pretty(store)?;

        #[cfg(unix)]
        {
            use tokio::io::AsyncWriteExt;
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .await?;
            file.write_all(data.as_bytes()).await?;
            file.flush().await?;
        }

        #[cfg(not(unix))]
        fs::write(&self.path, &data).await?;

        debug!("saved token store to {}", self.path.display());
        Ok(())
    }
}
