//! Storage backends for the access/refresh credential pair.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TokenStorage;

use super::KeyringTokenStore;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    pub saved_at: DateTime<Utc>,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
            saved_at: Utc::now(),
        }
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.saved_at
    }

    /// Get minutes since the pair was last written (for display)
    pub fn age_minutes(&self) -> i64 {
        self.age().num_minutes().max(0)
    }
}

/// Where the credential pair lives. Implementations must be cheap to read:
/// the client asks for the access token before every request.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<TokenPair>;

    fn save(&self, tokens: &TokenPair) -> Result<()>;

    fn clear(&self) -> Result<()>;

    fn access_token(&self) -> Option<String> {
        self.load().map(|t| t.access)
    }

    fn refresh_token(&self) -> Option<String> {
        self.load().map(|t| t.refresh)
    }
}

/// In-memory copy of the pair, shared by every backend.
#[derive(Default)]
pub(crate) struct TokenCell(RwLock<Option<TokenPair>>);

impl TokenCell {
    pub(crate) fn new(tokens: Option<TokenPair>) -> Self {
        Self(RwLock::new(tokens))
    }

    pub(crate) fn get(&self) -> Option<TokenPair> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    // Writers replace the whole value, so a poisoned lock still holds
    // either the old pair or the new one.
    pub(crate) fn set(&self, tokens: Option<TokenPair>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = tokens;
    }
}

/// Process-local storage; tokens are gone when the process exits.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: TokenCell,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: TokenCell::new(Some(tokens)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<TokenPair> {
        self.tokens.get()
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        self.tokens.set(Some(tokens.clone()));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.tokens.set(None);
        Ok(())
    }
}

/// JSON session file in the cache directory, mirrored in memory.
pub struct FileTokenStore {
    path: PathBuf,
    cached: TokenCell,
}

impl FileTokenStore {
    /// Open the session file in `cache_dir`, loading any saved tokens
    pub fn open(cache_dir: &Path) -> Result<Self> {
        let path = cache_dir.join(SESSION_FILE);
        let cached = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read session file {}", path.display()))?;
            let tokens: TokenPair = serde_json::from_str(&contents)
                .context("Failed to parse session file")?;
            debug!(age_minutes = tokens.age_minutes(), "Session loaded from disk");
            Some(tokens)
        } else {
            None
        };

        Ok(Self {
            path,
            cached: TokenCell::new(cached),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<TokenPair> {
        self.cached.get()
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(tokens)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write session file {}", self.path.display()))?;
        self.cached.set(Some(tokens.clone()));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.cached.set(None);
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

/// Open the configured storage backend.
/// `account` names the keychain entry and is ignored by the other backends.
pub fn open_store(kind: TokenStorage, cache_dir: &Path, account: &str) -> Result<Arc<dyn TokenStore>> {
    let store: Arc<dyn TokenStore> = match kind {
        TokenStorage::Memory => Arc::new(MemoryTokenStore::new()),
        TokenStorage::File => Arc::new(FileTokenStore::open(cache_dir)?),
        TokenStorage::Keyring => Arc::new(KeyringTokenStore::open(account)?),
    };
    debug!(?kind, "Token store opened");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert!(store.access_token().is_none());

        store.save(&TokenPair::new("a1", "r1")).unwrap();
        assert_eq!(store.access_token().as_deref(), Some("a1"));
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));

        store.clear().unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileTokenStore::open(dir.path()).unwrap();
        assert!(store.load().is_none());
        store.save(&TokenPair::new("access", "refresh")).unwrap();
        assert!(store.path().exists());

        let reopened = FileTokenStore::open(dir.path()).unwrap();
        assert_eq!(reopened.access_token().as_deref(), Some("access"));
        assert_eq!(reopened.refresh_token().as_deref(), Some("refresh"));

        reopened.clear().unwrap();
        assert!(!reopened.path().exists());
        assert!(FileTokenStore::open(dir.path()).unwrap().load().is_none());
    }

    #[test]
    fn test_file_store_creates_missing_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("posadmin").join("cache");

        let store = FileTokenStore::open(&nested).unwrap();
        store.save(&TokenPair::new("a", "r")).unwrap();
        assert!(nested.join(SESSION_FILE).exists());
    }

    #[test]
    fn test_corrupt_session_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "not json").unwrap();
        assert!(FileTokenStore::open(dir.path()).is_err());
    }

    #[test]
    fn test_open_store_memory_backend() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(TokenStorage::Memory, dir.path(), "a@b.com").unwrap();
        store.save(&TokenPair::new("a", "r")).unwrap();
        assert_eq!(store.access_token().as_deref(), Some("a"));
        assert!(!dir.path().join(SESSION_FILE).exists());
    }

    #[test]
    fn test_token_cell_survives_poisoned_lock() {
        let cell = Arc::new(TokenCell::new(Some(TokenPair::new("a1", "r1"))));

        let poisoner = Arc::clone(&cell);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.0.write().unwrap();
            panic!("writer panicked");
        })
        .join();
        assert!(cell.0.is_poisoned());

        assert_eq!(cell.get().map(|t| t.access).as_deref(), Some("a1"));
        cell.set(None);
        assert!(cell.get().is_none());
    }
}
