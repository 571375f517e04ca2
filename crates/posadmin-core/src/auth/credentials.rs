//! OS keychain storage for the token pair.

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::warn;

use super::store::TokenCell;
use super::{TokenPair, TokenStore};

const SERVICE_NAME: &str = "posadmin";

/// Token pair kept in the OS keychain as a JSON secret.
///
/// Reads are served from an in-memory mirror filled when the entry is opened,
/// so the keychain is only touched on open, save and clear.
pub struct KeyringTokenStore {
    entry: Entry,
    cached: TokenCell,
}

impl KeyringTokenStore {
    /// Open the keychain entry for `account` (usually the login email)
    pub fn open(account: &str) -> Result<Self> {
        let entry = Entry::new(SERVICE_NAME, account)
            .context("Failed to create keyring entry")?;

        let cached = match entry.get_password() {
            Ok(secret) => match serde_json::from_str::<TokenPair>(&secret) {
                Ok(tokens) => Some(tokens),
                Err(e) => {
                    warn!(error = %e, "Ignoring unreadable token entry in keychain");
                    None
                }
            },
            Err(keyring::Error::NoEntry) => None,
            Err(e) => return Err(e).context("Failed to read tokens from keychain"),
        };

        Ok(Self {
            entry,
            cached: TokenCell::new(cached),
        })
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Option<TokenPair> {
        self.cached.get()
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        let secret = serde_json::to_string(tokens)?;
        self.entry
            .set_password(&secret)
            .context("Failed to store tokens in keychain")?;
        self.cached.set(Some(tokens.clone()));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.cached.set(None);
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete tokens from keychain"),
        }
    }
}
