//! JSON-backed fallback account store.
//!
//! The whole registry is one serialized mapping, keyed by email, held
//! under a fixed key in the durable storage scope. Absent or malformed
//! stored state is treated as an empty registry, never as an error.
//!
//! ## Security
//! Passwords are stored in PLAINTEXT. This is inherited demo-mode
//! convenience: the store only ever holds throwaway trial accounts
//! created while the backend was unreachable. Do not route real
//! credentials through this component.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::{KeyValueStorage, StorageError};

/// Durable-scope key holding the serialized account registry.
const ACCOUNTS_KEY: &str = "imago.fallback_accounts";

/// Builtin trial account, always authenticatable, never physically stored.
pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "demo123";

/// A locally registered fallback account. Created by offline signup;
/// never updated, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub email: String,
    /// Plaintext by design (see module docs).
    pub password: String,
    pub full_name: String,
    /// Unix timestamp (seconds) of registration.
    pub created_at: u64,
}

/// Errors from fallback account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("An account with this email already exists")]
    DuplicateEmail,
    #[error("Username '{0}' is already taken")]
    DuplicateUsername(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Fallback account registry over the durable storage scope.
pub struct AccountStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl AccountStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Register a new fallback account. The username is derived from the
    /// email local-part; the first record wins on any collision.
    pub fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Account, AccountError> {
        let email = email.trim();
        let username = username_from_email(email);
        let mut accounts = self.load()?;

        if accounts.contains_key(email) {
            return Err(AccountError::DuplicateEmail);
        }
        // The builtin trial name is reserved even though it is never stored.
        if username == DEMO_USERNAME
            || accounts.values().any(|account| account.username == username)
        {
            return Err(AccountError::DuplicateUsername(username));
        }

        let account = Account {
            username,
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            created_at: epoch_secs(),
        };
        accounts.insert(email.to_string(), account.clone());
        self.save(&accounts)?;

        tracing::info!(username = %account.username, "fallback account registered");
        Ok(account)
    }

    /// Authenticate against the builtin trial account, then the registry.
    /// Matches on username OR email plus exact password equality.
    pub fn authenticate(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<Option<Account>, StorageError> {
        let identifier = identifier.trim();
        if identifier == DEMO_USERNAME && password == DEMO_PASSWORD {
            return Ok(Some(demo_account()));
        }

        let accounts = self.load()?;
        Ok(accounts
            .into_values()
            .find(|account| {
                (account.username == identifier || account.email == identifier)
                    && account.password == password
            }))
    }

    /// Number of registered accounts (the builtin trial login not counted).
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.load()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.load()?.is_empty())
    }

    fn load(&self) -> Result<BTreeMap<String, Account>, StorageError> {
        let Some(raw) = self.storage.get(ACCOUNTS_KEY)? else {
            return Ok(BTreeMap::new());
        };
        match serde_json::from_str(&raw) {
            Ok(accounts) => Ok(accounts),
            Err(err) => {
                tracing::warn!(error = %err, "malformed fallback account registry, starting empty");
                Ok(BTreeMap::new())
            }
        }
    }

    fn save(&self, accounts: &BTreeMap<String, Account>) -> Result<(), StorageError> {
        let raw = serde_json::to_string(accounts)?;
        self.storage.set(ACCOUNTS_KEY, &raw)?;
        Ok(())
    }
}

/// Username for a new account: the email local-part, lower-cased.
pub fn username_from_email(email: &str) -> String {
    email
        .split('@')
        .next()
        .unwrap_or(email)
        .to_ascii_lowercase()
}

/// The synthesized builtin trial account.
fn demo_account() -> Account {
    Account {
        username: DEMO_USERNAME.to_string(),
        email: "demo@imago.local".to_string(),
        password: DEMO_PASSWORD.to_string(),
        full_name: "Demo User".to_string(),
        created_at: 0,
    }
}

/// Current Unix epoch in seconds.
fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn test_store() -> AccountStore {
        AccountStore::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn register_and_authenticate() {
        let store = test_store();
        let account = store
            .register("Ada@example.com", "engine1843", "Ada Lovelace")
            .unwrap();
        assert_eq!(account.username, "ada");

        let by_username = store.authenticate("ada", "engine1843").unwrap();
        assert_eq!(by_username.as_ref().map(|a| a.email.as_str()), Some("Ada@example.com"));

        let by_email = store.authenticate("Ada@example.com", "engine1843").unwrap();
        assert!(by_email.is_some());
    }

    #[test]
    fn wrong_password_matches_nothing() {
        let store = test_store();
        store
            .register("ada@example.com", "engine1843", "Ada Lovelace")
            .unwrap();
        assert!(store.authenticate("ada", "engine1844").unwrap().is_none());
    }

    #[test]
    fn unknown_identifier_matches_nothing() {
        let store = test_store();
        assert!(store.authenticate("ghost", "whatever99").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_keeps_first_record() {
        let store = test_store();
        store
            .register("ada@example.com", "first-password", "Ada Lovelace")
            .unwrap();
        let second = store.register("ada@example.com", "second-password", "Imposter");
        assert!(matches!(second, Err(AccountError::DuplicateEmail)));

        assert_eq!(store.len().unwrap(), 1);
        let kept = store
            .authenticate("ada@example.com", "first-password")
            .unwrap();
        assert_eq!(kept.map(|a| a.full_name), Some("Ada Lovelace".to_string()));
    }

    #[test]
    fn duplicate_username_across_domains_rejected() {
        let store = test_store();
        store
            .register("ada@example.com", "engine1843", "Ada Lovelace")
            .unwrap();
        let collision = store.register("ada@other.org", "different1", "Other Ada");
        assert!(matches!(
            collision,
            Err(AccountError::DuplicateUsername(name)) if name == "ada"
        ));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn builtin_demo_name_is_reserved() {
        let store = test_store();
        let result = store.register("demo@example.com", "password1", "Demo Squatter");
        assert!(matches!(
            result,
            Err(AccountError::DuplicateUsername(name)) if name == "demo"
        ));
    }

    #[test]
    fn demo_account_always_authenticates() {
        let store = test_store();
        let demo = store.authenticate("demo", "demo123").unwrap().unwrap();
        assert_eq!(demo.username, "demo");
        // And it is never written to the registry.
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn demo_account_wrong_password_rejected() {
        let store = test_store();
        assert!(store.authenticate("demo", "wrong123").unwrap().is_none());
    }

    #[test]
    fn username_derivation_lowercases_local_part() {
        assert_eq!(username_from_email("Ada.L@Example.COM"), "ada.l");
        assert_eq!(username_from_email("plain"), "plain");
    }

    #[test]
    fn malformed_registry_treated_as_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(ACCOUNTS_KEY, "{ not json").unwrap();

        let store = AccountStore::new(storage);
        assert!(store.is_empty().unwrap());

        // Registration recovers the registry.
        store
            .register("ada@example.com", "engine1843", "Ada Lovelace")
            .unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn registry_shared_across_store_instances() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let first = AccountStore::new(Arc::clone(&storage));
        first
            .register("ada@example.com", "engine1843", "Ada Lovelace")
            .unwrap();

        let second = AccountStore::new(storage);
        assert!(second.authenticate("ada", "engine1843").unwrap().is_some());
    }
}
