//! Resolved session model and its persistence across the two scopes.
//!
//! A session is four keys (token, username, email, and an optional demo
//! marker) written into whichever scope the "remember me" flag selects.
//! The key names match what the web client stores, so both front-ends can
//! share state. Clearing removes only the session keys: the durable scope
//! also holds the fallback account registry, which must survive a logout.

use crate::storage::{Scope, ScopedStorage, StorageError};

const KEY_TOKEN: &str = "session_token";
const KEY_USERNAME: &str = "username";
const KEY_EMAIL: &str = "email";
const KEY_DEMO: &str = "demo_mode";

/// Proof-of-login state, remote or local.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub email: String,
    /// True only when this session came from the offline fallback path.
    /// A fallback session must never masquerade as remote-authenticated.
    pub is_demo: bool,
}

/// Session persistence over the injected storage scopes.
pub struct SessionStore {
    scopes: ScopedStorage,
}

impl SessionStore {
    pub fn new(scopes: ScopedStorage) -> Self {
        Self { scopes }
    }

    /// Write the session into the scope chosen by `remember`, overwriting
    /// any session already there.
    pub fn persist(&self, session: &Session, remember: bool) -> Result<(), StorageError> {
        let scope = if remember {
            Scope::Durable
        } else {
            Scope::Transient
        };
        let storage = self.scopes.scope(scope);
        storage.set(KEY_TOKEN, &session.token)?;
        storage.set(KEY_USERNAME, &session.username)?;
        storage.set(KEY_EMAIL, &session.email)?;
        if session.is_demo {
            storage.set(KEY_DEMO, "1")?;
        } else {
            storage.remove(KEY_DEMO)?;
        }
        tracing::debug!(
            username = %session.username,
            demo = session.is_demo,
            durable = remember,
            "session persisted"
        );
        Ok(())
    }

    /// Presence read for the UI layer. The durable scope wins when both
    /// hold a session.
    pub fn load(&self) -> Result<Option<Session>, StorageError> {
        for scope in [Scope::Durable, Scope::Transient] {
            if let Some(session) = self.load_scope(scope)? {
                return Ok(Some(session));
            }
        }
        Ok(None)
    }

    fn load_scope(&self, scope: Scope) -> Result<Option<Session>, StorageError> {
        let storage = self.scopes.scope(scope);
        let (Some(token), Some(username), Some(email)) = (
            storage.get(KEY_TOKEN)?,
            storage.get(KEY_USERNAME)?,
            storage.get(KEY_EMAIL)?,
        ) else {
            return Ok(None);
        };
        Ok(Some(Session {
            token,
            username,
            email,
            is_demo: storage.get(KEY_DEMO)?.is_some(),
        }))
    }

    /// Remove the session keys from one scope.
    pub fn clear(&self, scope: Scope) -> Result<(), StorageError> {
        let storage = self.scopes.scope(scope);
        for key in [KEY_TOKEN, KEY_USERNAME, KEY_EMAIL, KEY_DEMO] {
            storage.remove(key)?;
        }
        Ok(())
    }

    pub fn clear_all(&self) -> Result<(), StorageError> {
        self.clear(Scope::Durable)?;
        self.clear(Scope::Transient)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
