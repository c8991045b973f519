//! Session resolution: validate, try the remote backend, fall back to the
//! local account store when it is unreachable.
//!
//! Login walks validate → remote attempt → offline fallback. The fallback
//! is timeout-triggered, never user-triggered: the remote deadline (or
//! cancellation) is what routes an attempt offline. A remote refusal is
//! terminal, since the server answered; the local store is not consulted.
//! At most one error surfaces per attempt.
//!
//! One attempt per form is assumed to be in flight at a time (the UI
//! disables its submit control while resolving); the resolver does not
//! guard against concurrent duplicate resolutions.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::TryRng;
use tokio_util::sync::CancellationToken;

use crate::accounts::{store::username_from_email, AccountStore};
use crate::error::AuthError;
use crate::remote::{AuthApiClient, RemoteOutcome};
use crate::session::{Session, SessionStore};
use crate::validate::{self, LoginCredentials, SignupForm};

/// Receipt for a completed signup. Signup never establishes a session:
/// the caller routes back to the login entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupReceipt {
    /// Username the account was created under.
    pub username: String,
    /// True when the account landed in the offline fallback store rather
    /// than the remote backend.
    pub offline: bool,
}

/// Orchestrates one authentication attempt end to end.
pub struct SessionResolver {
    api: AuthApiClient,
    accounts: AccountStore,
    sessions: SessionStore,
}

impl SessionResolver {
    pub fn new(api: AuthApiClient, accounts: AccountStore, sessions: SessionStore) -> Self {
        Self {
            api,
            accounts,
            sessions,
        }
    }

    /// Resolve a login attempt into a persisted [`Session`] or a single
    /// typed failure.
    pub async fn login(
        &self,
        creds: &LoginCredentials,
        cancel: &CancellationToken,
    ) -> Result<Session, AuthError> {
        validate::validate_login(&creds.identifier, &creds.password)?;

        match self
            .api
            .login(&creds.identifier, &creds.password, cancel)
            .await
        {
            RemoteOutcome::Success(user) => {
                let session = Session {
                    token: user.session_token,
                    username: user.username,
                    email: user.email,
                    is_demo: false,
                };
                self.sessions.persist(&session, creds.remember_me)?;
                tracing::info!(username = %session.username, "remote login succeeded");
                Ok(session)
            }
            RemoteOutcome::Rejected(message) => Err(AuthError::Remote(message)),
            RemoteOutcome::Unavailable(reason) => {
                tracing::warn!(%reason, "auth backend unreachable, trying offline fallback");
                self.login_fallback(creds)
            }
        }
    }

    fn login_fallback(&self, creds: &LoginCredentials) -> Result<Session, AuthError> {
        match self
            .accounts
            .authenticate(&creds.identifier, &creds.password)?
        {
            Some(account) => {
                let session = Session {
                    token: fallback_token(),
                    username: account.username,
                    email: account.email,
                    is_demo: true,
                };
                self.sessions.persist(&session, creds.remember_me)?;
                tracing::info!(username = %session.username, "offline fallback login succeeded");
                Ok(session)
            }
            None => Err(AuthError::LocalAuth),
        }
    }

    /// Resolve a signup attempt. Duplicate-account errors from the
    /// fallback store surface verbatim.
    pub async fn signup(
        &self,
        form: &SignupForm,
        cancel: &CancellationToken,
    ) -> Result<SignupReceipt, AuthError> {
        validate::validate_signup(form)?;

        let username = username_from_email(form.email.trim());
        let full_name = form.full_name();

        match self
            .api
            .register(&username, form.email.trim(), &form.password, &full_name, cancel)
            .await
        {
            RemoteOutcome::Success(()) => {
                tracing::info!(%username, "remote registration succeeded");
                Ok(SignupReceipt {
                    username,
                    offline: false,
                })
            }
            RemoteOutcome::Rejected(message) => Err(AuthError::Remote(message)),
            RemoteOutcome::Unavailable(reason) => {
                tracing::warn!(%reason, "auth backend unreachable, registering in offline store");
                let account = self
                    .accounts
                    .register(&form.email, &form.password, &full_name)?;
                Ok(SignupReceipt {
                    username: account.username,
                    offline: true,
                })
            }
        }
    }

    /// Best-effort logout: tell the backend when the session is remote and
    /// the backend reachable, then drop the session from both scopes.
    pub async fn logout(&self, cancel: &CancellationToken) -> Result<(), AuthError> {
        if let Some(session) = self.sessions.load()? {
            if !session.is_demo {
                if let RemoteOutcome::Unavailable(reason) =
                    self.api.logout(&session.token, cancel).await
                {
                    tracing::debug!(%reason, "backend unreachable during logout, clearing locally only");
                }
            }
        }
        self.sessions.clear_all()?;
        Ok(())
    }

    /// The session store, for presence reads by the UI layer.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

/// Opaque token for fallback sessions: timestamp plus random suffix, so a
/// demo token can never be mistaken for (or collide with) a remote one.
fn fallback_token() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let mut suffix = [0u8; 4];
    rand::rngs::SysRng
        .try_fill_bytes(&mut suffix)
        .expect("OS CSPRNG unavailable");
    format!("local-{millis:x}-{}", hex::encode(suffix))
}

// ── Tests ───────────────────────────────────────────────────────────
