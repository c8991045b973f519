//! Client-side authentication and session resolution for the Imago image
//! studio.
//!
//! The UI layer submits credentials; this crate turns them into a resolved
//! [`Session`] or a single typed failure:
//!
//! 1. pure form validation ([`validate`]),
//! 2. a remote attempt against the auth backend, bounded by a deadline and
//!    a cancellation token ([`remote`]),
//! 3. on unavailability only, an offline fallback against locally
//!    registered accounts plus one builtin trial login ([`accounts`]),
//! 4. persistence of the result in a durable or process-scoped storage
//!    scope selected by "remember me" ([`session`], [`storage`]).
//!
//! Storage backends are injected, so tests and embedders can substitute
//! in-memory fakes for both scopes.

pub mod accounts;
pub mod config;
pub mod error;
pub mod remote;
pub mod resolver;
pub mod session;
pub mod storage;
pub mod validate;

pub use accounts::{Account, AccountStore};
pub use config::AuthConfig;
pub use error::AuthError;
pub use remote::{AuthApiClient, RemoteOutcome};
pub use resolver::{SessionResolver, SignupReceipt};
pub use session::{Session, SessionStore};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, Scope, ScopedStorage};
pub use validate::{LoginCredentials, SignupForm, ValidationError};
