//! Fallback account registry for offline "demo mode".
//!
//! Provides:
//! - Local account registration keyed by email, unique by email and username
//! - Username derivation from the email local-part
//! - A builtin zero-setup trial account (`demo` / `demo123`)
//! - JSON persistence through the durable [`crate::storage`] scope
//!
//! Only consulted when the remote backend is unreachable; the resolver
//! never reads it on the happy path.

pub mod store;

pub use store::{Account, AccountError, AccountStore, DEMO_PASSWORD, DEMO_USERNAME};
