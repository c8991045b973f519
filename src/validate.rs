//! Pure form validation for the login and signup flows.
//!
//! Mirrors the checks the web forms run before any network traffic:
//! synchronous, no side effects, and short-circuiting: the first violated
//! rule wins, errors are never aggregated. Every error names the form
//! field it belongs to so the caller can render it next to the input.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Minimum length for the login identifier (username or email).
pub const MIN_IDENTIFIER_LEN: usize = 3;

/// Minimum password length accepted at login.
pub const MIN_LOGIN_PASSWORD_LEN: usize = 6;

/// Minimum password length required when creating an account.
pub const MIN_SIGNUP_PASSWORD_LEN: usize = 8;

/// Credentials submitted by the login form.
///
/// Ephemeral: built from form state at submit time, dropped after
/// resolution, never persisted.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    /// Username or email address.
    pub identifier: String,
    pub password: String,
    /// Selects the durable storage scope for the resolved session.
    pub remember_me: bool,
}

/// Fields submitted by the signup form.
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub accepted_terms: bool,
}

impl SignupForm {
    /// "First Last", whitespace-trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// A single violated validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a valid username or email")]
    EmptyIdentifier,
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("Please enter your full name")]
    MissingName,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Please accept the terms of service")]
    TermsNotAccepted,
}

impl ValidationError {
    /// The form field this error should be attributed to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyIdentifier => "identifier",
            Self::PasswordTooShort { .. } => "password",
            Self::MissingName => "first_name",
            Self::InvalidEmail => "email",
            Self::PasswordMismatch => "confirm_password",
            Self::TermsNotAccepted => "terms",
        }
    }
}

/// Validate the login form fields.
pub fn validate_login(identifier: &str, password: &str) -> Result<(), ValidationError> {
    if identifier.len() < MIN_IDENTIFIER_LEN {
        return Err(ValidationError::EmptyIdentifier);
    }
    if password.len() < MIN_LOGIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_LOGIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Validate the signup form fields.
pub fn validate_signup(form: &SignupForm) -> Result<(), ValidationError> {
    if form.first_name.trim().is_empty() || form.last_name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if !is_valid_email(&form.email) {
        return Err(ValidationError::InvalidEmail);
    }
    if form.password.len() < MIN_SIGNUP_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_SIGNUP_PASSWORD_LEN,
        });
    }
    if form.password != form.confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    if !form.accepted_terms {
        return Err(ValidationError::TermsNotAccepted);
    }
    Ok(())
}

/// RFC-lite email shape: `local@domain.tld`, no embedded whitespace.
fn is_valid_email(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    });
    re.is_match(email)
}

// ── Tests ───────────────────────────────────────────────────────────
