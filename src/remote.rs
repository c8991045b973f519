//! HTTP client for the Imago authentication backend.
//!
//! Thin reqwest wrapper over the multipart form endpoints:
//! - `POST /login`: fields `username`, `password`
//! - `POST /register`: fields `username`, `email`, `password`, `full_name`
//! - `POST /logout`: bearer token, best-effort
//!
//! ## Design
//! - Every call is bounded by the configured deadline and a caller-supplied
//!   cancellation token, so a hung connection can never block the offline
//!   fallback path.
//! - Outcomes are trichotomous: the server accepted, the server refused
//!   with a structured message, or the server could not be reached at all.
//!   Only the first two are ever user-visible; unavailability is a routing
//!   signal for the caller.
//! - A well-formed JSON failure body counts as a refusal whatever the HTTP
//!   status; anything unparseable counts as unreachable.

use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::config::AuthConfig;

/// Authenticated user payload from a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteUser {
    pub session_token: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    success: bool,
    #[serde(default)]
    user: Option<RemoteUser>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Result of one remote call.
#[derive(Debug)]
pub enum RemoteOutcome<T> {
    /// The server completed the request and accepted it.
    Success(T),
    /// The server completed the request and refused it; the message is
    /// safe to show verbatim.
    Rejected(String),
    /// Transport failure, deadline, cancellation, or a malformed body.
    /// The reason is diagnostic only, never user-facing.
    Unavailable(String),
}

/// Client for the authentication endpoints.
pub struct AuthApiClient {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl AuthApiClient {
    pub fn new(config: &AuthConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Attempt a remote login.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> RemoteOutcome<RemoteUser> {
        let form = reqwest::multipart::Form::new()
            .text("username", identifier.to_string())
            .text("password", password.to_string());
        let request = self.http.post(self.endpoint("login")).multipart(form);

        let body = match self.dispatch(request, cancel).await {
            Ok(body) => body,
            Err(reason) => return RemoteOutcome::Unavailable(reason),
        };

        match serde_json::from_slice::<LoginResponse>(&body) {
            Ok(LoginResponse {
                success: true,
                user: Some(user),
                ..
            }) if !user.session_token.is_empty() => RemoteOutcome::Success(user),
            Ok(response) => RemoteOutcome::Rejected(
                response.message.unwrap_or_else(|| "Login failed".to_string()),
            ),
            Err(err) => RemoteOutcome::Unavailable(format!("malformed login response: {err}")),
        }
    }

    /// Attempt a remote registration.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        full_name: &str,
        cancel: &CancellationToken,
    ) -> RemoteOutcome<()> {
        let form = reqwest::multipart::Form::new()
            .text("username", username.to_string())
            .text("email", email.to_string())
            .text("password", password.to_string())
            .text("full_name", full_name.to_string());
        let request = self.http.post(self.endpoint("register")).multipart(form);

        let body = match self.dispatch(request, cancel).await {
            Ok(body) => body,
            Err(reason) => return RemoteOutcome::Unavailable(reason),
        };

        match serde_json::from_slice::<StatusResponse>(&body) {
            Ok(StatusResponse { success: true, .. }) => RemoteOutcome::Success(()),
            Ok(response) => RemoteOutcome::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "Registration failed".to_string()),
            ),
            Err(err) => RemoteOutcome::Unavailable(format!("malformed register response: {err}")),
        }
    }

    /// Invalidate a session token server-side. Best-effort: callers treat
    /// `Unavailable` as a local-only logout.
    pub async fn logout(&self, token: &str, cancel: &CancellationToken) -> RemoteOutcome<()> {
        let request = self
            .http
            .post(self.endpoint("logout"))
            .header("Authorization", format!("Bearer {token}"));

        let body = match self.dispatch(request, cancel).await {
            Ok(body) => body,
            Err(reason) => return RemoteOutcome::Unavailable(reason),
        };

        match serde_json::from_slice::<StatusResponse>(&body) {
            Ok(StatusResponse { success: true, .. }) => RemoteOutcome::Success(()),
            Ok(response) => RemoteOutcome::Rejected(
                response.message.unwrap_or_else(|| "Logout failed".to_string()),
            ),
            Err(err) => RemoteOutcome::Unavailable(format!("malformed logout response: {err}")),
        }
    }

    /// Send a request, racing the deadline and the cancellation token.
    /// Returns the raw body on any completed HTTP exchange.
    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, String> {
        let send = async {
            let response = request
                .send()
                .await
                .map_err(|err| format!("transport error: {err}"))?;
            response
                .bytes()
                .await
                .map(|bytes| bytes.to_vec())
                .map_err(|err| format!("body read error: {err}"))
        };

        tokio::select! {
            _ = cancel.cancelled() => Err("request cancelled".to_string()),
            result = tokio::time::timeout(self.timeout, send) => match result {
                Ok(inner) => inner,
                Err(_) => Err(format!("no response within {:?}", self.timeout)),
            },
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(base_url: &str, timeout_secs: u64) -> AuthApiClient {
        AuthApiClient::new(&AuthConfig {
            api_base_url: base_url.to_string(),
            request_timeout_secs: timeout_secs,
            data_dir: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn login_success_parses_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "user": {
                    "session_token": "tok-123",
                    "username": "ada",
                    "email": "ada@example.com"
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri(), 3);
        let outcome = client
            .login("ada", "engine1843", &CancellationToken::new())
            .await;
        match outcome {
            RemoteOutcome::Success(user) => {
                assert_eq!(user.session_token, "tok-123");
                assert_eq!(user.username, "ada");
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_failure_body_is_rejection_even_on_401() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "success": false,
                "message": "Invalid username or password"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri(), 3);
        let outcome = client
            .login("ada", "wrong-pass", &CancellationToken::new())
            .await;
        match outcome {
            RemoteOutcome::Rejected(message) => {
                assert_eq!(message, "Invalid username or password");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_success_without_user_payload_is_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;

        let client = client_for(&server.uri(), 3);
        let outcome = client
            .login("ada", "engine1843", &CancellationToken::new())
            .await;
        assert!(matches!(outcome, RemoteOutcome::Rejected(_)));
    }

    #[tokio::test]
    async fn non_json_body_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server.uri(), 3);
        let outcome = client
            .login("ada", "engine1843", &CancellationToken::new())
            .await;
        assert!(matches!(outcome, RemoteOutcome::Unavailable(_)));
    }

    #[tokio::test]
    async fn connection_refused_is_unavailable() {
        // Nothing listens on the discard port.
        let client = client_for("http://127.0.0.1:9", 3);
        let outcome = client
            .login("ada", "engine1843", &CancellationToken::new())
            .await;
        assert!(matches!(outcome, RemoteOutcome::Unavailable(_)));
    }

    #[tokio::test]
    async fn slow_server_hits_the_deadline() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true}))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server.uri(), 1);
        let outcome = client
            .login("ada", "engine1843", &CancellationToken::new())
            .await;
        match outcome {
            RemoteOutcome::Unavailable(reason) => assert!(reason.contains("no response")),
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancellation_aborts_the_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true}))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let client = client_for(&server.uri(), 30);
        let outcome = client.login("ada", "engine1843", &cancel).await;
        match outcome {
            RemoteOutcome::Unavailable(reason) => assert!(reason.contains("cancelled")),
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn register_rejection_surfaces_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "message": "Username or email already exists"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri(), 3);
        let outcome = client
            .register("ada", "ada@example.com", "engine1843", "Ada Lovelace", &CancellationToken::new())
            .await;
        match outcome {
            RemoteOutcome::Rejected(message) => {
                assert_eq!(message, "Username or email already exists");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let client = client_for("http://127.0.0.1:8000/", 3);
        assert_eq!(client.endpoint("login"), "http://127.0.0.1:8000/login");
    }
}
