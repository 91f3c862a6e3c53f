//! HTTP client for the authentication backend.
//!
//! Two endpoints, `/api/login` and `/api/register`, both taking a JSON
//! body and answering either `{ "username", "user_id" }` on a 2xx
//! status or `{ "error" }` on anything else. A request that never
//! completes is a third outcome, kept apart from a server rejection.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Identity;

/// Shown when a rejection carries no usable error message.
pub const FALLBACK_ERROR: &str = "Что-то пошло не так";
/// Shown when the request could not reach or complete against the server.
pub const CONNECTIVITY_ERROR: &str = "Не удалось подключиться к серверу";

#[derive(Debug, Error)]
pub enum AuthError {
    /// The server answered with a non-success status. The message is
    /// the server's own error text, shown to the user verbatim.
    #[error("{0}")]
    Rejected(String),
    /// No usable response at all; the user sees one fixed message
    /// while the transport detail goes to the log.
    #[error("Не удалось подключиться к серверу")]
    Connectivity(#[source] reqwest::Error),
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    password: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Client for the auth backend. Cheap to clone; clones share the
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Self {
        AuthClient {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Exchanges existing credentials for an identity.
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        self.submit("/api/login", AuthRequest { username, email: None, password }).await
    }

    /// Creates an account and signs the new user in.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.submit("/api/register", AuthRequest { username, email: Some(email), password }).await
    }

    async fn submit(&self, endpoint: &str, body: AuthRequest<'_>) -> Result<Identity, AuthError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(AuthError::Connectivity)?;

        let status = response.status();
        if status.is_success() {
            let identity: Identity = response.json().await.map_err(AuthError::Connectivity)?;
            info!("authenticated as {} (user_id {})", identity.display_name, identity.user_id);
            Ok(identity)
        } else {
            // Failure bodies are `{ "error": "..." }`; anything else
            // falls back to the generic message.
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| FALLBACK_ERROR.to_string());
            warn!("auth rejected by {url} with status {status}: {message}");
            Err(AuthError::Rejected(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_displays_the_server_message_verbatim() {
        let err = AuthError::Rejected("bad credentials".to_string());
        assert_eq!(err.to_string(), "bad credentials");
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = AuthClient::new("http://localhost:8080/");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn email_is_omitted_from_login_bodies() {
        let login = AuthRequest { username: "ivan", email: None, password: "secret" };
        let json = serde_json::to_value(&login).unwrap();
        assert_eq!(json, serde_json::json!({ "username": "ivan", "password": "secret" }));

        let register = AuthRequest { username: "ivan", email: Some("ivan@example.com"), password: "secret" };
        let json = serde_json::to_value(&register).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "username": "ivan", "email": "ivan@example.com", "password": "secret" })
        );
    }
}
