//! HTTP client for the chat server's REST endpoints.
//!
//! Every request carries the session's bearer token. A `401` maps to
//! [`ApiError::Unauthorized`] so the UI can ask the user to sign in again;
//! nothing is retried.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use collab_proto::models::{ChatPartner, HistoryEntry, Notification, UserId};

/// Errors returned by [`ApiClient`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The token was rejected.
    #[error("session expired, please sign in again")]
    Unauthorized,
    /// The server answered with a non-success status.
    #[error("server returned {status} for {path}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Request path.
        path: String,
    },
    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Thin wrapper around [`reqwest::Client`] bound to one server and token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Creates a client for `base_url` authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// `GET /chat/users/`
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn chat_users(&self) -> Result<Vec<ChatPartner>, ApiError> {
        self.get("/chat/users/").await
    }

    /// `GET /chat/history/{partner}/`, oldest first.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn chat_history(&self, partner: UserId) -> Result<Vec<HistoryEntry>, ApiError> {
        self.get(&format!("/chat/history/{partner}/")).await
    }

    /// `GET /api/notifications/`, newest first.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.get("/api/notifications/").await
    }

    /// `POST /api/notifications/{id}/read/`
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn mark_notification_read(&self, id: u64) -> Result<(), ApiError> {
        let path = format!("/api/notifications/{id}/read/");
        let resp = self
            .http
            .post(self.url(&path))
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;
        check(resp, &path).map(drop)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;
        Ok(check(resp, path)?.json().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn check(resp: reqwest::Response, path: &str) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        tracing::warn!(path, "request unauthorized");
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        tracing::warn!(path, %status, "request failed");
        return Err(ApiError::Status {
            status,
            path: path.to_string(),
        });
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:9000/", "t", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/chat/users/"), "http://localhost:9000/chat/users/");
    }

    #[test]
    fn unauthorized_message_prompts_sign_in() {
        assert!(ApiError::Unauthorized.to_string().contains("sign in"));
    }
}
