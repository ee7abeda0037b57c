//! HTTP Chat Backend
//!
//! POSTs the request body as JSON to the chat endpoint (`/api/chat` by
//! default) and decodes a `{"response": string}` body.
//!
//! Failures are classified as they happen: a request that never produced a
//! response is a transport error, a non-2xx status is a status error, and a
//! body that is not the expected JSON object is a decode error.

use std::time::Duration;

use async_trait::async_trait;

use super::traits::{ChatBackend, ChatReply, ChatRequest};
use crate::config::BackendSettings;
use crate::error::ChatError;

/// HTTP chat backend client
#[derive(Clone)]
pub struct HttpChatBackend {
    /// Scheme, host and port, without trailing slash
    base_url: String,
    /// Path of the chat endpoint, starting with `/`
    endpoint_path: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpChatBackend {
    /// Create a new HTTP backend
    ///
    /// `timeout` of `None` leaves requests unbounded.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        endpoint_path: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ChatError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ChatError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            endpoint_path: endpoint_path.into(),
            http_client,
        })
    }

    /// Create from loaded backend settings
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Transport`] if the HTTP client cannot be built.
    pub fn from_settings(settings: &BackendSettings) -> Result<Self, ChatError> {
        Self::new(
            settings.base_url.clone(),
            settings.endpoint_path.clone(),
            settings.timeout,
        )
    }

    /// Full endpoint URL
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint_path)
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        let url = self.endpoint_url();

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(url = %url, status = status.as_u16(), "Chat endpoint returned error status");
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        serde_json::from_slice::<ChatReply>(&bytes).map_err(|e| ChatError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let backend = HttpChatBackend::new("http://localhost:3000", "/api/chat", None).unwrap();
        assert_eq!(backend.endpoint_url(), "http://localhost:3000/api/chat");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let backend = HttpChatBackend::new("http://example.com/", "/api/chat", None).unwrap();
        assert_eq!(backend.endpoint_url(), "http://example.com/api/chat");
    }

    #[test]
    fn test_from_settings() {
        let settings = BackendSettings {
            base_url: "http://example.com:8080".to_string(),
            endpoint_path: "/chat".to_string(),
            timeout: Some(Duration::from_secs(5)),
        };

        let backend = HttpChatBackend::from_settings(&settings).unwrap();
        assert_eq!(backend.endpoint_url(), "http://example.com:8080/chat");
        assert_eq!(backend.name(), "HTTP");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Grab a free port, then close it so nothing is listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let backend =
            HttpChatBackend::new(format!("http://127.0.0.1:{port}"), "/api/chat", None).unwrap();
        let request = ChatRequest::single("Hello", &"s".into());

        let err = backend.send(&request).await.unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
    }
}
