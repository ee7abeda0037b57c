//! Chat Backend Traits
//!
//! Wire types for the `/api/chat` exchange and the trait every backend
//! implements. Implementations handle transport details; the conductor only
//! sees a request going out and a tagged result coming back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::messages::{Role, SessionId};
use crate::transcript::RoleMessage;

/// One history entry as it travels on the wire
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Who sent the message
    pub role: Role,
    /// Message content
    pub content: String,
}

impl From<&RoleMessage> for WireMessage {
    fn from(msg: &RoleMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

/// Outbound request body
///
/// Serialized untagged, so each variant produces exactly the JSON object the
/// endpoint expects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatRequest {
    /// Single message: `{"message": ..., "sessionId": ...}`
    Single {
        /// The text the user sent
        message: String,
        /// Session correlation token
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
    /// Full history: `{"messages": [...], "sessionId": ...}`
    History {
        /// Every transcript entry, oldest first
        messages: Vec<WireMessage>,
        /// Session correlation token
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
}

impl ChatRequest {
    /// Build a single-message request
    pub fn single(message: impl Into<String>, session_id: &SessionId) -> Self {
        Self::Single {
            message: message.into(),
            session_id: session_id.clone(),
        }
    }

    /// Build a history request from role-tagged entries
    pub fn history<'a>(
        messages: impl IntoIterator<Item = &'a RoleMessage>,
        session_id: &SessionId,
    ) -> Self {
        Self::History {
            messages: messages.into_iter().map(WireMessage::from).collect(),
            session_id: session_id.clone(),
        }
    }

    /// Session id carried by this request
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::Single { session_id, .. } | Self::History { session_id, .. } => session_id,
        }
    }
}

/// Successful response body: `{"response": "..."}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// The reply text
    pub response: String,
}

/// Chat backend trait
///
/// Implement this to connect the conductor to a different transport.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend name for logs (e.g., "HTTP")
    fn name(&self) -> &str;

    /// Send one request and wait for its reply
    ///
    /// Every failure is reported as a tagged [`ChatError`]; implementations
    /// never panic on bad input from the network.
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_single_request_shape() {
        let session = SessionId::from("abc123");
        let request = ChatRequest::single("Hello", &session);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "message": "Hello", "sessionId": "abc123" })
        );
    }

    #[test]
    fn test_history_request_shape() {
        let session = SessionId::from("abc123");
        let history = vec![RoleMessage::user("Hello"), RoleMessage::bot("Hi there")];
        let request = ChatRequest::history(&history, &session);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "messages": [
                    { "role": "user", "content": "Hello" },
                    { "role": "bot", "content": "Hi there" }
                ],
                "sessionId": "abc123"
            })
        );
        assert_eq!(request.session_id().as_str(), "abc123");
    }

    #[test]
    fn test_reply_ignores_extra_fields() {
        let reply: ChatReply =
            serde_json::from_str(r#"{"response": "Hi", "model": "gemini"}"#).unwrap();
        assert_eq!(reply.response, "Hi");
    }

    #[test]
    fn test_reply_requires_response_field() {
        let result = serde_json::from_str::<ChatReply>(r#"{"reply": "Hi"}"#);
        assert!(result.is_err());
    }
}
