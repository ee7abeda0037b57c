//! Identifiers and Shared Message Types
//!
//! Small value types shared by the transcript, the send controller and the
//! backend client: message correlation ids, the session identifier, message
//! roles and the conductor's operational state.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Alphabet used when rendering session identifiers
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of generated session identifiers
const SESSION_ID_LEN: usize = 8;

/// Message identifier
///
/// Assigned to every transcript entry when it is created. Replies are matched
/// back to their originating entry through this id, never by position.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session identifier
///
/// Opaque correlation token sent with every request so the backend can tie
/// requests to one conversation. Generated once per conductor and never
/// parsed on the client side.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a fresh random identifier
    ///
    /// Eight lowercase base-36 characters drawn from the thread RNG. Not
    /// cryptographically meaningful; only collision-resistant enough for a
    /// single active conversation.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let token: String = (0..SESSION_ID_LEN)
            .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
            .collect();
        Self(token)
    }

    /// Borrow the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input
    User,
    /// Backend reply
    Bot,
}

impl Role {
    /// Wire name of this role
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

/// Conductor operational states
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConductorState {
    /// No request in flight
    Ready,
    /// At least one request is awaiting its reply
    Waiting,
    /// Shut down; in-flight requests were cancelled
    ShutDown,
}

impl ConductorState {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::Waiting => "Waiting for reply...",
            Self::ShutDown => "Shut down",
        }
    }
}

/// Current time as Unix milliseconds
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_unique() {
        let id1 = MessageId::new();
        let id2 = MessageId::new();
        assert_ne!(id1, id2);
        assert!(id1.0.starts_with("msg_"));
    }

    #[test]
    fn test_session_id_shape() {
        for _ in 0..200 {
            let id = SessionId::generate();
            assert_eq!(id.as_str().len(), SESSION_ID_LEN, "unexpected length: {id}");
            assert!(id
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_session_id_distinct() {
        let id1 = SessionId::generate();
        let id2 = SessionId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_session_id_serializes_as_string() {
        let id = SessionId::from("abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Bot).unwrap(), "\"bot\"");
        assert_eq!(Role::Bot.as_str(), "bot");
    }

    #[test]
    fn test_conductor_state_description() {
        assert_eq!(ConductorState::Ready.description(), "Ready");
        assert_eq!(
            ConductorState::Waiting.description(),
            "Waiting for reply..."
        );
    }
}
