//! Chat Backend Integration
//!
//! Abstracted access to the backend chat endpoint through a common trait, so
//! the conductor can be driven by the real HTTP client or by a test double.
//!
//! # Usage
//!
//! ```ignore
//! use chatbox_conductor::backend::{ChatBackend, ChatRequest, HttpChatBackend};
//!
//! let backend = HttpChatBackend::new("http://localhost:3000", "/api/chat", None)?;
//! let request = ChatRequest::single("Hello", &session_id);
//! let reply = backend.send(&request).await?;
//! ```

mod http;
mod traits;

pub use http::HttpChatBackend;
pub use traits::{ChatBackend, ChatReply, ChatRequest, WireMessage};
