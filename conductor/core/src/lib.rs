//! Conductor Core - Headless Chat Orchestration for chatbox
//!
//! This crate holds the conversation logic of the chat client, independent of
//! any UI framework. It can drive the terminal surface or run headless in
//! tests and one-shot scripts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        UI Surface                            │
//! │     input text, Enter, file picker      transcript view      │
//! └──────────────┬────────────────────────────────▲──────────────┘
//!                │ set_input / send               │ poll_replies
//! ┌──────────────┴────────────────────────────────┴──────────────┐
//! │                     CONDUCTOR CORE                           │
//! │  ┌────────────┐  ┌────────────┐  ┌────────────┐  ┌─────────┐ │
//! │  │ Transcript │  │ Attachment │  │  Session   │  │ Backend │ │
//! │  │   Store    │  │    Set     │  │    Id      │  │ (HTTP)  │ │
//! │  └────────────┘  └────────────┘  └────────────┘  └─────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Conductor`]: owns one conversation and issues requests
//! - [`ChatVariant`]: paired (`{user, bot}`) or role-tagged transcripts
//! - [`Transcript`]: ordered history, reconciled by [`MessageId`]
//! - [`ChatBackend`]: where requests go ([`HttpChatBackend`] in production)
//! - [`ChatError`]: tagged failure of one request
//!
//! # Quick Start
//!
//! ```ignore
//! use chatbox_conductor::{Conductor, ConductorConfig, HttpChatBackend, RoleTagged};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = HttpChatBackend::new("http://localhost:3000", "/api/chat", None).unwrap();
//!     let mut conductor: Conductor<_, RoleTagged> =
//!         Conductor::new(backend, ConductorConfig::default());
//!
//!     conductor.set_input("Hello");
//!     conductor.send();
//!
//!     if let Some(outcome) = conductor.next_reply().await {
//!         println!("{outcome:?}");
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`attachments`]: locally staged files
//! - [`backend`]: chat backend abstraction and the HTTP client
//! - [`conductor`]: the send controller
//! - [`config`]: TOML, environment and CLI configuration
//! - [`error`]: request failure types
//! - [`messages`]: ids, roles and conductor state
//! - [`transcript`]: the transcript store
//! - [`variant`]: per-variant request and reconciliation rules
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod attachments;
pub mod backend;
pub mod conductor;
pub mod config;
pub mod error;
pub mod messages;
pub mod transcript;
pub mod variant;

// Re-exports for convenience
pub use attachments::{Attachment, AttachmentError, AttachmentSet};
pub use backend::{ChatBackend, ChatReply, ChatRequest, HttpChatBackend, WireMessage};
pub use conductor::{
    Conductor, ConductorConfig, ReplyOutcome, DEFAULT_BOT_LABEL, DEFAULT_FALLBACK_MESSAGE,
};
pub use error::{ChatError, FailureKind};
pub use messages::{ConductorState, MessageId, Role, SessionId};
pub use transcript::{Entry, PairedMessage, ReplyStatus, RoleMessage, Transcript};
pub use variant::{ChatVariant, Paired, Reconciled, RoleTagged, VariantKind};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_file, load_config_from_path, BackendSettings,
    ChatboxConfig, ChatboxToml, ConfigError, ConfigOverrides, ConfigSource,
};
