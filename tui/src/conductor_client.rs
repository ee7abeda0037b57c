//! Conductor Client
//!
//! Thin wrapper around the Conductor for TUI integration. The transcript
//! shape is a runtime choice (`--variant`), while the conductor fixes it at
//! the type level, so the client holds one of two concrete conductors and
//! forwards every call.
//!
//! # Architecture
//!
//! The TUI is a "thin client" - it doesn't contain any business logic.
//! The TUI's job is:
//! 1. Edit the conductor's pending input
//! 2. Trigger sends and file selection
//! 3. Drain reply outcomes every frame
//! 4. Render the transcript as display messages

use std::path::Path;

use chatbox_conductor::{
    AttachmentError, AttachmentSet, ChatBackend, Conductor, ConductorConfig, ConductorState,
    HttpChatBackend, MessageId, Paired, ReplyOutcome, RoleTagged, SessionId, VariantKind,
};

use crate::display::{paired_messages, role_tagged_messages, DisplayMessage};

/// Forward a call to whichever conductor is active
macro_rules! with_conductor {
    ($self:expr, $c:ident => $body:expr) => {
        match $self {
            ConductorClient::Paired($c) => $body,
            ConductorClient::RoleTagged($c) => $body,
        }
    };
}

/// Client for the embedded Conductor
pub enum ConductorClient<B: ChatBackend + 'static = HttpChatBackend> {
    /// `{user, bot}` transcript
    Paired(Conductor<B, Paired>),
    /// `{role, content}` transcript
    RoleTagged(Conductor<B, RoleTagged>),
}

impl<B: ChatBackend + 'static> ConductorClient<B> {
    /// Create a client with an embedded Conductor of the given shape
    pub fn new(backend: B, variant: VariantKind, config: ConductorConfig) -> Self {
        match variant {
            VariantKind::Paired => Self::Paired(Conductor::new(backend, config)),
            VariantKind::RoleTagged => Self::RoleTagged(Conductor::new(backend, config)),
        }
    }

    /// Transcript shape in use
    pub fn variant(&self) -> VariantKind {
        with_conductor!(self, c => c.variant())
    }

    /// Session id sent with every request
    pub fn session_id(&self) -> &SessionId {
        with_conductor!(self, c => c.session_id())
    }

    /// Current Conductor state
    pub fn state(&self) -> ConductorState {
        with_conductor!(self, c => c.state())
    }

    /// Pending input
    pub fn input(&self) -> &str {
        with_conductor!(self, c => c.input())
    }

    /// Replace the pending input
    pub fn set_input(&mut self, input: impl Into<String>) {
        with_conductor!(self, c => c.set_input(input))
    }

    /// Append a typed character
    pub fn push_char(&mut self, ch: char) {
        with_conductor!(self, c => c.input_mut().push(ch))
    }

    /// Remove the last typed character
    pub fn pop_char(&mut self) {
        with_conductor!(self, c => { c.input_mut().pop(); })
    }

    /// Send the pending input
    pub fn send(&mut self) -> Option<MessageId> {
        with_conductor!(self, c => c.send())
    }

    /// Drain completed replies (non-blocking)
    pub fn poll_replies(&mut self) -> Vec<ReplyOutcome> {
        with_conductor!(self, c => c.poll_replies())
    }

    /// Wait for the next completed reply
    pub async fn next_reply(&mut self) -> Option<ReplyOutcome> {
        with_conductor!(self, c => c.next_reply().await)
    }

    /// Files staged for the next send
    pub fn attachments(&self) -> &AttachmentSet {
        with_conductor!(self, c => c.attachments())
    }

    /// Stage files, replacing the current selection
    pub async fn select_files<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
    ) -> Result<usize, AttachmentError> {
        with_conductor!(self, c => c.select_files(paths).await)
    }

    /// Drop all staged files
    pub fn clear_attachments(&mut self) {
        with_conductor!(self, c => c.clear_attachments())
    }

    /// Cancel in-flight requests
    pub fn shutdown(&mut self) {
        with_conductor!(self, c => c.shutdown())
    }

    /// Transcript as labelled display messages
    pub fn messages(&self, bot_label: &str) -> Vec<DisplayMessage> {
        match self {
            Self::Paired(c) => paired_messages(c.transcript(), bot_label),
            Self::RoleTagged(c) => role_tagged_messages(
                c.transcript(),
                bot_label,
                c.state() == ConductorState::Waiting,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbox_conductor::{ChatError, ChatReply, ChatRequest};

    struct EchoBackend;

    #[async_trait::async_trait]
    impl ChatBackend for EchoBackend {
        fn name(&self) -> &str {
            "Echo"
        }

        async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
            let text = match request {
                ChatRequest::Single { message, .. } => message.clone(),
                ChatRequest::History { messages, .. } => messages
                    .last()
                    .map(|m| m.content.clone())
                    .unwrap_or_default(),
            };
            Ok(ChatReply {
                response: format!("echo: {text}"),
            })
        }
    }

    fn client(variant: VariantKind) -> ConductorClient<EchoBackend> {
        ConductorClient::new(EchoBackend, variant, ConductorConfig::default())
    }

    #[tokio::test]
    async fn test_paired_round_trip() {
        let mut client = client(VariantKind::Paired);
        assert_eq!(client.variant(), VariantKind::Paired);

        for ch in "Hello".chars() {
            client.push_char(ch);
        }
        client.send().unwrap();
        client.next_reply().await.unwrap();

        let texts: Vec<_> = client.messages("Gemini").iter().map(DisplayMessage::text).collect();
        assert_eq!(texts, vec!["User: Hello", "Gemini: echo: Hello"]);
    }

    #[tokio::test]
    async fn test_role_tagged_round_trip() {
        let mut client = client(VariantKind::RoleTagged);
        client.set_input("Hi");
        client.send().unwrap();

        // Waiting marker until the reply is drained
        assert_eq!(client.messages("Bot").len(), 2);
        client.next_reply().await.unwrap();

        let texts: Vec<_> = client.messages("Bot").iter().map(DisplayMessage::text).collect();
        assert_eq!(texts, vec!["You: Hi", "Bot: echo: Hi"]);
    }

    #[tokio::test]
    async fn test_input_editing() {
        let mut client = client(VariantKind::RoleTagged);
        client.push_char('a');
        client.push_char('b');
        client.pop_char();
        assert_eq!(client.input(), "a");

        client.pop_char();
        client.pop_char();
        assert_eq!(client.input(), "");
        assert!(client.send().is_none());
    }

    #[tokio::test]
    async fn test_shutdown() {
        let mut client = client(VariantKind::Paired);
        client.shutdown();
        assert_eq!(client.state(), ConductorState::ShutDown);
    }
}
