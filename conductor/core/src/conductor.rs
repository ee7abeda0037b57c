//! Conductor - The Send Controller
//!
//! The Conductor owns one conversation: the transcript, the pending input,
//! the staged attachments and the session id. It is UI-agnostic; a surface
//! feeds it input, calls [`Conductor::send`], and drains replies with
//! [`Conductor::poll_replies`] (non-blocking) or [`Conductor::next_reply`].
//!
//! # Request Lifecycle
//!
//! ```text
//!  send()                       spawned task                 poll_replies()
//!  ──────                       ────────────                 ──────────────
//!  append user entry ──────┐
//!  clear input/attachments │
//!  build request ──────────┼──► backend.send(request)
//!                          │      or token.cancelled()
//!                          │              │
//!                          │    Completion { id, result } ──► reconcile by id
//! ```
//!
//! Network calls run on spawned tasks that never touch the transcript. All
//! mutation happens on the task that owns the conductor.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::attachments::{AttachmentError, AttachmentSet};
use crate::backend::{ChatBackend, ChatReply};
use crate::error::{ChatError, FailureKind};
use crate::messages::{ConductorState, MessageId, SessionId};
use crate::transcript::Transcript;
use crate::variant::{ChatVariant, Reconciled, VariantKind};

/// Bot text appended when a role-tagged request fails
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Label shown next to bot replies
pub const DEFAULT_BOT_LABEL: &str = "Gemini";

/// Completions buffered before request tasks wait on the owner
const COMPLETION_CHANNEL_CAPACITY: usize = 64;

/// Conductor configuration
#[derive(Clone, Debug)]
pub struct ConductorConfig {
    /// Bot text appended when a role-tagged request fails
    pub fallback_message: String,
    /// Pinned session id; a fresh one is generated when `None`
    pub session_id: Option<SessionId>,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            session_id: None,
        }
    }
}

/// Result of reconciling one completed request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The reply was stored
    Answered {
        /// The user entry this reply belongs to
        id: MessageId,
        /// Reply text
        reply: String,
    },
    /// The request failed
    Failed {
        /// The user entry whose request failed
        id: MessageId,
        /// What went wrong
        error: ChatError,
        /// Fallback bot entry appended for the failure, if the variant adds one
        fallback: Option<MessageId>,
    },
}

impl ReplyOutcome {
    /// The user entry this outcome belongs to
    #[must_use]
    pub fn id(&self) -> &MessageId {
        match self {
            Self::Answered { id, .. } | Self::Failed { id, .. } => id,
        }
    }

    /// Failure classification, `None` on success
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Answered { .. } => None,
            Self::Failed { error, .. } => Some(error.kind()),
        }
    }
}

/// Message from a request task back to the owning conductor
#[derive(Debug)]
struct Completion {
    id: MessageId,
    result: Result<ChatReply, ChatError>,
}

/// The Conductor - headless chat orchestration
pub struct Conductor<B: ChatBackend, V: ChatVariant> {
    /// Configuration
    config: ConductorConfig,
    /// Chat backend, shared with request tasks
    backend: Arc<B>,
    /// Correlation token sent with every request
    session_id: SessionId,
    /// Conversation history
    transcript: Transcript<V::Entry>,
    /// Text the user is composing
    input: String,
    /// Files staged for the next send
    attachments: AttachmentSet,
    /// User entries whose request has not completed
    in_flight: HashSet<MessageId>,
    completions_tx: mpsc::Sender<Completion>,
    completions_rx: mpsc::Receiver<Completion>,
    /// Parent of every request's cancellation token
    cancel: CancellationToken,
    /// Current operational state
    state: ConductorState,
    _variant: PhantomData<V>,
}

impl<B: ChatBackend + 'static, V: ChatVariant> Conductor<B, V> {
    /// Create a new Conductor with the given backend
    pub fn new(backend: B, config: ConductorConfig) -> Self {
        Self::with_shared_backend(Arc::new(backend), config)
    }

    /// Create a Conductor that shares an existing backend
    pub fn with_shared_backend(backend: Arc<B>, config: ConductorConfig) -> Self {
        let session_id = config
            .session_id
            .clone()
            .unwrap_or_else(SessionId::generate);
        let (completions_tx, completions_rx) = mpsc::channel(COMPLETION_CHANNEL_CAPACITY);

        tracing::debug!(
            session_id = %session_id,
            variant = %V::KIND,
            backend = backend.name(),
            "Conductor created"
        );

        Self {
            config,
            backend,
            session_id,
            transcript: Transcript::new(),
            input: String::new(),
            attachments: AttachmentSet::new(),
            in_flight: HashSet::new(),
            completions_tx,
            completions_rx,
            cancel: CancellationToken::new(),
            state: ConductorState::Ready,
            _variant: PhantomData,
        }
    }

    /// Session id sent with every request
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Conversation history
    pub fn transcript(&self) -> &Transcript<V::Entry> {
        &self.transcript
    }

    /// Current operational state
    pub fn state(&self) -> ConductorState {
        self.state
    }

    /// Number of requests awaiting their reply
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Which transcript shape this conductor uses
    pub fn variant(&self) -> VariantKind {
        V::KIND
    }

    /// Configuration
    pub fn config(&self) -> &ConductorConfig {
        &self.config
    }

    /// Pending input
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the pending input
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Mutable access to the pending input, for editors
    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    /// Files staged for the next send
    pub fn attachments(&self) -> &AttachmentSet {
        &self.attachments
    }

    /// Stage files, replacing the current selection
    ///
    /// # Errors
    ///
    /// Returns the first [`AttachmentError`]; the previous selection is kept.
    pub async fn select_files<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
    ) -> Result<usize, AttachmentError> {
        self.attachments.select(paths).await
    }

    /// Drop all staged files
    pub fn clear_attachments(&mut self) {
        self.attachments.clear();
    }

    /// Send the pending input
    ///
    /// Appends the user entry, clears the input and the staged attachments,
    /// then issues the request on a spawned task. Returns the id of the new
    /// user entry, or `None` if there was nothing to send (or the conductor
    /// is shut down), in which case nothing changes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn send(&mut self) -> Option<MessageId> {
        if self.state == ConductorState::ShutDown {
            tracing::debug!("Send ignored after shutdown");
            return None;
        }
        if !V::accepts(&self.input, &self.attachments) {
            return None;
        }

        let content = std::mem::take(&mut self.input);
        let id = self.transcript.append(V::user_entry(content));
        let staged = self.attachments.len();
        self.attachments.clear();

        let request = V::build_request(&self.transcript, &id, &self.session_id);

        tracing::debug!(
            message_id = %id,
            session_id = %self.session_id,
            attachments = staged,
            "Sending message"
        );

        self.in_flight.insert(id.clone());
        self.state = ConductorState::Waiting;

        let backend = Arc::clone(&self.backend);
        let token = self.cancel.child_token();
        let tx = self.completions_tx.clone();
        let task_id = id.clone();

        tokio::spawn(async move {
            // A panicking backend still completes its request
            let call = AssertUnwindSafe(backend.send(&request)).catch_unwind();
            let result = tokio::select! {
                biased;
                () = token.cancelled() => Err(ChatError::Cancelled),
                outcome = call => outcome.unwrap_or_else(|_| {
                    tracing::error!(
                        message_id = %task_id,
                        backend = backend.name(),
                        "Chat backend panicked"
                    );
                    Err(ChatError::Transport("chat backend panicked".to_string()))
                }),
            };

            if matches!(result, Err(ChatError::Cancelled)) {
                tracing::debug!(message_id = %task_id, "Request cancelled");
                return;
            }

            // Receiver is gone once the conductor is dropped
            let _ = tx
                .send(Completion {
                    id: task_id,
                    result,
                })
                .await;
        });

        Some(id)
    }

    /// Reconcile every completion that has already arrived
    ///
    /// Never blocks. Call this regularly from the surface's event loop.
    pub fn poll_replies(&mut self) -> Vec<ReplyOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(completion) = self.completions_rx.try_recv() {
            if let Some(outcome) = self.complete(completion) {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    /// Wait for the next completion and reconcile it
    ///
    /// Returns `None` immediately when nothing is in flight.
    pub async fn next_reply(&mut self) -> Option<ReplyOutcome> {
        while !self.in_flight.is_empty() {
            let completion = self.completions_rx.recv().await?;
            if let Some(outcome) = self.complete(completion) {
                return Some(outcome);
            }
        }
        None
    }

    /// Cancel every in-flight request and stop accepting sends
    ///
    /// Entries whose reply had not arrived stay unanswered.
    pub fn shutdown(&mut self) {
        if self.state == ConductorState::ShutDown {
            return;
        }

        let abandoned = self.in_flight.len();
        self.cancel.cancel();
        self.in_flight.clear();
        self.state = ConductorState::ShutDown;

        tracing::debug!(
            session_id = %self.session_id,
            abandoned,
            "Conductor shut down"
        );
    }

    fn complete(&mut self, completion: Completion) -> Option<ReplyOutcome> {
        let Completion { id, result } = completion;

        if !self.in_flight.remove(&id) {
            tracing::debug!(message_id = %id, "Dropping completion for request no longer in flight");
            return None;
        }
        if self.in_flight.is_empty() && self.state == ConductorState::Waiting {
            self.state = ConductorState::Ready;
        }

        let reconciled = V::reconcile(
            &mut self.transcript,
            &id,
            &result,
            &self.config.fallback_message,
        );

        match result {
            Ok(_) if matches!(reconciled, Reconciled::Ignored) => {
                tracing::debug!(
                    message_id = %id,
                    "Dropping reply with no entry to reconcile"
                );
                None
            }
            Ok(reply) => {
                tracing::debug!(
                    message_id = %id,
                    reply_len = reply.response.len(),
                    "Reply received"
                );
                Some(ReplyOutcome::Answered {
                    id,
                    reply: reply.response,
                })
            }
            Err(error) => {
                tracing::warn!(
                    message_id = %id,
                    session_id = %self.session_id,
                    kind = error.kind().label(),
                    error = %error,
                    "Chat request failed"
                );
                let fallback = match reconciled {
                    Reconciled::Failed { appended } => appended,
                    Reconciled::Answered | Reconciled::Ignored => None,
                };
                Some(ReplyOutcome::Failed {
                    id,
                    error,
                    fallback,
                })
            }
        }
    }
}

impl<B: ChatBackend, V: ChatVariant> Drop for Conductor<B, V> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
