//! Conversation Variants
//!
//! The two transcript shapes differ in three places: what counts as a
//! sendable input, what the outbound request carries, and how a reply (or a
//! failure) lands in the transcript. [`ChatVariant`] captures exactly those
//! differences so the send controller stays shape-agnostic.
//!
//! | | Paired | RoleTagged |
//! |---|---|---|
//! | entry | `{user, bot}` | `{role, content}` |
//! | request | last message only | full history |
//! | reply | fills `bot` of its entry | appends a bot entry |
//! | failure | entry left unanswered | appends fallback text |
//! | attachments alone sendable | no | yes |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::attachments::AttachmentSet;
use crate::backend::{ChatReply, ChatRequest};
use crate::error::ChatError;
use crate::messages::{MessageId, SessionId};
use crate::transcript::{Entry, PairedMessage, RoleMessage, Transcript};

/// Runtime selector for a variant
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariantKind {
    /// `{user, bot}` pairs, reply fills the pair
    Paired,
    /// `{role, content}` entries, reply is appended
    #[default]
    RoleTagged,
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paired => write!(f, "paired"),
            Self::RoleTagged => write!(f, "role-tagged"),
        }
    }
}

impl FromStr for VariantKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paired" | "a" => Ok(Self::Paired),
            "role-tagged" | "role_tagged" | "roletagged" | "b" => Ok(Self::RoleTagged),
            other => Err(format!(
                "unknown variant '{other}' (expected 'paired' or 'role-tagged')"
            )),
        }
    }
}

/// What happened to the transcript when a completion was reconciled
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reconciled {
    /// The reply was stored (in place or as a new entry)
    Answered,
    /// The failure was recorded; `appended` is the fallback entry, if any
    Failed {
        /// Id of the fallback entry appended for the failure
        appended: Option<MessageId>,
    },
    /// No matching entry; nothing changed
    Ignored,
}

/// Shape-specific behaviour of a conversation
pub trait ChatVariant: Send + Sync + 'static {
    /// Transcript entry type
    type Entry: Entry;

    /// Runtime tag for this variant
    const KIND: VariantKind;

    /// Whether the pending input (plus staged files) may be sent
    fn accepts(input: &str, attachments: &AttachmentSet) -> bool;

    /// Build the user's entry from the raw input
    fn user_entry(content: String) -> Self::Entry;

    /// Build the outbound request once the user entry is in the transcript
    fn build_request(
        transcript: &Transcript<Self::Entry>,
        user_entry: &MessageId,
        session_id: &SessionId,
    ) -> ChatRequest;

    /// Fold a completed request into the transcript
    fn reconcile(
        transcript: &mut Transcript<Self::Entry>,
        user_entry: &MessageId,
        result: &Result<ChatReply, ChatError>,
        fallback: &str,
    ) -> Reconciled;
}

/// Paired form
#[derive(Clone, Copy, Debug, Default)]
pub struct Paired;

impl ChatVariant for Paired {
    type Entry = PairedMessage;

    const KIND: VariantKind = VariantKind::Paired;

    fn accepts(input: &str, _attachments: &AttachmentSet) -> bool {
        !input.trim().is_empty()
    }

    fn user_entry(content: String) -> PairedMessage {
        PairedMessage::new(content)
    }

    fn build_request(
        transcript: &Transcript<PairedMessage>,
        user_entry: &MessageId,
        session_id: &SessionId,
    ) -> ChatRequest {
        let message = transcript
            .get(user_entry)
            .map(|e| e.user.clone())
            .unwrap_or_default();
        ChatRequest::single(message, session_id)
    }

    fn reconcile(
        transcript: &mut Transcript<PairedMessage>,
        user_entry: &MessageId,
        result: &Result<ChatReply, ChatError>,
        _fallback: &str,
    ) -> Reconciled {
        match result {
            Ok(reply) => {
                if transcript.reconcile(user_entry, reply.response.clone()) {
                    Reconciled::Answered
                } else {
                    Reconciled::Ignored
                }
            }
            Err(err) => {
                if transcript.mark_failed(user_entry, err.kind()) {
                    Reconciled::Failed { appended: None }
                } else {
                    Reconciled::Ignored
                }
            }
        }
    }
}

/// Role-tagged form
#[derive(Clone, Copy, Debug, Default)]
pub struct RoleTagged;

impl ChatVariant for RoleTagged {
    type Entry = RoleMessage;

    const KIND: VariantKind = VariantKind::RoleTagged;

    fn accepts(input: &str, attachments: &AttachmentSet) -> bool {
        !input.trim().is_empty() || !attachments.is_empty()
    }

    fn user_entry(content: String) -> RoleMessage {
        RoleMessage::user(content)
    }

    fn build_request(
        transcript: &Transcript<RoleMessage>,
        _user_entry: &MessageId,
        session_id: &SessionId,
    ) -> ChatRequest {
        ChatRequest::history(transcript.iter(), session_id)
    }

    fn reconcile(
        transcript: &mut Transcript<RoleMessage>,
        _user_entry: &MessageId,
        result: &Result<ChatReply, ChatError>,
        fallback: &str,
    ) -> Reconciled {
        match result {
            Ok(reply) => {
                transcript.reconcile(reply.response.clone());
                Reconciled::Answered
            }
            Err(_) => Reconciled::Failed {
                appended: Some(transcript.reconcile(fallback)),
            },
        }
    }
}
