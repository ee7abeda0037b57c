//! Transcript Store
//!
//! Ordered conversation history owned by a single conductor. Entries are only
//! ever appended; reconciliation either fills in the reply half of an existing
//! entry (paired form) or appends a bot entry (role-tagged form).
//!
//! # Correlation
//!
//! Every entry carries a [`MessageId`] assigned at creation. Replies locate
//! their entry by that id, so several requests may be in flight at once and
//! complete in any order without touching the wrong entry.

use serde::{Deserialize, Serialize};

use crate::error::FailureKind;
use crate::messages::{now_ms, MessageId, Role};

/// Common behaviour of transcript entries
pub trait Entry: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Correlation id of this entry
    fn id(&self) -> &MessageId;
}

/// Reply state of a paired entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyStatus {
    /// Request issued, no reply yet
    Pending,
    /// Reply received and stored in `bot`
    Answered,
    /// Request failed; `bot` stays empty
    Failed(FailureKind),
}

/// A paired transcript entry: user text plus the bot's reply
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedMessage {
    /// Correlation id
    pub id: MessageId,
    /// What the user typed
    pub user: String,
    /// The reply, empty until it arrives
    pub bot: String,
    /// Reply state
    pub status: ReplyStatus,
    /// Creation time (Unix ms)
    pub timestamp_ms: i64,
}

impl PairedMessage {
    /// Create an unanswered entry
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            user: user.into(),
            bot: String::new(),
            status: ReplyStatus::Pending,
            timestamp_ms: now_ms(),
        }
    }

    /// Whether the reply has not arrived (pending or failed)
    #[must_use]
    pub fn is_unanswered(&self) -> bool {
        self.status != ReplyStatus::Answered
    }
}

impl Entry for PairedMessage {
    fn id(&self) -> &MessageId {
        &self.id
    }
}

/// A role-tagged transcript entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMessage {
    /// Correlation id
    pub id: MessageId,
    /// Who sent this message
    pub role: Role,
    /// Message content
    pub content: String,
    /// Creation time (Unix ms)
    pub timestamp_ms: i64,
}

impl RoleMessage {
    /// Create a new entry
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            timestamp_ms: now_ms(),
        }
    }

    /// Create a user entry
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a bot entry
    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(Role::Bot, content)
    }
}

impl Entry for RoleMessage {
    fn id(&self) -> &MessageId {
        &self.id
    }
}

/// Ordered sequence of entries
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transcript<E> {
    entries: Vec<E>,
}

impl<E: Entry> Default for Transcript<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entry> Transcript<E> {
    /// Create an empty transcript
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add an entry at the end
    pub fn append(&mut self, entry: E) -> MessageId {
        let id = entry.id().clone();
        self.entries.push(entry);
        id
    }

    /// All entries in arrival order
    #[must_use]
    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    /// Iterate entries in arrival order
    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.entries.iter()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the transcript has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recently appended entry
    #[must_use]
    pub fn last(&self) -> Option<&E> {
        self.entries.last()
    }

    /// Find an entry by id
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&E> {
        self.entries.iter().find(|e| e.id() == id)
    }

    fn get_mut(&mut self, id: &MessageId) -> Option<&mut E> {
        // Replies usually target recent entries
        self.entries.iter_mut().rev().find(|e| e.id() == id)
    }
}

impl Transcript<PairedMessage> {
    /// Store a reply in the entry with the given id
    ///
    /// Returns `false` if no such entry exists or it was already answered.
    pub fn reconcile(&mut self, id: &MessageId, reply: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(entry) if entry.status != ReplyStatus::Answered => {
                entry.bot = reply.into();
                entry.status = ReplyStatus::Answered;
                true
            }
            Some(_) => {
                tracing::warn!(message_id = %id, "Entry already answered, ignoring reply");
                false
            }
            None => {
                tracing::warn!(message_id = %id, "No transcript entry for reply");
                false
            }
        }
    }

    /// Mark the entry with the given id as failed, leaving `bot` empty
    pub fn mark_failed(&mut self, id: &MessageId, kind: FailureKind) -> bool {
        match self.get_mut(id) {
            Some(entry) if entry.status == ReplyStatus::Pending => {
                entry.status = ReplyStatus::Failed(kind);
                true
            }
            _ => false,
        }
    }

    /// Entries still waiting for their reply
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == ReplyStatus::Pending)
            .count()
    }
}

impl Transcript<RoleMessage> {
    /// Append the reply as a new bot entry
    pub fn reconcile(&mut self, reply: impl Into<String>) -> MessageId {
        self.append(RoleMessage::bot(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_append_preserves_order() {
        let mut transcript: Transcript<RoleMessage> = Transcript::new();
        transcript.append(RoleMessage::user("one"));
        transcript.append(RoleMessage::bot("two"));
        transcript.append(RoleMessage::user("three"));

        let contents: Vec<_> = transcript.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert_eq!(transcript.len(), 3);
    }

    #[test]
    fn test_paired_reconcile_by_id() {
        let mut transcript: Transcript<PairedMessage> = Transcript::new();
        let first = transcript.append(PairedMessage::new("first"));
        let second = transcript.append(PairedMessage::new("second"));

        // Reply to the older entry arrives after a newer send
        assert!(transcript.reconcile(&first, "reply one"));

        assert_eq!(transcript.get(&first).unwrap().bot, "reply one");
        assert_eq!(transcript.get(&second).unwrap().bot, "");
        assert_eq!(transcript.pending_count(), 1);
    }

    #[test]
    fn test_paired_reconcile_unknown_id() {
        let mut transcript: Transcript<PairedMessage> = Transcript::new();
        transcript.append(PairedMessage::new("hello"));

        assert!(!transcript.reconcile(&MessageId::new(), "orphan"));
        assert_eq!(transcript.last().unwrap().bot, "");
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_paired_reconcile_once() {
        let mut transcript: Transcript<PairedMessage> = Transcript::new();
        let id = transcript.append(PairedMessage::new("hello"));

        assert!(transcript.reconcile(&id, "first"));
        assert!(!transcript.reconcile(&id, "second"));
        assert_eq!(transcript.get(&id).unwrap().bot, "first");
    }

    #[test]
    fn test_paired_mark_failed() {
        let mut transcript: Transcript<PairedMessage> = Transcript::new();
        let id = transcript.append(PairedMessage::new("hello"));

        assert!(transcript.mark_failed(&id, FailureKind::Status));

        let entry = transcript.get(&id).unwrap();
        assert_eq!(entry.bot, "");
        assert_eq!(entry.status, ReplyStatus::Failed(FailureKind::Status));
        assert!(entry.is_unanswered());
        assert_eq!(transcript.pending_count(), 0);
    }

    #[test]
    fn test_role_reconcile_appends() {
        let mut transcript: Transcript<RoleMessage> = Transcript::new();
        transcript.append(RoleMessage::user("Hello"));
        let reply_id = transcript.reconcile("Hi there");

        assert_eq!(transcript.len(), 2);
        let last = transcript.last().unwrap();
        assert_eq!(last.id, reply_id);
        assert_eq!(last.role, Role::Bot);
        assert_eq!(last.content, "Hi there");
    }
}
