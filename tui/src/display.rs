//! Display State Types
//!
//! Types that represent what the transcript pane shows. They are derived
//! from the conductor's transcript on every frame and carry no state of
//! their own.
//!
//! - DisplayMessage: one labelled message in the transcript pane
//! - DisplayLine: one wrapped terminal line, ready to style

use chatbox_conductor::{
    MessageId, PairedMessage, ReplyStatus, Role, RoleMessage, Transcript,
};

/// Prefix for user entries in the paired view
pub const PAIRED_USER_LABEL: &str = "User";

/// Prefix for user entries in the role-tagged view
pub const ROLE_TAGGED_USER_LABEL: &str = "You";

/// Shown in place of a reply that has not arrived yet
pub const WAITING_MARKER: &str = "...";

/// Who or what a display message represents
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayRole {
    /// Text the user sent
    User,
    /// A reply (or fallback text) from the bot
    Bot,
    /// A reply that is still on its way
    Waiting,
    /// A paired entry whose request failed
    Failed,
}

impl From<Role> for DisplayRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => DisplayRole::User,
            Role::Bot => DisplayRole::Bot,
        }
    }
}

/// A labelled conversation message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayMessage {
    /// Transcript entry this message came from
    pub id: MessageId,
    /// Who sent this message
    pub role: DisplayRole,
    /// Label printed before the content
    pub label: String,
    /// The message content
    pub content: String,
    /// Whether the message hugs the right edge
    pub right_aligned: bool,
}

impl DisplayMessage {
    fn new(id: &MessageId, role: DisplayRole, label: &str, content: impl Into<String>) -> Self {
        Self {
            id: id.clone(),
            role,
            label: label.to_string(),
            content: content.into(),
            right_aligned: false,
        }
    }

    /// Label and content as one string
    pub fn text(&self) -> String {
        if self.label.is_empty() {
            self.content.clone()
        } else {
            format!("{}: {}", self.label, self.content)
        }
    }
}

/// Paired view: `User: text`, then the bot's reply once it arrives
pub fn paired_messages(
    transcript: &Transcript<PairedMessage>,
    bot_label: &str,
) -> Vec<DisplayMessage> {
    let mut messages = Vec::with_capacity(transcript.len() * 2);
    for entry in transcript.iter() {
        messages.push(DisplayMessage::new(
            &entry.id,
            DisplayRole::User,
            PAIRED_USER_LABEL,
            entry.user.as_str(),
        ));

        let reply = match entry.status {
            ReplyStatus::Answered => {
                DisplayMessage::new(&entry.id, DisplayRole::Bot, bot_label, entry.bot.as_str())
            }
            ReplyStatus::Pending => {
                DisplayMessage::new(&entry.id, DisplayRole::Waiting, bot_label, WAITING_MARKER)
            }
            ReplyStatus::Failed(kind) => DisplayMessage::new(
                &entry.id,
                DisplayRole::Failed,
                "",
                format!("(no reply: {})", kind.label()),
            ),
        };
        messages.push(reply);
    }
    messages
}

/// Role-tagged view: `You:` on the right, bot replies on the left
pub fn role_tagged_messages(
    transcript: &Transcript<RoleMessage>,
    bot_label: &str,
    awaiting_reply: bool,
) -> Vec<DisplayMessage> {
    let mut messages: Vec<DisplayMessage> = transcript
        .iter()
        .map(|entry| {
            let role = DisplayRole::from(entry.role);
            let label = match entry.role {
                Role::User => ROLE_TAGGED_USER_LABEL,
                Role::Bot => bot_label,
            };
            let mut message = DisplayMessage::new(&entry.id, role, label, entry.content.as_str());
            message.right_aligned = entry.role == Role::User;
            message
        })
        .collect();

    if awaiting_reply {
        if let Some(last) = transcript.last() {
            messages.push(DisplayMessage::new(
                &last.id,
                DisplayRole::Waiting,
                bot_label,
                WAITING_MARKER,
            ));
        }
    }
    messages
}

/// One wrapped line of the transcript pane
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayLine {
    /// Text, already padded when right aligned
    pub text: String,
    /// Role of the message this line belongs to, `None` for spacers
    pub role: Option<DisplayRole>,
}

impl DisplayLine {
    fn spacer() -> Self {
        Self {
            text: String::new(),
            role: None,
        }
    }
}

/// Wrap messages to `width` columns, with a blank line after each message
pub fn wrap_messages(messages: &[DisplayMessage], width: usize) -> Vec<DisplayLine> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for message in messages {
        let text = message.text();
        for line in textwrap::wrap(&text, width) {
            let text = if message.right_aligned {
                format!("{line:>width$}")
            } else {
                line.into_owned()
            };
            lines.push(DisplayLine {
                text,
                role: Some(message.role),
            });
        }
        lines.push(DisplayLine::spacer());
    }

    lines
}
