//! Chat channel types.
//!
//! The chat socket carries named events keyed by a conversation identifier.
//! Inbound frames decode into [`ChatEvent`]; outbound frames are built from
//! [`ChatCommand`]. Both use the same `event`-tagged envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Server-assigned message identifier.
    pub id: Uuid,
    /// Conversation the message belongs to.
    pub conversation_id: String,
    /// Identifier of the author.
    pub author_id: String,
    /// Display name of the author, if known.
    #[serde(default)]
    pub author_name: Option<String>,
    /// Message text.
    pub body: String,
    /// When the message was sent.
    pub sent_at: DateTime<Utc>,
}

/// Inbound chat events, tagged by name on the wire.
///
/// Unknown event names are dropped by the channel before this decode is
/// attempted, so every variant here is an event the console handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ChatEvent {
    /// A new message arrived in a joined conversation.
    #[serde(rename_all = "camelCase")]
    NewMessage {
        /// Conversation the event is scoped to.
        conversation: String,
        /// The message.
        message: ChatMessage,
    },
    /// The backend is still processing a submitted message.
    #[serde(rename_all = "camelCase")]
    MessageProcessing {
        /// Conversation the event is scoped to.
        conversation: String,
        /// Message being processed.
        message_id: Uuid,
    },
    /// A participant is typing.
    #[serde(rename_all = "camelCase")]
    Typing {
        /// Conversation the event is scoped to.
        conversation: String,
        /// The typing participant.
        user_id: String,
    },
    /// A participant read a message.
    #[serde(rename_all = "camelCase")]
    MessageRead {
        /// Conversation the event is scoped to.
        conversation: String,
        /// The message that was read.
        message_id: Uuid,
        /// The participant who read it.
        user_id: String,
    },
}

impl ChatEvent {
    /// The conversation this event is scoped to.
    #[must_use]
    pub fn conversation(&self) -> &str {
        match self {
            Self::NewMessage { conversation, .. }
            | Self::MessageProcessing { conversation, .. }
            | Self::Typing { conversation, .. }
            | Self::MessageRead { conversation, .. } => conversation,
        }
    }
}

/// Outbound chat frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ChatCommand {
    /// Join a conversation room; scopes delivery to that conversation.
    #[serde(rename_all = "camelCase")]
    Join {
        /// Conversation to join.
        conversation: String,
    },
    /// Leave a conversation room.
    #[serde(rename_all = "camelCase")]
    Leave {
        /// Conversation to leave.
        conversation: String,
    },
    /// Send a message.
    #[serde(rename_all = "camelCase")]
    Message {
        /// Target conversation.
        conversation: String,
        /// Message text.
        body: String,
    },
    /// Announce that the user is typing.
    #[serde(rename_all = "camelCase")]
    Typing {
        /// Target conversation.
        conversation: String,
    },
    /// Mark a message as read.
    #[serde(rename_all = "camelCase")]
    MarkRead {
        /// Target conversation.
        conversation: String,
        /// Message to mark.
        message_id: Uuid,
    },
}

/// What a chat-channel subscriber receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatSignal {
    /// A decoded inbound event.
    Event(ChatEvent),
    /// Terminal transport failure; nothing follows this signal.
    Error(crate::realtime::StreamError),
}
