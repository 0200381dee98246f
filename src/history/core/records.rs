//! Records returned by the conversation store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::core::ids::{ConversationId, MessageId, SessionId};
use crate::history::core::role::Role;

/// Opaque caller metadata, stored verbatim as JSON text.
///
/// `None` and `Some(json!({}))` are different values and round-trip as such.
pub type Metadata = serde_json::Value;

/// A full conversation row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Surrogate key.
    pub id: ConversationId,
    /// External handle.
    pub session_id: SessionId,
    /// Optional display title.
    pub title: Option<String>,
    /// Creation time, immutable.
    pub created_at: DateTime<Utc>,
    /// Time of the last appended message (or creation).
    pub updated_at: DateTime<Utc>,
    /// Optional opaque metadata.
    pub metadata: Option<Metadata>,
}

/// Conversation listing entry (no messages, no metadata).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Surrogate key.
    pub id: ConversationId,
    /// External handle.
    pub session_id: SessionId,
    /// Optional display title.
    pub title: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last activity time.
    pub updated_at: DateTime<Utc>,
}

/// A full message row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Surrogate key.
    pub id: MessageId,
    /// Owning conversation.
    pub conversation_id: ConversationId,
    /// Author role.
    pub role: Role,
    /// Message body.
    pub content: String,
    /// Insertion time, the ordering key.
    pub timestamp: DateTime<Utc>,
    /// Optional opaque metadata.
    pub metadata: Option<Metadata>,
}

/// One role/content pair, the shape consumed by model invocation code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Author role.
    pub role: Role,
    /// Message body.
    pub content: String,
}

impl ChatTurn {
    /// Build a turn.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A message matched by substring search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Matched message.
    pub message_id: MessageId,
    /// Owning conversation handle.
    pub session_id: SessionId,
    /// Owning conversation title.
    pub conversation_title: Option<String>,
    /// Author role.
    pub role: Role,
    /// Message body.
    pub content: String,
    /// Message time.
    pub timestamp: DateTime<Utc>,
}

/// Self-contained export of one conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationExport {
    /// External handle.
    pub session_id: SessionId,
    /// Optional display title.
    pub title: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last activity time.
    pub updated_at: DateTime<Utc>,
    /// Optional opaque metadata.
    pub metadata: Option<Metadata>,
    /// Ordered turns.
    pub messages: Vec<ChatTurn>,
}

/// Aggregate counters over the whole store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of conversations.
    pub conversations: u64,
    /// Number of messages.
    pub messages: u64,
    /// Message count per role, largest first. Roles without messages are omitted.
    pub messages_by_role: Vec<(Role, u64)>,
}
