//! Core history types and identifiers.

pub mod config;
pub mod errors;
pub mod ids;
pub mod records;
pub mod role;

pub use config::StoreConfig;
pub use errors::{StoreError, StoreResult};
pub use ids::{ConversationId, MessageId, SessionId};
pub use records::{
    ChatTurn, Conversation, ConversationExport, ConversationSummary, Message, Metadata,
    SearchHit, StoreStats,
};
pub use role::Role;
