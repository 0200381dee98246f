//! Persistent storage for conversations and messages.

pub mod async_store;
mod queries;
mod schema;
pub mod sqlite_store;

pub use async_store::{AsyncConversationStore, AsyncSqliteConversationStore, StoreFuture};
pub use sqlite_store::{ConversationStore, SqliteConversationStore};
