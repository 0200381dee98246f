//! Conversation history subsystem.
//!
//! Durable storage of multi-turn conversations keyed by a caller-supplied
//! session identifier, organized into:
//! - `core`: configuration, errors, identifiers, roles, and records
//! - `storage`: the `SQLite` schema plus blocking and async store handles
//! - `adapters`: tracing setup and "continue or start" helpers for chat loops
//! - `seed`: a canned customer-support data set
//!
//! ```no_run
//! use chat_history::history::{ConversationStore, Role, SessionId, SqliteConversationStore};
//!
//! # fn main() -> Result<(), chat_history::history::StoreError> {
//! let mut store = SqliteConversationStore::open_path("chat_history.db")?;
//! let session = SessionId::new("s1")?;
//! let id = store.create_conversation(&session, Some("Greeting"), None)?;
//! store.add_message(id, Role::Human, "hi", None)?;
//! store.add_message(id, Role::Ai, "hello", None)?;
//! let turns = store.get_conversation_messages(&session)?;
//! assert_eq!(turns.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod core;
pub mod seed;
pub mod storage;

// Re-export commonly used types for convenience
pub use self::adapters::{ResumedConversation, continue_or_start, init_tracing, record_exchange};
pub use self::core::{
    ChatTurn, Conversation, ConversationExport, ConversationId, ConversationSummary, Message,
    MessageId, Metadata, Role, SearchHit, SessionId, StoreConfig, StoreError, StoreResult,
    StoreStats,
};
pub use self::seed::{SampleConversation, SeedReport, sample_conversations, seed_store};
pub use self::storage::{
    AsyncConversationStore, AsyncSqliteConversationStore, ConversationStore,
    SqliteConversationStore, StoreFuture,
};
