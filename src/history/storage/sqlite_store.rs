//! Blocking `SQLite` conversation store.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::history::core::config::StoreConfig;
use crate::history::core::errors::{StoreError, StoreResult};
use crate::history::core::ids::{ConversationId, MessageId, SessionId};
use crate::history::core::records::{
    ChatTurn, Conversation, ConversationExport, ConversationSummary, Message, Metadata,
    SearchHit, StoreStats,
};
use crate::history::core::role::Role;
use crate::history::storage::{queries, schema};

/// Conversation history store.
///
/// Mutations take `&mut self`: one handle is one writer. Open several handles
/// on the same file to write from several threads or processes.
pub trait ConversationStore {
    /// Create a conversation, or return the id of the existing one.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn create_conversation(
        &mut self,
        session_id: &SessionId,
        title: Option<&str>,
        metadata: Option<&Metadata>,
    ) -> StoreResult<ConversationId>;

    /// Append a message and refresh the conversation's `updated_at`.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for empty content, `ReferentialIntegrity` if
    /// the conversation does not exist, or a storage error.
    fn add_message(
        &mut self,
        conversation_id: ConversationId,
        role: Role,
        content: &str,
        metadata: Option<&Metadata>,
    ) -> StoreResult<MessageId>;

    /// Ordered role/content pairs of a conversation, empty if unknown.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn get_conversation_messages(&self, session_id: &SessionId) -> StoreResult<Vec<ChatTurn>>;

    /// Up to `limit` conversations, most recently active first.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn get_recent_conversations(&self, limit: usize) -> StoreResult<Vec<ConversationSummary>>;

    /// Delete a conversation and all of its messages. Unknown sessions are a no-op.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn delete_conversation(&mut self, session_id: &SessionId) -> StoreResult<()>;

    /// Up to `limit` messages containing `query`, newest first.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn search_messages(&self, query: &str, limit: usize) -> StoreResult<Vec<SearchHit>>;

    /// Conversation fields and ordered turns, `None` if unknown.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn export_conversation(&self, session_id: &SessionId)
    -> StoreResult<Option<ConversationExport>>;

    /// Full conversation row, `None` if unknown.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn find_conversation(&self, session_id: &SessionId) -> StoreResult<Option<Conversation>>;

    /// Full message rows of a conversation in order, empty if unknown.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn get_messages(&self, session_id: &SessionId) -> StoreResult<Vec<Message>>;

    /// Store-wide counters.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn stats(&self) -> StoreResult<StoreStats>;

    /// Release the backing connection. Later calls fail with `UseAfterClose`.
    ///
    /// # Errors
    /// Returns an error if `SQLite` refuses to close the connection.
    fn close(&mut self) -> StoreResult<()>;
}

/// `SQLite` implementation of the conversation store.
///
/// The connection is released when the store is dropped, so a store bound to
/// a scope is closed on every exit path, including early `?` returns.
pub struct SqliteConversationStore {
    conn: Option<Connection>,
    path: PathBuf,
}

impl SqliteConversationStore {
    /// Open (and initialize if needed) the store described by `config`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the database
    /// cannot be opened or initialized.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.sqlite_path)?
        };
        schema::prepare_connection(&conn, config)?;

        info!(path = %config.sqlite_path.display(), "Opened conversation store");
        Ok(Self {
            conn: Some(conn),
            path: config.sqlite_path.clone(),
        })
    }

    /// Open the store at `path` with default settings.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub fn open_path(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open(&StoreConfig::at(path))
    }

    /// Open a private in-memory store.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    /// Database path this store was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `close` has been called.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn conn(&self) -> StoreResult<&Connection> {
        self.conn.as_ref().ok_or(StoreError::UseAfterClose)
    }

    fn conn_mut(&mut self) -> StoreResult<&mut Connection> {
        self.conn.as_mut().ok_or(StoreError::UseAfterClose)
    }
}

impl ConversationStore for SqliteConversationStore {
    fn create_conversation(
        &mut self,
        session_id: &SessionId,
        title: Option<&str>,
        metadata: Option<&Metadata>,
    ) -> StoreResult<ConversationId> {
        let outcome = queries::create_conversation(self.conn_mut()?, session_id, title, metadata)?;
        if outcome.inserted {
            debug!(%session_id, id = %outcome.id, "Created conversation");
        } else {
            debug!(%session_id, id = %outcome.id, "Conversation already exists");
        }
        Ok(outcome.id)
    }

    fn add_message(
        &mut self,
        conversation_id: ConversationId,
        role: Role,
        content: &str,
        metadata: Option<&Metadata>,
    ) -> StoreResult<MessageId> {
        let outcome =
            queries::add_message(self.conn_mut()?, conversation_id, role, content, metadata)?;
        debug!(
            conversation = %conversation_id,
            message = %outcome.id,
            %role,
            "Appended message"
        );
        Ok(outcome.id)
    }

    fn get_conversation_messages(&self, session_id: &SessionId) -> StoreResult<Vec<ChatTurn>> {
        queries::conversation_turns(self.conn()?, session_id)
    }

    fn get_recent_conversations(&self, limit: usize) -> StoreResult<Vec<ConversationSummary>> {
        queries::recent_conversations(self.conn()?, limit)
    }

    fn delete_conversation(&mut self, session_id: &SessionId) -> StoreResult<()> {
        if queries::delete_conversation(self.conn_mut()?, session_id)? {
            debug!(%session_id, "Deleted conversation");
        }
        Ok(())
    }

    fn search_messages(&self, query: &str, limit: usize) -> StoreResult<Vec<SearchHit>> {
        queries::search_messages(self.conn()?, query, limit)
    }

    fn export_conversation(
        &self,
        session_id: &SessionId,
    ) -> StoreResult<Option<ConversationExport>> {
        queries::export_conversation(self.conn()?, session_id)
    }

    fn find_conversation(&self, session_id: &SessionId) -> StoreResult<Option<Conversation>> {
        queries::find_conversation(self.conn()?, session_id)
    }

    fn get_messages(&self, session_id: &SessionId) -> StoreResult<Vec<Message>> {
        queries::conversation_messages(self.conn()?, session_id)
    }

    fn stats(&self) -> StoreResult<StoreStats> {
        queries::stats(self.conn()?)
    }

    fn close(&mut self) -> StoreResult<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        conn.close().map_err(|(_, err)| StoreError::Sqlite(err))?;
        info!(path = %self.path.display(), "Closed conversation store");
        Ok(())
    }
}

impl std::fmt::Debug for SqliteConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConversationStore")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .finish()
    }
}
