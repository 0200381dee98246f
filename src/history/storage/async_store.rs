//! Async conversation store for callers running inside a Tokio runtime.
//!
//! The connection lives on a `tokio-rusqlite` worker thread; every operation
//! ships one of the shared `queries` functions to it, so both store flavours
//! have identical semantics.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::Mutex;
use tokio_rusqlite::Connection;
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

/// Boxed future type for async store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Async conversation store trait.
pub trait AsyncConversationStore: Send + Sync {
    /// Create a conversation, or return the id of the existing one.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn create_conversation(
        &self,
        session_id: &SessionId,
        title: Option<&str>,
        metadata: Option<&Metadata>,
    ) -> StoreFuture<'_, StoreResult<ConversationId>>;

    /// Append a message and refresh the conversation's `updated_at`.
    ///
    /// # Errors
    /// Returns `InvalidArgument`, `ReferentialIntegrity`, or a storage error.
    fn add_message(
        &self,
        conversation_id: ConversationId,
        role: Role,
        content: &str,
        metadata: Option<&Metadata>,
    ) -> StoreFuture<'_, StoreResult<MessageId>>;

    /// Ordered role/content pairs of a conversation.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn get_conversation_messages(
        &self,
        session_id: &SessionId,
    ) -> StoreFuture<'_, StoreResult<Vec<ChatTurn>>>;

    /// Up to `limit` conversations, most recently active first.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn get_recent_conversations(
        &self,
        limit: usize,
    ) -> StoreFuture<'_, StoreResult<Vec<ConversationSummary>>>;

    /// Delete a conversation and its messages.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn delete_conversation(&self, session_id: &SessionId) -> StoreFuture<'_, StoreResult<()>>;

    /// Up to `limit` messages containing `query`, newest first.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn search_messages(
        &self,
        query: &str,
        limit: usize,
    ) -> StoreFuture<'_, StoreResult<Vec<SearchHit>>>;

    /// Conversation fields and ordered turns.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn export_conversation(
        &self,
        session_id: &SessionId,
    ) -> StoreFuture<'_, StoreResult<Option<ConversationExport>>>;

    /// Full conversation row.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn find_conversation(
        &self,
        session_id: &SessionId,
    ) -> StoreFuture<'_, StoreResult<Option<Conversation>>>;

    /// Full message rows of a conversation.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn get_messages(&self, session_id: &SessionId) -> StoreFuture<'_, StoreResult<Vec<Message>>>;

    /// Store-wide counters.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn stats(&self) -> StoreFuture<'_, StoreResult<StoreStats>>;

    /// Release the backing connection.
    ///
    /// # Errors
    /// Returns an error if the worker fails to close the connection.
    fn close(&self) -> StoreFuture<'_, StoreResult<()>>;
}

/// `SQLite` implementation of the async conversation store.
pub struct AsyncSqliteConversationStore {
    conn: Mutex<Option<Connection>>,
    config: StoreConfig,
}

impl AsyncSqliteConversationStore {
    /// Open (and initialize if needed) the store described by `config`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the database
    /// cannot be opened or initialized.
    pub async fn open(config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let conn = if config.is_in_memory() {
            Connection::open_in_memory().await?
        } else {
            Connection::open(&config.sqlite_path).await?
        };

        let setup = config.clone();
        conn.call(move |conn| {
            schema::prepare_connection(conn, &setup)?;
            Ok(())
        })
        .await?;

        info!(path = %config.sqlite_path.display(), "Opened async conversation store");
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            config: config.clone(),
        })
    }

    /// Open a private in-memory store.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub async fn open_in_memory() -> StoreResult<Self> {
        Self::open(&StoreConfig::in_memory()).await
    }

    /// Configuration this store was opened with.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Whether `close` has been called.
    pub async fn is_closed(&self) -> bool {
        self.conn.lock().await.is_none()
    }

    /// Run one shared query on the worker thread.
    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut rusqlite::Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = self
            .conn
            .lock()
            .await
            .clone()
            .ok_or(StoreError::UseAfterClose)?;
        conn.call(move |conn| Ok(op(conn)))
            .await
            .map_err(|err| match err {
                // Another task closed the store while this call was queued.
                tokio_rusqlite::Error::ConnectionClosed => StoreError::UseAfterClose,
                other => StoreError::TokioSqlite(other),
            })?
    }
}

impl AsyncConversationStore for AsyncSqliteConversationStore {
    fn create_conversation(
        &self,
        session_id: &SessionId,
        title: Option<&str>,
        metadata: Option<&Metadata>,
    ) -> StoreFuture<'_, StoreResult<ConversationId>> {
        let session_id = session_id.clone();
        let title = title.map(str::to_string);
        let metadata = metadata.cloned();
        Box::pin(async move {
            let session = session_id.clone();
            let outcome = self
                .run(move |conn| {
                    queries::create_conversation(
                        conn,
                        &session,
                        title.as_deref(),
                        metadata.as_ref(),
                    )
                })
                .await?;
            debug!(%session_id, id = %outcome.id, inserted = outcome.inserted, "Create conversation");
            Ok(outcome.id)
        })
    }

    fn add_message(
        &self,
        conversation_id: ConversationId,
        role: Role,
        content: &str,
        metadata: Option<&Metadata>,
    ) -> StoreFuture<'_, StoreResult<MessageId>> {
        let content = content.to_string();
        let metadata = metadata.cloned();
        Box::pin(async move {
            let outcome = self
                .run(move |conn| {
                    queries::add_message(conn, conversation_id, role, &content, metadata.as_ref())
                })
                .await?;
            debug!(
                conversation = %conversation_id,
                message = %outcome.id,
                %role,
                "Appended message"
            );
            Ok(outcome.id)
        })
    }

    fn get_conversation_messages(
        &self,
        session_id: &SessionId,
    ) -> StoreFuture<'_, StoreResult<Vec<ChatTurn>>> {
        let session_id = session_id.clone();
        Box::pin(async move {
            self.run(move |conn| queries::conversation_turns(conn, &session_id))
                .await
        })
    }

    fn get_recent_conversations(
        &self,
        limit: usize,
    ) -> StoreFuture<'_, StoreResult<Vec<ConversationSummary>>> {
        Box::pin(async move {
            self.run(move |conn| queries::recent_conversations(conn, limit))
                .await
        })
    }

    fn delete_conversation(&self, session_id: &SessionId) -> StoreFuture<'_, StoreResult<()>> {
        let session_id = session_id.clone();
        Box::pin(async move {
            let session = session_id.clone();
            let deleted = self
                .run(move |conn| queries::delete_conversation(conn, &session))
                .await?;
            if deleted {
                debug!(%session_id, "Deleted conversation");
            }
            Ok(())
        })
    }

    fn search_messages(
        &self,
        query: &str,
        limit: usize,
    ) -> StoreFuture<'_, StoreResult<Vec<SearchHit>>> {
        let query = query.to_string();
        Box::pin(async move {
            self.run(move |conn| queries::search_messages(conn, &query, limit))
                .await
        })
    }

    fn export_conversation(
        &self,
        session_id: &SessionId,
    ) -> StoreFuture<'_, StoreResult<Option<ConversationExport>>> {
        let session_id = session_id.clone();
        Box::pin(async move {
            self.run(move |conn| queries::export_conversation(conn, &session_id))
                .await
        })
    }

    fn find_conversation(
        &self,
        session_id: &SessionId,
    ) -> StoreFuture<'_, StoreResult<Option<Conversation>>> {
        let session_id = session_id.clone();
        Box::pin(async move {
            self.run(move |conn| queries::find_conversation(conn, &session_id))
                .await
        })
    }

    fn get_messages(&self, session_id: &SessionId) -> StoreFuture<'_, StoreResult<Vec<Message>>> {
        let session_id = session_id.clone();
        Box::pin(async move {
            self.run(move |conn| queries::conversation_messages(conn, &session_id))
                .await
        })
    }

    fn stats(&self) -> StoreFuture<'_, StoreResult<StoreStats>> {
        Box::pin(async move { self.run(|conn| queries::stats(conn)).await })
    }

    fn close(&self) -> StoreFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let Some(conn) = self.conn.lock().await.take() else {
                return Ok(());
            };
            conn.close().await?;
            info!(path = %self.config.sqlite_path.display(), "Closed async conversation store");
            Ok(())
        })
    }
}
