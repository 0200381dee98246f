//! Connection-level operations shared by the sync and async stores.
//!
//! Each function runs one store operation against a prepared connection.
//! Writes open an `IMMEDIATE` transaction: the write lock is taken up front, so
//! two handles on the same file queue on the busy timeout instead of failing a
//! read-to-write upgrade halfway through.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

use crate::history::core::errors::{StoreError, StoreResult};
use crate::history::core::ids::{ConversationId, MessageId, SessionId};
use crate::history::core::records::{
    ChatTurn, Conversation, ConversationExport, ConversationSummary, Message, Metadata,
    SearchHit, StoreStats,
};
use crate::history::core::role::Role;

/// Outcome of an insert-or-fetch on `session_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CreateOutcome {
    /// Surviving conversation id.
    pub id: ConversationId,
    /// False when the session already existed.
    pub inserted: bool,
}

/// Outcome of a message insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct AppendOutcome {
    /// New message id.
    pub id: MessageId,
    /// Timestamp given to the message and to the conversation's `updated_at`.
    pub timestamp: DateTime<Utc>,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn decode_timestamp(ms: i64) -> StoreResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| StoreError::InvalidRecord(format!("invalid timestamp: {ms}")))
}

fn encode_metadata(metadata: Option<&Metadata>) -> StoreResult<Option<String>> {
    Ok(metadata.map(serde_json::to_string).transpose()?)
}

fn decode_metadata(raw: Option<String>) -> StoreResult<Option<Metadata>> {
    Ok(raw.as_deref().map(serde_json::from_str).transpose()?)
}

/// `LIMIT` bound for a caller limit, `None` when nothing should be returned.
fn sql_limit(limit: usize) -> Option<i64> {
    if limit == 0 {
        return None;
    }
    Some(i64::try_from(limit).unwrap_or(i64::MAX))
}

type ConversationRow = (
    ConversationId,
    SessionId,
    Option<String>,
    i64,
    i64,
    Option<String>,
);

type MessageRow = (
    MessageId,
    ConversationId,
    Role,
    String,
    i64,
    Option<String>,
);

fn conversation_from_row(row: ConversationRow) -> StoreResult<Conversation> {
    let (id, session_id, title, created_at, updated_at, metadata) = row;
    Ok(Conversation {
        id,
        session_id,
        title,
        created_at: decode_timestamp(created_at)?,
        updated_at: decode_timestamp(updated_at)?,
        metadata: decode_metadata(metadata)?,
    })
}

fn message_from_row(row: MessageRow) -> StoreResult<Message> {
    let (id, conversation_id, role, content, timestamp, metadata) = row;
    Ok(Message {
        id,
        conversation_id,
        role,
        content,
        timestamp: decode_timestamp(timestamp)?,
        metadata: decode_metadata(metadata)?,
    })
}

/// Insert a conversation, or return the existing one for `session_id`.
///
/// The uniqueness constraint arbitrates concurrent creators; the loser's insert
/// becomes a no-op and the follow-up select inside the same transaction sees
/// the winner's row.
pub(crate) fn create_conversation(
    conn: &mut Connection,
    session_id: &SessionId,
    title: Option<&str>,
    metadata: Option<&Metadata>,
) -> StoreResult<CreateOutcome> {
    let metadata = encode_metadata(metadata)?;
    let now = now_millis();

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let inserted = tx.execute(
        "INSERT INTO conversations (session_id, title, created_at, updated_at, metadata)
         VALUES (?1, ?2, ?3, ?3, ?4)
         ON CONFLICT (session_id) DO NOTHING",
        params![session_id, title, now, metadata],
    )?;
    let id: ConversationId = tx.query_row(
        "SELECT id FROM conversations WHERE session_id = ?1",
        params![session_id],
        |row| row.get(0),
    )?;
    tx.commit()?;

    Ok(CreateOutcome {
        id,
        inserted: inserted > 0,
    })
}

/// Append one message and bump the owner's `updated_at` in one transaction.
///
/// The message timestamp is `max(now, updated_at)`, so `updated_at` never
/// moves backwards and timestamp order matches insertion order even if the
/// wall clock steps back.
pub(crate) fn add_message(
    conn: &mut Connection,
    conversation_id: ConversationId,
    role: Role,
    content: &str,
    metadata: Option<&Metadata>,
) -> StoreResult<AppendOutcome> {
    if content.is_empty() {
        return Err(StoreError::InvalidArgument(
            "message content must not be empty".to_string(),
        ));
    }
    let metadata = encode_metadata(metadata)?;
    let now = now_millis();

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let updated_at: Option<i64> = tx
        .query_row(
            "SELECT updated_at FROM conversations WHERE id = ?1",
            params![conversation_id],
            |row| row.get(0),
        )
        .optional()?;
    // Dropping `tx` here rolls back; nothing was written yet.
    let Some(updated_at) = updated_at else {
        return Err(StoreError::ReferentialIntegrity(conversation_id));
    };

    let ts = now.max(updated_at);
    tx.execute(
        "INSERT INTO messages (conversation_id, role, content, timestamp, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![conversation_id, role, content, ts, metadata],
    )?;
    let id = MessageId(tx.last_insert_rowid());
    tx.execute(
        "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
        params![ts, conversation_id],
    )?;
    tx.commit()?;

    Ok(AppendOutcome {
        id,
        timestamp: decode_timestamp(ts)?,
    })
}

/// Ordered role/content pairs for a session. Unknown sessions yield nothing.
pub(crate) fn conversation_turns(
    conn: &Connection,
    session_id: &SessionId,
) -> StoreResult<Vec<ChatTurn>> {
    let mut stmt = conn.prepare_cached(
        "SELECT m.role, m.content
         FROM messages m
         JOIN conversations c ON m.conversation_id = c.id
         WHERE c.session_id = ?1
         ORDER BY m.timestamp ASC, m.id ASC",
    )?;
    let turns = stmt
        .query_map(params![session_id], |row| {
            Ok(ChatTurn {
                role: row.get(0)?,
                content: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;
    Ok(turns)
}

/// Full message rows for a session, in conversation order.
pub(crate) fn conversation_messages(
    conn: &Connection,
    session_id: &SessionId,
) -> StoreResult<Vec<Message>> {
    let mut stmt = conn.prepare_cached(
        "SELECT m.id, m.conversation_id, m.role, m.content, m.timestamp, m.metadata
         FROM messages m
         JOIN conversations c ON m.conversation_id = c.id
         WHERE c.session_id = ?1
         ORDER BY m.timestamp ASC, m.id ASC",
    )?;
    let rows = stmt
        .query_map(params![session_id], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        })?
        .collect::<Result<Vec<MessageRow>, rusqlite::Error>>()?;
    rows.into_iter().map(message_from_row).collect()
}

/// Look up one conversation by its handle.
pub(crate) fn find_conversation(
    conn: &Connection,
    session_id: &SessionId,
) -> StoreResult<Option<Conversation>> {
    let row: Option<ConversationRow> = conn
        .prepare_cached(
            "SELECT id, session_id, title, created_at, updated_at, metadata
             FROM conversations
             WHERE session_id = ?1",
        )?
        .query_row(params![session_id], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        })
        .optional()?;
    row.map(conversation_from_row).transpose()
}

/// Most recently active conversations first.
pub(crate) fn recent_conversations(
    conn: &Connection,
    limit: usize,
) -> StoreResult<Vec<ConversationSummary>> {
    let Some(limit) = sql_limit(limit) else {
        return Ok(Vec::new());
    };
    let mut stmt = conn.prepare_cached(
        "SELECT id, session_id, title, created_at, updated_at
         FROM conversations
         ORDER BY updated_at DESC, id DESC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit], |row| {
            Ok((
                row.get::<_, ConversationId>(0)?,
                row.get::<_, SessionId>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;

    let mut summaries = Vec::with_capacity(rows.len());
    for (id, session_id, title, created_at, updated_at) in rows {
        summaries.push(ConversationSummary {
            id,
            session_id,
            title,
            created_at: decode_timestamp(created_at)?,
            updated_at: decode_timestamp(updated_at)?,
        });
    }
    Ok(summaries)
}

/// Delete a conversation and, by cascade, its messages.
///
/// Returns whether a conversation was removed.
pub(crate) fn delete_conversation(
    conn: &mut Connection,
    session_id: &SessionId,
) -> StoreResult<bool> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let deleted = tx.execute(
        "DELETE FROM conversations WHERE session_id = ?1",
        params![session_id],
    )?;
    tx.commit()?;
    Ok(deleted > 0)
}

/// Literal, case-sensitive substring search over message bodies, newest first.
///
/// `instr` is used instead of `LIKE`: `LIKE` folds ASCII case and treats `%`
/// and `_` in the query as wildcards. An empty query matches every message.
pub(crate) fn search_messages(
    conn: &Connection,
    query: &str,
    limit: usize,
) -> StoreResult<Vec<SearchHit>> {
    let Some(limit) = sql_limit(limit) else {
        return Ok(Vec::new());
    };
    let mut stmt = conn.prepare_cached(
        "SELECT m.id, c.session_id, c.title, m.role, m.content, m.timestamp
         FROM messages m
         JOIN conversations c ON m.conversation_id = c.id
         WHERE instr(m.content, ?1) > 0
         ORDER BY m.timestamp DESC, m.id DESC
         LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![query, limit], |row| {
            Ok((
                row.get::<_, MessageId>(0)?,
                row.get::<_, SessionId>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Role>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;

    let mut hits = Vec::with_capacity(rows.len());
    for (message_id, session_id, conversation_title, role, content, timestamp) in rows {
        hits.push(SearchHit {
            message_id,
            session_id,
            conversation_title,
            role,
            content,
            timestamp: decode_timestamp(timestamp)?,
        });
    }
    Ok(hits)
}

/// Conversation fields plus ordered turns, read from one snapshot.
pub(crate) fn export_conversation(
    conn: &Connection,
    session_id: &SessionId,
) -> StoreResult<Option<ConversationExport>> {
    let tx = conn.unchecked_transaction()?;
    let Some(conversation) = find_conversation(&tx, session_id)? else {
        return Ok(None);
    };
    let messages = conversation_turns(&tx, session_id)?;
    tx.commit()?;

    Ok(Some(ConversationExport {
        session_id: conversation.session_id,
        title: conversation.title,
        created_at: conversation.created_at,
        updated_at: conversation.updated_at,
        metadata: conversation.metadata,
        messages,
    }))
}

/// Row counts for the whole store.
pub(crate) fn stats(conn: &Connection) -> StoreResult<StoreStats> {
    let tx = conn.unchecked_transaction()?;
    let conversations: i64 =
        tx.query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))?;
    let messages: i64 = tx.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
    let by_role = {
        let mut stmt = tx.prepare(
            "SELECT role, COUNT(*) AS count
             FROM messages
             GROUP BY role
             ORDER BY count DESC, role ASC",
        )?;
        stmt.query_map([], |row| Ok((row.get::<_, Role>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?
    };
    tx.commit()?;

    let count = |value: i64| {
        u64::try_from(value)
            .map_err(|_| StoreError::InvalidRecord(format!("invalid row count: {value}")))
    };
    let messages_by_role = by_role
        .into_iter()
        .map(|(role, n)| -> StoreResult<(Role, u64)> { Ok((role, count(n)?)) })
        .collect::<StoreResult<Vec<_>>>()?;

    Ok(StoreStats {
        conversations: count(conversations)?,
        messages: count(messages)?,
        messages_by_role,
    })
}
