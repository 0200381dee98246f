//! Caller-side helpers for chat loops built on the store.
//!
//! The store itself never creates a conversation implicitly; these helpers
//! are what a chat front end uses to "continue or start" a session and to
//! record one question/answer exchange.

use tracing::info;

use crate::history::core::errors::StoreResult;
use crate::history::core::ids::{ConversationId, MessageId, SessionId};
use crate::history::core::records::ChatTurn;
use crate::history::core::role::Role;
use crate::history::storage::ConversationStore;

/// A conversation resolved for continuation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResumedConversation {
    /// Conversation to append to.
    pub id: ConversationId,
    /// Prior turns, oldest first. Empty for a fresh conversation.
    pub history: Vec<ChatTurn>,
    /// Whether the conversation was created by this call.
    pub started: bool,
}

/// Resolve `session_id` to a conversation, creating it with `title` if unknown.
///
/// # Errors
/// Returns an error if storage access fails.
pub fn continue_or_start<S>(
    store: &mut S,
    session_id: &SessionId,
    title: Option<&str>,
) -> StoreResult<ResumedConversation>
where
    S: ConversationStore + ?Sized,
{
    if let Some(existing) = store.find_conversation(session_id)? {
        let history = store.get_conversation_messages(session_id)?;
        return Ok(ResumedConversation {
            id: existing.id,
            history,
            started: false,
        });
    }

    let id = store.create_conversation(session_id, title, None)?;
    info!(%session_id, %id, "Started new conversation");
    Ok(ResumedConversation {
        id,
        history: Vec::new(),
        started: true,
    })
}

/// Record one human question and the model's answer, in that order.
///
/// # Errors
/// Returns an error if either insert fails. The human turn stays recorded if
/// only the answer fails.
pub fn record_exchange<S>(
    store: &mut S,
    conversation_id: ConversationId,
    question: &str,
    answer: &str,
) -> StoreResult<(MessageId, MessageId)>
where
    S: ConversationStore + ?Sized,
{
    let asked = store.add_message(conversation_id, Role::Human, question, None)?;
    let answered = store.add_message(conversation_id, Role::Ai, answer, None)?;
    Ok((asked, answered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::storage::SqliteConversationStore;

    #[test]
    fn test_continue_or_start_creates_then_resumes() {
        let mut store = SqliteConversationStore::open_in_memory().unwrap();
        let session = SessionId::new("support-42").unwrap();

        let fresh = continue_or_start(&mut store, &session, Some("New Support Conversation")).unwrap();
        assert!(fresh.started);
        assert!(fresh.history.is_empty());

        record_exchange(&mut store, fresh.id, "Where is my order?", "It ships tomorrow.").unwrap();

        let resumed = continue_or_start(&mut store, &session, Some("ignored")).unwrap();
        assert!(!resumed.started);
        assert_eq!(resumed.id, fresh.id);
        assert_eq!(
            resumed.history,
            vec![
                ChatTurn::new(Role::Human, "Where is my order?"),
                ChatTurn::new(Role::Ai, "It ships tomorrow."),
            ]
        );

        let conversation = store.find_conversation(&session).unwrap().unwrap();
        assert_eq!(conversation.title.as_deref(), Some("New Support Conversation"));
    }
}
