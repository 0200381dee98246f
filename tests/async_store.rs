use std::sync::Arc;

use chat_history::history::{
    AsyncConversationStore, AsyncSqliteConversationStore, ChatTurn, ConversationStore, Role,
    SessionId, SqliteConversationStore, StoreConfig, StoreError,
};
use serde_json::json;

fn sid(raw: &str) -> SessionId {
    SessionId::new(raw).unwrap()
}

#[tokio::test]
async fn test_async_store_matches_blocking_semantics() {
    let store = AsyncSqliteConversationStore::open_in_memory().await.unwrap();

    let first = store.create_conversation(&sid("dup"), Some("Dup"), None).await.unwrap();
    let second = store.create_conversation(&sid("dup"), None, None).await.unwrap();
    assert_eq!(first, second);

    store
        .add_message(first, Role::Human, "I want a refund", Some(&json!({"channel": "web"})))
        .await
        .unwrap();
    store.add_message(first, Role::Ai, "Sure.", None).await.unwrap();

    let hits = store.search_messages("refund", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].conversation_title.as_deref(), Some("Dup"));

    let messages = store.get_messages(&sid("dup")).await.unwrap();
    assert_eq!(messages[0].metadata, Some(json!({"channel": "web"})));
    assert_eq!(messages[1].metadata, None);

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.conversations, 1);
    assert_eq!(stats.messages, 2);

    assert!(matches!(
        store.add_message(first, Role::Ai, "", None).await,
        Err(StoreError::InvalidArgument(_))
    ));

    store.delete_conversation(&sid("dup")).await.unwrap();
    assert!(store.export_conversation(&sid("dup")).await.unwrap().is_none());
    assert!(matches!(
        store.add_message(first, Role::Human, "late", None).await,
        Err(StoreError::ReferentialIntegrity(_))
    ));
    store.close().await.unwrap();
}

#[tokio::test]
async fn test_async_and_blocking_handles_share_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.db");
    let config = StoreConfig::at(&path);

    let store = AsyncSqliteConversationStore::open(&config).await.unwrap();
    assert_eq!(store.config().sqlite_path, path);
    let id = store.create_conversation(&sid("s1"), None, None).await.unwrap();
    store.add_message(id, Role::Human, "hi", None).await.unwrap();
    store.add_message(id, Role::Ai, "hello", None).await.unwrap();
    store.close().await.unwrap();

    let blocking = SqliteConversationStore::open(&config).unwrap();
    assert_eq!(
        blocking.get_conversation_messages(&sid("s1")).unwrap(),
        vec![ChatTurn::new(Role::Human, "hi"), ChatTurn::new(Role::Ai, "hello")]
    );
}

#[tokio::test]
async fn test_shared_handle_across_tasks() {
    let store = Arc::new(AsyncSqliteConversationStore::open_in_memory().await.unwrap());
    let id = store.create_conversation(&sid("tasks"), None, None).await.unwrap();

    let tasks: Vec<_> = (0..10)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .add_message(id, Role::Human, &format!("task {i}"), None)
                    .await
                    .unwrap();
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let recent = store.get_recent_conversations(5).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(store.get_conversation_messages(&sid("tasks")).await.unwrap().len(), 10);
}
