use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

use chat_history::history::{
    ConversationId, ConversationStore, Role, SessionId, SqliteConversationStore,
};

fn sid(raw: &str) -> SessionId {
    SessionId::new(raw).unwrap()
}

fn init_db(path: &Path) {
    let mut store = SqliteConversationStore::open_path(path).unwrap();
    store.close().unwrap();
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.db");

    {
        let mut store = SqliteConversationStore::open_path(&path).unwrap();
        let id = store
            .create_conversation(&sid("persist"), Some("Persisted"), None)
            .unwrap();
        store.add_message(id, Role::Human, "still here?", None).unwrap();
        // Dropped without an explicit close.
    }

    let store = SqliteConversationStore::open_path(&path).unwrap();
    assert_eq!(store.path(), path.as_path());
    let export = store.export_conversation(&sid("persist")).unwrap().unwrap();
    assert_eq!(export.title.as_deref(), Some("Persisted"));
    assert_eq!(export.messages.len(), 1);
    assert_eq!(export.messages[0].content, "still here?");
}

#[test]
fn test_concurrent_creates_share_one_conversation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.db");
    init_db(&path);

    let workers = 8;
    let barrier = Arc::new(Barrier::new(workers));
    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || -> ConversationId {
                let mut store = SqliteConversationStore::open_path(&path).unwrap();
                barrier.wait();
                store.create_conversation(&sid("shared"), None, None).unwrap()
            })
        })
        .collect();
    let ids: Vec<ConversationId> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(ids.iter().all(|id| *id == ids[0]));
    let store = SqliteConversationStore::open_path(&path).unwrap();
    assert_eq!(store.stats().unwrap().conversations, 1);
}

#[test]
fn test_concurrent_appends_are_all_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.db");
    let id = {
        let mut store = SqliteConversationStore::open_path(&path).unwrap();
        store.create_conversation(&sid("busy"), None, None).unwrap()
    };

    let workers = 4;
    let per_worker = 25;
    let barrier = Arc::new(Barrier::new(workers));
    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut store = SqliteConversationStore::open_path(&path).unwrap();
                barrier.wait();
                for i in 0..per_worker {
                    store
                        .add_message(id, Role::Human, &format!("worker {worker} message {i}"), None)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let store = SqliteConversationStore::open_path(&path).unwrap();
    let messages = store.get_messages(&sid("busy")).unwrap();
    assert_eq!(messages.len(), workers * per_worker);
    assert!(messages.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));

    // Each writer's own messages keep their relative order.
    for worker in 0..workers {
        let prefix = format!("worker {worker} message ");
        let sequence: Vec<usize> = messages
            .iter()
            .filter_map(|m| m.content.strip_prefix(&prefix))
            .map(|n| n.parse().unwrap())
            .collect();
        assert_eq!(sequence, (0..per_worker).collect::<Vec<_>>());
    }

    let conversation = store.find_conversation(&sid("busy")).unwrap().unwrap();
    assert_eq!(conversation.updated_at, messages.last().unwrap().timestamp);
}

#[test]
fn test_reader_sees_writes_from_other_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.db");
    let mut writer = SqliteConversationStore::open_path(&path).unwrap();
    let reader = SqliteConversationStore::open_path(&path).unwrap();

    let id = writer.create_conversation(&sid("live"), None, None).unwrap();
    writer.add_message(id, Role::Ai, "fresh", None).unwrap();

    let hits = reader.search_messages("fresh", 5).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].session_id, sid("live"));
}
