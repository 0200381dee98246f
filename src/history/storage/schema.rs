//! Database schema and per-connection setup.

use rusqlite::Connection;

use crate::history::core::config::StoreConfig;

/// Tables and indexes. Every statement is idempotent.
pub(crate) const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS conversations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL UNIQUE,
        title TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        metadata TEXT,
        CHECK (updated_at >= created_at)
    );

    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        conversation_id INTEGER NOT NULL
            REFERENCES conversations (id) ON DELETE CASCADE,
        role TEXT NOT NULL CHECK (role IN ('human', 'ai', 'system')),
        content TEXT NOT NULL CHECK (length(content) > 0),
        timestamp INTEGER NOT NULL,
        metadata TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_messages_conversation
        ON messages (conversation_id);
    CREATE INDEX IF NOT EXISTS idx_conversations_session
        ON conversations (session_id);
";

/// Apply connection pragmas and create the schema.
///
/// `foreign_keys` is a per-connection setting in `SQLite`, so this must run on
/// every connection, not once per database file.
///
/// # Errors
/// Returns an error if a pragma or DDL statement fails.
pub(crate) fn prepare_connection(conn: &Connection, config: &StoreConfig) -> rusqlite::Result<()> {
    conn.busy_timeout(config.busy_timeout())?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    if config.wal && !config.is_in_memory() {
        // journal_mode answers with the resulting mode; the value is not needed.
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
    }
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_names(conn: &Connection, kind: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = ?1 AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )
            .unwrap();
        stmt.query_map([kind], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap()
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let config = StoreConfig::in_memory();
        for _ in 0..3 {
            prepare_connection(&conn, &config).unwrap();
        }

        assert_eq!(
            object_names(&conn, "table"),
            vec!["conversations".to_string(), "messages".to_string()]
        );
        assert_eq!(
            object_names(&conn, "index"),
            vec![
                "idx_conversations_session".to_string(),
                "idx_messages_conversation".to_string()
            ]
        );
    }

    #[test]
    fn foreign_keys_are_enabled() {
        let conn = Connection::open_in_memory().unwrap();
        prepare_connection(&conn, &StoreConfig::in_memory()).unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn role_check_rejects_unknown_roles() {
        let conn = Connection::open_in_memory().unwrap();
        prepare_connection(&conn, &StoreConfig::in_memory()).unwrap();
        conn.execute(
            "INSERT INTO conversations (session_id, created_at, updated_at) VALUES ('s', 1, 1)",
            [],
        )
        .unwrap();
        let result = conn.execute(
            "INSERT INTO messages (conversation_id, role, content, timestamp)
             VALUES (1, 'robot', 'beep', 1)",
            [],
        );
        assert!(result.is_err());
    }
}
