//! Command-line front end for inspecting and editing a history database.
//!
//! Everything here goes through the public store API; the binary holds no
//! logic of its own.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::history::{
    ConversationStore, Role, SessionId, SqliteConversationStore, StoreConfig, continue_or_start,
    init_tracing, seed_store,
};

/// Browse, search, and export stored conversations.
#[derive(Debug, Parser)]
#[command(name = "chat-history", version, about)]
pub struct Cli {
    /// Database path (defaults to `CHAT_HISTORY_DB`, then `chat_history.db`).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the sample customer-support conversations.
    Seed,
    /// Start a conversation under a freshly generated session id.
    New {
        /// Display title.
        #[arg(long)]
        title: Option<String>,
    },
    /// List the most recently active conversations.
    Recent {
        /// Maximum number of conversations.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the messages of one conversation.
    Show {
        /// Session identifier.
        session: String,
    },
    /// Find messages containing a literal string.
    Search {
        /// Text to look for (case-sensitive).
        query: String,
        /// Maximum number of hits.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print a conversation as JSON.
    Export {
        /// Session identifier.
        session: String,
    },
    /// Print store-wide counters.
    Stats,
    /// Delete a conversation and its messages.
    Delete {
        /// Session identifier.
        session: String,
    },
    /// Append a message, starting the conversation if needed.
    Add {
        /// Session identifier.
        session: String,
        /// Author role: human, ai, or system.
        role: String,
        /// Message body.
        content: String,
        /// Title used if the conversation is created.
        #[arg(long)]
        title: Option<String>,
    },
}

/// Parse arguments, run the command, and map failures to exit code 1.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Run one parsed command against its configured store.
///
/// # Errors
/// Returns an error if the store cannot be opened or the command fails.
pub fn execute(cli: Cli) -> Result<()> {
    let config = match cli.db {
        Some(path) => StoreConfig::at(path),
        None => StoreConfig::from_env().context("reading store configuration")?,
    };
    let mut store = SqliteConversationStore::open(&config)
        .with_context(|| format!("opening {}", config.sqlite_path.display()))?;

    dispatch(&mut store, cli.command)?;
    store.close().context("closing store")?;
    Ok(())
}

fn session(raw: String) -> Result<SessionId> {
    SessionId::new(raw).context("invalid session id")
}

fn dispatch(store: &mut SqliteConversationStore, command: Command) -> Result<()> {
    match command {
        Command::Seed => {
            let report = seed_store(store)?;
            println!(
                "Seeded {} conversations ({} messages), skipped {} already present",
                report.seeded.len(),
                report.messages,
                report.skipped.len()
            );
        }
        Command::New { title } => {
            let session_id = SessionId::generate();
            store.create_conversation(&session_id, title.as_deref(), None)?;
            println!("{session_id}");
        }
        Command::Recent { limit } => {
            for conversation in store.get_recent_conversations(limit)? {
                println!(
                    "{}\t{}\t{}",
                    conversation.session_id,
                    conversation.updated_at.to_rfc3339(),
                    conversation.title.as_deref().unwrap_or("(untitled)")
                );
            }
        }
        Command::Show { session: raw } => {
            let session_id = session(raw)?;
            let turns = store.get_conversation_messages(&session_id)?;
            if turns.is_empty() {
                println!("No messages for {session_id}");
            }
            for (index, turn) in turns.iter().enumerate() {
                println!(
                    "[{}] {}: {}",
                    index + 1,
                    turn.role.as_str().to_uppercase(),
                    turn.content
                );
            }
        }
        Command::Search { query, limit } => {
            for hit in store.search_messages(&query, limit)? {
                println!(
                    "{} ({}) {}: {}",
                    hit.session_id,
                    hit.conversation_title.as_deref().unwrap_or("untitled"),
                    hit.role,
                    hit.content
                );
            }
        }
        Command::Export { session: raw } => {
            let session_id = session(raw)?;
            let export = store
                .export_conversation(&session_id)?
                .with_context(|| format!("no conversation with session id {session_id}"))?;
            println!("{}", serde_json::to_string_pretty(&export)?);
        }
        Command::Stats => {
            let stats = store.stats()?;
            println!("Total conversations: {}", stats.conversations);
            println!("Total messages: {}", stats.messages);
            for (role, count) in stats.messages_by_role {
                println!("  {role}: {count}");
            }
        }
        Command::Delete { session: raw } => {
            let session_id = session(raw)?;
            store.delete_conversation(&session_id)?;
            println!("Deleted {session_id}");
        }
        Command::Add {
            session: raw,
            role,
            content,
            title,
        } => {
            let session_id = session(raw)?;
            let role: Role = role.parse()?;
            let resumed = continue_or_start(store, &session_id, title.as_deref())?;
            let id = store.add_message(resumed.id, role, &content, None)?;
            println!("Added message {id} to {session_id}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_search_with_limit() {
        let cli = Cli::try_parse_from(["chat-history", "--db", "x.db", "search", "refund", "--limit", "3"])
            .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        let Command::Search { query, limit } = cli.command else {
            unreachable!("expected the search subcommand");
        };
        assert_eq!(query, "refund");
        assert_eq!(limit, 3);
    }

    #[test]
    fn test_add_rejects_unknown_role() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cli.db");
        let cli = Cli::try_parse_from([
            "chat-history",
            "--db",
            db.to_str().unwrap(),
            "add",
            "s1",
            "robot",
            "beep",
        ])
        .unwrap();
        assert!(execute(cli).is_err());

        let store = SqliteConversationStore::open_path(&db).unwrap();
        assert!(store.find_conversation(&SessionId::new("s1").unwrap()).unwrap().is_none());
    }

    #[test]
    fn test_add_then_export() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cli.db");
        let db_arg = db.to_str().unwrap();
        let cli = Cli::try_parse_from([
            "chat-history", "--db", db_arg, "add", "s1", "human", "hi", "--title", "Hello",
        ])
        .unwrap();
        execute(cli).unwrap();

        let store = SqliteConversationStore::open_path(&db).unwrap();
        let export = store
            .export_conversation(&SessionId::new("s1").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(export.title.as_deref(), Some("Hello"));
        assert_eq!(export.messages.len(), 1);
    }

    #[test]
    fn test_new_starts_conversation_with_generated_session() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cli.db");
        let db_arg = db.to_str().unwrap();
        for _ in 0..2 {
            let cli = Cli::try_parse_from(["chat-history", "--db", db_arg, "new", "--title", "Fresh"])
                .unwrap();
            execute(cli).unwrap();
        }

        let store = SqliteConversationStore::open_path(&db).unwrap();
        let recent = store.get_recent_conversations(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_ne!(recent[0].session_id, recent[1].session_id);
        assert!(recent.iter().all(|c| c.title.as_deref() == Some("Fresh")));
    }
}
