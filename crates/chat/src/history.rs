//! SQLite-backed chat session and message history.

use chrono::{DateTime, Utc};
use lorebase_core::{AppError, AppResult};
use lorebase_llm::Role;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

/// A chat session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Public session identifier
    pub session_id: String,

    /// When the session was created
    pub created_at: DateTime<Utc>,
}

/// A stored conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Role of the sender
    pub role: Role,

    /// Message text
    pub content: String,

    /// When the message was stored
    pub created_at: DateTime<Utc>,
}

/// Persistent store for chat sessions and their messages.
///
/// Holds the connection behind a mutex so the store can be shared across
/// tasks; every operation takes the lock for its whole statement.
pub struct HistoryStore {
    conn: Mutex<Connection>,
}

impl HistoryStore {
    /// Open (or create) the history database at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Chat(format!("Failed to create history directory: {}", e))
                })?;
            }
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Chat(format!("Failed to open history database: {}", e)))?;

        Self::init(conn)
    }

    /// Open an in-memory history store (used by tests and ephemeral runs).
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Chat(format!("Failed to open in-memory database: {}", e)))?;

        Self::init(conn)
    }

    fn init(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chat_sessions (
                id INTEGER PRIMARY KEY,
                session_id TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (session_id) REFERENCES chat_sessions(session_id)
            );

            CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id);
            "#,
        )
        .map_err(|e| AppError::Chat(format!("Failed to create history tables: {}", e)))?;

        tracing::debug!("Initialized chat history store");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Fetch a session, creating it if it does not exist yet.
    pub fn get_or_create_session(&self, session_id: &str) -> AppResult<SessionRecord> {
        let conn = self.conn.lock().unwrap();

        let existing = conn
            .query_row(
                "SELECT session_id, created_at FROM chat_sessions WHERE session_id = ?1",
                params![session_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                    ))
                },
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                e => Err(AppError::Chat(format!("Failed to query session: {}", e))),
            })?;

        if let Some((session_id, created_at)) = existing {
            return Ok(SessionRecord {
                session_id,
                created_at: parse_timestamp(&created_at)?,
            });
        }

        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO chat_sessions (session_id, created_at) VALUES (?1, ?2)",
            params![session_id, created_at.to_rfc3339()],
        )
        .map_err(|e| AppError::Chat(format!("Failed to create session: {}", e)))?;

        tracing::debug!("Created chat session '{}'", session_id);

        Ok(SessionRecord {
            session_id: session_id.to_string(),
            created_at,
        })
    }

    /// Append one message to a session.
    pub fn append(&self, session_id: &str, role: Role, content: &str) -> AppResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO messages (session_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, role.as_str(), content, Utc::now().to_rfc3339()],
        )
        .map_err(|e| AppError::Chat(format!("Failed to store message: {}", e)))?;

        Ok(())
    }

    /// Fetch the full message history of a session, oldest first.
    pub fn history(&self, session_id: &str) -> AppResult<Vec<StoredMessage>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT role, content, created_at FROM messages
                 WHERE session_id = ?1 ORDER BY id ASC",
            )
            .map_err(|e| AppError::Chat(format!("Failed to prepare history query: {}", e)))?;

        let rows = stmt
            .query_map(params![session_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| AppError::Chat(format!("Failed to query history: {}", e)))?;

        let mut messages = Vec::new();
        for row in rows {
            let (role, content, created_at) =
                row.map_err(|e| AppError::Chat(format!("Failed to read message row: {}", e)))?;

            let role = Role::parse(&role)
                .ok_or_else(|| AppError::Chat(format!("Unknown stored role: {}", role)))?;

            messages.push(StoredMessage {
                role,
                content,
                created_at: parse_timestamp(&created_at)?,
            });
        }

        Ok(messages)
    }

    /// List every session, newest first.
    pub fn sessions(&self) -> AppResult<Vec<SessionRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT session_id, created_at FROM chat_sessions ORDER BY id DESC")
            .map_err(|e| AppError::Chat(format!("Failed to prepare sessions query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| AppError::Chat(format!("Failed to query sessions: {}", e)))?;

        let mut sessions = Vec::new();
        for row in rows {
            let (session_id, created_at) =
                row.map_err(|e| AppError::Chat(format!("Failed to read session row: {}", e)))?;
            sessions.push(SessionRecord {
                session_id,
                created_at: parse_timestamp(&created_at)?,
            });
        }

        Ok(sessions)
    }

    /// Delete a session and its messages. Returns whether it existed.
    pub fn delete_session(&self, session_id: &str) -> AppResult<bool> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "DELETE FROM messages WHERE session_id = ?1",
            params![session_id],
        )
        .map_err(|e| AppError::Chat(format!("Failed to delete messages: {}", e)))?;

        let deleted = conn
            .execute(
                "DELETE FROM chat_sessions WHERE session_id = ?1",
                params![session_id],
            )
            .map_err(|e| AppError::Chat(format!("Failed to delete session: {}", e)))?;

        Ok(deleted > 0)
    }
}

fn parse_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Chat(format!("Invalid stored timestamp '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_session() {
        let store = HistoryStore::open_in_memory().unwrap();

        let created = store.get_or_create_session("s1").unwrap();
        assert_eq!(created.session_id, "s1");

        // Second call returns the existing record
        let fetched = store.get_or_create_session("s1").unwrap();
        assert_eq!(fetched.created_at, created.created_at);
        assert_eq!(store.sessions().unwrap().len(), 1);
    }

    #[test]
    fn test_history_round_trip_in_order() {
        let store = HistoryStore::open_in_memory().unwrap();
        store.get_or_create_session("s1").unwrap();

        store.append("s1", Role::User, "hello").unwrap();
        store.append("s1", Role::Assistant, "hi there").unwrap();
        store.append("s1", Role::User, "how are you?").unwrap();

        let history = store.history("s1").unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "hello");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[2].content, "how are you?");
    }

    #[test]
    fn test_history_isolated_per_session() {
        let store = HistoryStore::open_in_memory().unwrap();
        store.get_or_create_session("a").unwrap();
        store.get_or_create_session("b").unwrap();

        store.append("a", Role::User, "for a").unwrap();
        store.append("b", Role::User, "for b").unwrap();

        assert_eq!(store.history("a").unwrap().len(), 1);
        assert_eq!(store.history("b").unwrap()[0].content, "for b");
    }

    #[test]
    fn test_delete_session() {
        let store = HistoryStore::open_in_memory().unwrap();
        store.get_or_create_session("gone").unwrap();
        store.append("gone", Role::User, "bye").unwrap();

        assert!(store.delete_session("gone").unwrap());
        assert!(store.history("gone").unwrap().is_empty());
        assert!(store.sessions().unwrap().is_empty());

        // Deleting again reports absence
        assert!(!store.delete_session("gone").unwrap());
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state").join("history.sqlite");

        let store = HistoryStore::open(&path).unwrap();
        store.get_or_create_session("s").unwrap();

        assert!(path.exists());
    }
}
