//! SQLite-backed conversation store.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::conversation::store::{
    ConversationStore, MAX_TURNS, SessionSummary, StoreError, StoreFuture, StoreResult,
};
use crate::conversation::title::{DEFAULT_TITLE, TitleOrigin, clamp_title, title_from_query};
use crate::conversation::turn::{Role, Turn};

/// `SQLite` implementation of the conversation store.
///
/// Sessions are listed in insertion (rowid) order; turns are trimmed to the
/// most recent [`MAX_TURNS`] inside the append transaction.
pub struct SqliteConversationStore {
    conn: Connection,
}

impl SqliteConversationStore {
    /// Open (or create) a database file.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref()).await?;
        Self::with_connection(conn).await
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns an error if the database cannot be created.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    title_origin TEXT NOT NULL,
                    last_active INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS turns (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_id TEXT NOT NULL,
                    role TEXT NOT NULL,
                    content TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_turns_session
                    ON turns (session_id, id);",
            )?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl ConversationStore for SqliteConversationStore {
    fn create(&self, id: &str) -> StoreFuture<'_, StoreResult<SessionSummary>> {
        let id = id.to_string();
        Box::pin(async move {
            let session = id.clone();
            self.conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    tx.execute("DELETE FROM turns WHERE session_id = ?1", [&session])?;
                    tx.execute("DELETE FROM sessions WHERE id = ?1", [&session])?;
                    tx.execute(
                        "INSERT INTO sessions (id, title, title_origin, last_active)
                         VALUES (?1, ?2, ?3, ?4)",
                        rusqlite::params![
                            session,
                            DEFAULT_TITLE,
                            TitleOrigin::Default.as_str(),
                            now_millis()
                        ],
                    )?;
                    tx.commit()?;
                    Ok(())
                })
                .await?;

            Ok(SessionSummary {
                id,
                title: DEFAULT_TITLE.to_string(),
            })
        })
    }

    fn list(&self) -> StoreFuture<'_, StoreResult<Vec<SessionSummary>>> {
        Box::pin(async move {
            let sessions = self
                .conn
                .call(|conn| {
                    let mut stmt = conn.prepare("SELECT id, title FROM sessions ORDER BY rowid")?;
                    let rows = stmt
                        .query_map([], |row| {
                            Ok(SessionSummary {
                                id: row.get(0)?,
                                title: row.get(1)?,
                            })
                        })?
                        .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                    Ok(rows)
                })
                .await?;
            Ok(sessions)
        })
    }

    fn append(&self, id: &str, turns: Vec<Turn>) -> StoreFuture<'_, StoreResult<()>> {
        let session = id.to_string();
        Box::pin(async move {
            let keep = i64::try_from(MAX_TURNS)
                .map_err(|_| StoreError::Corrupt("turn limit exceeds i64".to_string()))?;
            self.conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    tx.execute(
                        "INSERT OR IGNORE INTO sessions (id, title, title_origin, last_active)
                         VALUES (?1, ?2, ?3, ?4)",
                        rusqlite::params![
                            session,
                            DEFAULT_TITLE,
                            TitleOrigin::Default.as_str(),
                            now_millis()
                        ],
                    )?;
                    {
                        let mut stmt = tx.prepare(
                            "INSERT INTO turns (session_id, role, content) VALUES (?1, ?2, ?3)",
                        )?;
                        for turn in turns {
                            stmt.execute(rusqlite::params![
                                session,
                                turn.role.as_str(),
                                turn.content
                            ])?;
                        }
                    }
                    tx.execute(
                        "DELETE FROM turns
                         WHERE session_id = ?1
                           AND id NOT IN (
                               SELECT id FROM turns WHERE session_id = ?1
                               ORDER BY id DESC LIMIT ?2
                           )",
                        rusqlite::params![session, keep],
                    )?;
                    tx.execute(
                        "UPDATE sessions SET last_active = ?2 WHERE id = ?1",
                        rusqlite::params![session, now_millis()],
                    )?;
                    tx.commit()?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn get(&self, id: &str) -> StoreFuture<'_, StoreResult<Vec<Turn>>> {
        let session = id.to_string();
        Box::pin(async move {
            let rows = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(
                        "SELECT role, content FROM turns WHERE session_id = ?1 ORDER BY id",
                    )?;
                    let rows = stmt
                        .query_map([&session], |row| {
                            let role: String = row.get(0)?;
                            let content: String = row.get(1)?;
                            Ok((role, content))
                        })?
                        .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                    Ok(rows)
                })
                .await?;

            rows.into_iter()
                .map(|(role, content)| {
                    let role = Role::from_str(&role)
                        .map_err(|err| StoreError::Corrupt(format!("invalid role: {err}")))?;
                    Ok(Turn::new(role, content))
                })
                .collect()
        })
    }

    fn clear(&self, id: &str) -> StoreFuture<'_, StoreResult<bool>> {
        let session = id.to_string();
        Box::pin(async move {
            let found = self
                .conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    let touched = tx.execute(
                        "UPDATE sessions SET last_active = ?2 WHERE id = ?1",
                        rusqlite::params![session, now_millis()],
                    )?;
                    if touched > 0 {
                        tx.execute("DELETE FROM turns WHERE session_id = ?1", [&session])?;
                    }
                    tx.commit()?;
                    Ok(touched > 0)
                })
                .await?;
            Ok(found)
        })
    }

    fn delete(&self, id: &str) -> StoreFuture<'_, StoreResult<()>> {
        let session = id.to_string();
        Box::pin(async move {
            self.conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    tx.execute("DELETE FROM turns WHERE session_id = ?1", [&session])?;
                    tx.execute("DELETE FROM sessions WHERE id = ?1", [&session])?;
                    tx.commit()?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn rename(&self, id: &str, title: &str) -> StoreFuture<'_, StoreResult<bool>> {
        let session = id.to_string();
        let title = clamp_title(title);
        Box::pin(async move {
            let changed = self
                .conn
                .call(move |conn| {
                    let changed = conn.execute(
                        "UPDATE sessions SET title = ?2, title_origin = ?3, last_active = ?4
                         WHERE id = ?1",
                        rusqlite::params![
                            session,
                            title,
                            TitleOrigin::Renamed.as_str(),
                            now_millis()
                        ],
                    )?;
                    Ok(changed)
                })
                .await?;
            Ok(changed > 0)
        })
    }

    fn assign_title_from_query(
        &self,
        id: &str,
        query: &str,
    ) -> StoreFuture<'_, StoreResult<bool>> {
        let session = id.to_string();
        let title = title_from_query(query);
        Box::pin(async move {
            let origin = {
                let session = session.clone();
                self.conn
                    .call(move |conn| {
                        let origin = conn
                            .query_row(
                                "SELECT title_origin FROM sessions WHERE id = ?1",
                                [&session],
                                |row| row.get::<_, String>(0),
                            )
                            .optional()?;
                        Ok(origin)
                    })
                    .await?
            };

            let Some(origin) = origin else {
                return Ok(false);
            };
            let origin = TitleOrigin::from_str(&origin)
                .map_err(|err| StoreError::Corrupt(format!("invalid title origin: {err}")))?;
            if !origin.accepts_query_title() {
                return Ok(false);
            }

            let changed = self
                .conn
                .call(move |conn| {
                    let changed = conn.execute(
                        "UPDATE sessions SET title = ?2, title_origin = ?3
                         WHERE id = ?1 AND title_origin = ?4",
                        rusqlite::params![
                            session,
                            title,
                            TitleOrigin::FirstQuery.as_str(),
                            TitleOrigin::Default.as_str()
                        ],
                    )?;
                    Ok(changed)
                })
                .await?;
            Ok(changed > 0)
        })
    }

    fn evict_idle(&self, max_idle: Duration) -> StoreFuture<'_, StoreResult<usize>> {
        Box::pin(async move {
            let idle_ms = i64::try_from(max_idle.as_millis()).unwrap_or(i64::MAX);
            let cutoff = now_millis().saturating_sub(idle_ms);
            let removed = self
                .conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    tx.execute(
                        "DELETE FROM turns WHERE session_id IN
                             (SELECT id FROM sessions WHERE last_active < ?1)",
                        [cutoff],
                    )?;
                    let removed =
                        tx.execute("DELETE FROM sessions WHERE last_active < ?1", [cutoff])?;
                    tx.commit()?;
                    Ok(removed)
                })
                .await?;
            Ok(removed)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    async fn store() -> SqliteConversationStore {
        SqliteConversationStore::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_append_trims_to_most_recent_turns() {
        let store = store().await;
        let turns: Vec<Turn> = (0..30).map(|i| Turn::user(i.to_string())).collect();
        store.append("s1", turns).await.unwrap();

        let stored = store.get("s1").await.unwrap();
        assert_eq!(stored.len(), MAX_TURNS);
        assert_eq!(stored[0].content, "10");
        assert_eq!(stored[MAX_TURNS - 1].content, "29");
    }

    #[tokio::test]
    async fn test_unknown_session_behaviour() {
        let store = store().await;
        assert!(store.get("nope").await.unwrap().is_empty());
        assert!(!store.clear("nope").await.unwrap());
        assert!(!store.rename("nope", "t").await.unwrap());
        assert!(!store.assign_title_from_query("nope", "q").await.unwrap());
        store.delete("nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_title_lifecycle() {
        let store = store().await;
        store.create("s1").await.unwrap();
        assert!(store.assign_title_from_query("s1", "hello there").await.unwrap());
        assert!(!store.assign_title_from_query("s1", "later").await.unwrap());
        assert!(store.rename("s1", "Renamed").await.unwrap());

        let sessions = store.list().await.unwrap();
        assert_eq!(
            sessions,
            vec![SessionSummary {
                id: "s1".to_string(),
                title: "Renamed".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_delete_removes_turns_and_title() {
        let store = store().await;
        store
            .append("s1", vec![Turn::user("q"), Turn::assistant("a")])
            .await
            .unwrap();
        store.delete("s1").await.unwrap();
        store.delete("s1").await.unwrap();

        assert!(store.list().await.unwrap().is_empty());
        assert!(store.get("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_evict_idle_keeps_recent_sessions() {
        let store = store().await;
        store.create("s1").await.unwrap();
        let removed = store.evict_idle(Duration::from_secs(3600)).await.unwrap();
        assert_eq!(removed, 0);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_keep_pairs_together() {
        let store = Arc::new(store().await);
        let tasks: Vec<_> = (0..12)
            .map(|n| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .append(
                            "s1",
                            vec![Turn::user(format!("q{n}")), Turn::assistant(format!("a{n}"))],
                        )
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let turns = store.get("s1").await.unwrap();
        assert_eq!(turns.len(), MAX_TURNS.min(2 * 12));
        for pair in turns.chunks(2) {
            let n = pair[0].content.strip_prefix('q').unwrap();
            assert_eq!(pair[0], Turn::user(format!("q{n}")));
            assert_eq!(pair[1], Turn::assistant(format!("a{n}")));
        }
    }
}
