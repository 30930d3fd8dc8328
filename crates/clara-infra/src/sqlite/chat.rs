//! SQLite chat repository implementation.
//!
//! Message `seq` is assigned inside the INSERT itself
//! (`MAX(seq) + 1` for the session). Writes go through the single-connection
//! writer pool, so the sequence is gap-free and unique per session.

use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use clara_core::chat::repository::ChatRepository;
use clara_types::chat::{Channel, ChatMessage, ChatRole, ChatSession, SessionStatus};
use clara_types::error::RepositoryError;

use super::store::{format_datetime, parse_datetime, query_err, SqliteStore};

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatSessionRow {
    id: String,
    user_id: Option<i64>,
    channel: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            channel: row.try_get("channel")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        let channel: Channel = self
            .channel
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let status: SessionStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatSession {
            id: self.id,
            user_id: self.user_id,
            channel,
            status,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct ChatMessageRow {
    id: String,
    session_id: String,
    seq: i64,
    role: String,
    content: String,
    agent_tag: Option<String>,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            seq: row.try_get("seq")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            agent_tag: row.try_get("agent_tag")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let role: ChatRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatMessage {
            id,
            session_id: self.session_id,
            seq: self.seq,
            role,
            content: self.content,
            agent_tag: self.agent_tag,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn map_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<ChatMessage>, RepositoryError> {
    let mut messages = Vec::with_capacity(rows.len());
    for row in rows {
        let msg_row = ChatMessageRow::from_row(row).map_err(query_err)?;
        messages.push(msg_row.into_message()?);
    }
    Ok(messages)
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteStore {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_sessions (id, user_id, channel, status, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.channel.to_string())
        .bind(session.status.to_string())
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("session already exists: {}", session.id))
            }
            other => query_err(other),
        })?;

        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let session_row = ChatSessionRow::from_row(&row).map_err(query_err)?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn list_sessions(&self, user_id: i64) -> Result<Vec<ChatSession>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_sessions WHERE user_id = ? ORDER BY updated_at DESC, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row = ChatSessionRow::from_row(row).map_err(query_err)?;
            sessions.push(session_row.into_session()?);
        }

        Ok(sessions)
    }

    async fn append_message(
        &self,
        session_id: &str,
        role: ChatRole,
        content: &str,
        agent_tag: Option<&str>,
    ) -> Result<ChatMessage, RepositoryError> {
        let now = format_datetime(&Utc::now());

        let row = sqlx::query(
            r#"INSERT INTO chat_messages (id, session_id, seq, role, content, agent_tag, created_at)
               SELECT ?, ?, COALESCE(MAX(seq), 0) + 1, ?, ?, ?, ?
               FROM chat_messages WHERE session_id = ?
               RETURNING *"#,
        )
        .bind(Uuid::now_v7().to_string())
        .bind(session_id)
        .bind(role.to_string())
        .bind(content)
        .bind(agent_tag)
        .bind(&now)
        .bind(session_id)
        .fetch_one(&self.pool.writer)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            other => query_err(other),
        })?;

        sqlx::query("UPDATE chat_sessions SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(session_id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        ChatMessageRow::from_row(&row)
            .map_err(query_err)?
            .into_message()
    }

    async fn get_history(
        &self,
        session_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM (
                   SELECT * FROM chat_messages WHERE session_id = ? ORDER BY seq DESC LIMIT ?
               ) ORDER BY seq ASC"#,
        )
        .bind(session_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        map_messages(&rows)
    }

    async fn get_conversation(
        &self,
        session_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM (
                   SELECT * FROM chat_messages
                   WHERE session_id = ? AND role IN ('user', 'assistant')
                   ORDER BY seq DESC LIMIT ?
               ) ORDER BY seq ASC"#,
        )
        .bind(session_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        map_messages(&rows)
    }

    async fn recent_cross_session_messages(
        &self,
        user_id: i64,
        limit: u32,
        exclude_session_id: Option<&str>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT m.* FROM chat_messages m
               JOIN chat_sessions s ON s.id = m.session_id
               WHERE s.user_id = ? AND (? IS NULL OR s.id != ?)
                 AND m.role IN ('user', 'assistant')
               ORDER BY m.created_at DESC, m.seq DESC
               LIMIT ?"#,
        )
        .bind(user_id)
        .bind(exclude_session_id)
        .bind(exclude_session_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        map_messages(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::sqlite::store::test_support::test_store;

    fn session(id: &str, user_id: Option<i64>, channel: Channel) -> ChatSession {
        let now = Utc::now();
        ChatSession {
            id: id.to_string(),
            user_id,
            channel,
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let (store, _dir) = test_store().await;
        store
            .create_session(&session("sess_web", Some(7), Channel::Web))
            .await
            .unwrap();

        let fetched = store.get_session("sess_web").await.unwrap().unwrap();
        assert_eq!(fetched.user_id, Some(7));
        assert_eq!(fetched.channel, Channel::Web);
        assert!(store.get_session("sess_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_session_conflicts() {
        let (store, _dir) = test_store().await;
        let s = session("sess_dup", None, Channel::Mobile);
        store.create_session(&s).await.unwrap();
        assert!(matches!(
            store.create_session(&s).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_append_assigns_sequential_seq() {
        let (store, _dir) = test_store().await;
        store
            .create_session(&session("sess_a", Some(1), Channel::Web))
            .await
            .unwrap();
        store
            .create_session(&session("sess_b", Some(1), Channel::Web))
            .await
            .unwrap();

        let first = store.append_message("sess_a", ChatRole::User, "A", None).await.unwrap();
        let second = store
            .append_message("sess_a", ChatRole::Agent, "B", Some("support_agent"))
            .await
            .unwrap();
        let other = store.append_message("sess_b", ChatRole::User, "X", None).await.unwrap();

        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
        assert_eq!(second.agent_tag.as_deref(), Some("support_agent"));
        assert_eq!(other.seq, 1);
    }

    #[tokio::test]
    async fn test_append_to_unknown_session_is_not_found() {
        let (store, _dir) = test_store().await;
        let result = store
            .append_message("sess_ghost", ChatRole::User, "hello", None)
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_history_returns_last_n_in_order() {
        let (store, _dir) = test_store().await;
        store
            .create_session(&session("sess_h", Some(1), Channel::Web))
            .await
            .unwrap();
        for content in ["A", "B", "C"] {
            store
                .append_message("sess_h", ChatRole::User, content, None)
                .await
                .unwrap();
        }

        let history = store.get_history("sess_h", 2).await.unwrap();
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["B", "C"]);
    }

    #[tokio::test]
    async fn test_conversation_skips_agent_rows() {
        let (store, _dir) = test_store().await;
        store
            .create_session(&session("sess_c", Some(1), Channel::Web))
            .await
            .unwrap();
        for turn in ["A", "B", "C"] {
            store
                .append_message("sess_c", ChatRole::User, turn, None)
                .await
                .unwrap();
            store
                .append_message("sess_c", ChatRole::Agent, "notes", Some("inventory_agent"))
                .await
                .unwrap();
            store
                .append_message("sess_c", ChatRole::Assistant, &turn.to_lowercase(), None)
                .await
                .unwrap();
        }

        let conversation = store.get_conversation("sess_c", 4).await.unwrap();
        let contents: Vec<&str> = conversation.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["B", "b", "C", "c"]);

        let raw = store.get_history("sess_c", 4).await.unwrap();
        assert_eq!(raw[0].role, ChatRole::Assistant);
        assert_eq!(raw[1].role, ChatRole::User);
        assert_eq!(raw[2].role, ChatRole::Agent);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_get_gap_free_seq() {
        let (store, _dir) = test_store().await;
        store
            .create_session(&session("sess_busy", Some(1), Channel::Web))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let role = if i % 2 == 0 { ChatRole::User } else { ChatRole::Agent };
                store
                    .append_message("sess_busy", role, &format!("message {i}"), None)
                    .await
                    .unwrap()
                    .seq
            }));
        }
        let mut seqs = Vec::new();
        for handle in handles {
            seqs.push(handle.await.unwrap());
        }
        seqs.sort_unstable();
        assert_eq!(seqs, (1..=20).collect::<Vec<i64>>());

        let stored = store.get_history("sess_busy", 50).await.unwrap();
        let stored_seqs: Vec<i64> = stored.iter().map(|m| m.seq).collect();
        assert_eq!(stored_seqs, (1..=20).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_cross_session_excludes_current_and_other_users() {
        let (store, _dir) = test_store().await;
        store
            .create_session(&session("sess_old", Some(3), Channel::Whatsapp))
            .await
            .unwrap();
        store
            .create_session(&session("sess_now", Some(3), Channel::Web))
            .await
            .unwrap();
        store
            .create_session(&session("sess_else", Some(4), Channel::Web))
            .await
            .unwrap();
        store
            .append_message("sess_old", ChatRole::User, "black dress for a wedding", None)
            .await
            .unwrap();
        store
            .append_message("sess_now", ChatRole::User, "current turn", None)
            .await
            .unwrap();
        store
            .append_message("sess_else", ChatRole::User, "someone else", None)
            .await
            .unwrap();

        let recent = store
            .recent_cross_session_messages(3, 10, Some("sess_now"))
            .await
            .unwrap();
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["black dress for a wedding"]);

        let all = store.recent_cross_session_messages(3, 10, None).await.unwrap();
        assert_eq!(all.len(), 2);

        store
            .append_message("sess_old", ChatRole::Agent, "4 in stock", Some("inventory_agent"))
            .await
            .unwrap();
        let recent = store
            .recent_cross_session_messages(3, 1, Some("sess_now"))
            .await
            .unwrap();
        assert_eq!(recent[0].content, "black dress for a wedding");
    }

    #[tokio::test]
    async fn test_list_sessions_for_user() {
        let (store, _dir) = test_store().await;
        store
            .create_session(&session("sess_1", Some(9), Channel::Web))
            .await
            .unwrap();
        store
            .create_session(&session("sess_2", Some(9), Channel::Kiosk))
            .await
            .unwrap();
        store
            .create_session(&session("sess_3", None, Channel::Web))
            .await
            .unwrap();

        let sessions = store.list_sessions(9).await.unwrap();
        assert_eq!(sessions.len(), 2);
    }
}
