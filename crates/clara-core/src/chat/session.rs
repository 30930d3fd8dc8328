//! Session resolution and append-only history.
//!
//! `SessionManager` decides which session a turn belongs to and owns every
//! write to the message log. Ordering comes from the store's per-session
//! `seq`, never from wall-clock timestamps.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use clara_types::chat::{Channel, ChatMessage, ChatRole, ChatSession, SessionStatus};
use clara_types::error::RepositoryError;

use crate::chat::repository::ChatRepository;

/// Resolves sessions and persists conversation turns.
pub struct SessionManager<C: ChatRepository> {
    repo: Arc<C>,
}

impl<C: ChatRepository> Clone for SessionManager<C> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<C: ChatRepository> SessionManager<C> {
    pub fn new(repo: Arc<C>) -> Self {
        Self { repo }
    }

    /// Pick the session for this turn.
    ///
    /// - A known id is returned unchanged.
    /// - An unknown id is adopted: a session row is created under that id.
    /// - No id with a known user opens a fresh session on `channel`.
    /// - No id and no user means the turn is not persisted (`None`).
    pub async fn resolve_session(
        &self,
        session_id: Option<&str>,
        user_id: Option<i64>,
        channel: Channel,
    ) -> Result<Option<String>, RepositoryError> {
        match session_id {
            Some(id) => {
                if self.repo.get_session(id).await?.is_some() {
                    return Ok(Some(id.to_string()));
                }
                let session = self.new_session(id.to_string(), user_id, channel);
                match self.repo.create_session(&session).await {
                    Ok(created) => {
                        info!(session_id = %created.id, channel = %channel, "Adopted client session id");
                        Ok(Some(created.id))
                    }
                    // Lost a race with a concurrent turn adopting the same id.
                    Err(RepositoryError::Conflict(_)) => Ok(Some(id.to_string())),
                    Err(e) => Err(e),
                }
            }
            None => match user_id {
                Some(_) => self.create_session(user_id, channel).await.map(Some),
                None => {
                    debug!("Anonymous turn without session, skipping persistence");
                    Ok(None)
                }
            },
        }
    }

    /// Open a fresh session bound to a user and a channel.
    pub async fn create_session(
        &self,
        user_id: Option<i64>,
        channel: Channel,
    ) -> Result<String, RepositoryError> {
        let session = self.new_session(ChatSession::generate_id(), user_id, channel);
        let created = self.repo.create_session(&session).await?;
        info!(session_id = %created.id, channel = %channel, "Session created");
        Ok(created.id)
    }

    /// Append one message to a session's log.
    pub async fn append(
        &self,
        session_id: &str,
        role: ChatRole,
        content: &str,
        agent_tag: Option<&str>,
    ) -> Result<ChatMessage, RepositoryError> {
        self.repo
            .append_message(session_id, role, content, agent_tag)
            .await
    }

    /// The last `limit` messages of a session, oldest first, every role.
    pub async fn history(
        &self,
        session_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        self.repo.get_history(session_id, limit).await
    }

    /// The last `limit` user/assistant turns of a session, oldest first.
    pub async fn conversation(
        &self,
        session_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        self.repo.get_conversation(session_id, limit).await
    }

    fn new_session(&self, id: String, user_id: Option<i64>, channel: Channel) -> ChatSession {
        let now = Utc::now();
        ChatSession {
            id,
            user_id,
            channel,
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}
