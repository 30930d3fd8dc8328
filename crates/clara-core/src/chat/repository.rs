//! ChatRepository trait definition.
//!
//! Provides session creation and append-only message storage.
//! Follows the same RPITIT pattern as the commerce repositories.

use clara_types::chat::{ChatMessage, ChatRole, ChatSession};
use clara_types::error::RepositoryError;

/// Repository trait for chat session and message persistence.
pub trait ChatRepository: Send + Sync {
    /// Create a new chat session. Fails with `Conflict` if the id exists.
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Get a chat session by id.
    fn get_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Sessions belonging to a user, most recently updated first.
    fn list_sessions(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Append a message, assigning the next per-session `seq` atomically.
    fn append_message(
        &self,
        session_id: &str,
        role: ChatRole,
        content: &str,
        agent_tag: Option<&str>,
    ) -> impl std::future::Future<Output = Result<ChatMessage, RepositoryError>> + Send;

    /// The most recent `limit` messages of a session, oldest first.
    /// Includes agent and system rows.
    fn get_history(
        &self,
        session_id: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// The most recent `limit` user/assistant messages of a session,
    /// oldest first. Agent and system rows do not count toward `limit`.
    fn get_conversation(
        &self,
        session_id: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// The user's most recent `limit` user/assistant messages across their
    /// sessions, newest first, excluding `exclude_session_id` when given.
    fn recent_cross_session_messages(
        &self,
        user_id: i64,
        limit: u32,
        exclude_session_id: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;
}
