//! Per-turn user context assembly.
//!
//! `ContextBuilder::build` never fails: every lookup error is logged and the
//! corresponding piece of context is left out, so the composer always gets a
//! well-formed (possibly sparse) `UserContext`.

use std::sync::Arc;

use tracing::{debug, warn};

use clara_types::agent::{StylePreferences, UserContext};
use clara_types::chat::{ChatMessage, ChatRole};
use clara_types::config::OrchestratorSettings;

use crate::agent::preferences::{detect_occasion, rank_colors};
use crate::repository::Store;

/// Bounds for the cross-channel memory digest.
#[derive(Debug, Clone, Copy)]
pub struct MemoryLimits {
    /// Cross-session messages scanned.
    pub window: u32,
    /// Snippets kept for the prompt.
    pub max_snippets: usize,
    /// Per-snippet character budget.
    pub snippet_chars: usize,
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self::from(&OrchestratorSettings::default())
    }
}

impl From<&OrchestratorSettings> for MemoryLimits {
    fn from(settings: &OrchestratorSettings) -> Self {
        Self {
            window: settings.memory_window,
            max_snippets: settings.max_snippets,
            snippet_chars: settings.snippet_chars,
        }
    }
}

pub struct ContextBuilder<S: Store> {
    store: Arc<S>,
    limits: MemoryLimits,
}

impl<S: Store> ContextBuilder<S> {
    pub fn new(store: Arc<S>, limits: MemoryLimits) -> Self {
        Self { store, limits }
    }

    /// Assemble the context for one turn.
    pub async fn build(
        &self,
        user_id: Option<i64>,
        current_session_id: Option<&str>,
    ) -> UserContext {
        let Some(user_id) = user_id else {
            return UserContext::default();
        };

        let user = match self.store.get_user(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!(user_id, "Unknown user, using identity-less context");
                return UserContext::unknown_user(user_id);
            }
            Err(e) => {
                warn!(user_id, error = %e, "User lookup failed, using identity-less context");
                return UserContext::unknown_user(user_id);
            }
        };

        let past_orders = self.store.get_orders(user_id).await.unwrap_or_else(|e| {
            warn!(user_id, error = %e, "Order history unavailable");
            Vec::new()
        });

        let recent = self
            .store
            .recent_cross_session_messages(user_id, self.limits.window, current_session_id)
            .await
            .unwrap_or_else(|e| {
                warn!(user_id, error = %e, "Cross-session memory unavailable");
                Vec::new()
            });

        // Never echo the in-progress session back as memory.
        let recent: Vec<ChatMessage> = recent
            .into_iter()
            .filter(|m| Some(m.session_id.as_str()) != current_session_id)
            .collect();

        UserContext {
            user_id: Some(user_id),
            name: Some(user.full_name()),
            city: user.city.clone(),
            loyalty_points: Some(user.loyalty_points),
            past_orders,
            cross_channel_memory: memory_snippets(&recent, &self.limits),
            style: infer_style(&recent),
        }
    }
}

/// Role-prefixed, truncated snippets from user/assistant turns, newest first.
pub fn memory_snippets(messages: &[ChatMessage], limits: &MemoryLimits) -> Vec<String> {
    messages
        .iter()
        .filter(|m| matches!(m.role, ChatRole::User | ChatRole::Assistant))
        .filter(|m| !m.content.trim().is_empty())
        .take(limits.max_snippets)
        .map(|m| format!("{}: {}", m.role, truncate_chars(m.content.trim(), limits.snippet_chars)))
        .collect()
}

/// Style signals from what the customer said in other sessions.
pub fn infer_style(messages: &[ChatMessage]) -> StylePreferences {
    // Oldest first so "first seen" means first said.
    let user_texts: Vec<&str> = messages
        .iter()
        .rev()
        .filter(|m| m.role == ChatRole::User)
        .map(|m| m.content.as_str())
        .collect();

    StylePreferences {
        colors: rank_colors(user_texts.iter().copied()),
        occasion: detect_occasion(&user_texts.join(" ")).map(str::to_string),
    }
}

/// Truncate to at most `max` chars on a char boundary, marking the cut with `…`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::repository::ChatRepository;
    use crate::testing::MemoryStore;

    fn builder(store: &Arc<MemoryStore>) -> ContextBuilder<MemoryStore> {
        ContextBuilder::new(Arc::clone(store), MemoryLimits::default())
    }

    #[tokio::test]
    async fn test_anonymous_context_is_empty() {
        let store = Arc::new(MemoryStore::new());
        let ctx = builder(&store).build(None, None).await;
        assert!(ctx.user_id.is_none());
        assert!(ctx.name.is_none());
        assert!(ctx.cross_channel_memory.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_keeps_only_id() {
        let store = Arc::new(MemoryStore::new());
        let ctx = builder(&store).build(Some(42), None).await;
        assert_eq!(ctx.user_id, Some(42));
        assert!(ctx.name.is_none());
        assert!(ctx.loyalty_points.is_none());
    }

    #[tokio::test]
    async fn test_user_lookup_failure_degrades() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Maya", 120);
        store.fail("get_user");
        let ctx = builder(&store).build(Some(user.id), None).await;
        assert_eq!(ctx.user_id, Some(user.id));
        assert!(ctx.name.is_none());
    }

    #[tokio::test]
    async fn test_partial_failures_omit_pieces() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Maya", 120);
        store.fail("get_orders");
        store.fail("recent_cross_session_messages");
        let ctx = builder(&store).build(Some(user.id), Some("sess_current")).await;
        assert_eq!(ctx.name.as_deref(), Some("Maya Tester"));
        assert_eq!(ctx.loyalty_points, Some(120));
        assert!(ctx.past_orders.is_empty());
        assert!(ctx.cross_channel_memory.is_empty());
    }

    #[tokio::test]
    async fn test_cross_session_memory_excludes_current_session() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Maya", 0);
        store.add_session("sess_old", Some(user.id));
        store.add_session("sess_now", Some(user.id));
        store
            .append_message("sess_old", ChatRole::User, "I want something in black for a wedding", None)
            .await
            .unwrap();
        store
            .append_message("sess_old", ChatRole::Assistant, "Here are black gowns", None)
            .await
            .unwrap();
        store
            .append_message("sess_now", ChatRole::User, "CURRENT TURN", None)
            .await
            .unwrap();

        let ctx = builder(&store).build(Some(user.id), Some("sess_now")).await;

        assert_eq!(ctx.cross_channel_memory.len(), 2);
        assert!(ctx.cross_channel_memory.iter().all(|s| !s.contains("CURRENT TURN")));
        assert_eq!(ctx.cross_channel_memory[0], "assistant: Here are black gowns");
        assert_eq!(ctx.style.colors, vec!["black".to_string()]);
        assert_eq!(ctx.style.occasion.as_deref(), Some("Formal"));
    }

    #[tokio::test]
    async fn test_agent_rows_do_not_crowd_out_memory() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Maya", 0);
        store.add_session("sess_old", Some(user.id));
        store
            .append_message("sess_old", ChatRole::User, "looking for a navy blazer", None)
            .await
            .unwrap();
        for _ in 0..4 {
            store
                .append_message("sess_old", ChatRole::Agent, "inventory notes", Some("inventory_agent"))
                .await
                .unwrap();
        }
        let limits = MemoryLimits {
            window: 2,
            ..MemoryLimits::default()
        };

        let ctx = ContextBuilder::new(Arc::clone(&store), limits)
            .build(Some(user.id), None)
            .await;
        assert_eq!(ctx.cross_channel_memory, vec!["user: looking for a navy blazer".to_string()]);
    }

    #[tokio::test]
    async fn test_snippets_are_bounded_and_truncated() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Maya", 0);
        store.add_session("sess_old", Some(user.id));
        let long = "x".repeat(500);
        for _ in 0..12 {
            store
                .append_message("sess_old", ChatRole::User, &long, None)
                .await
                .unwrap();
        }

        let ctx = builder(&store).build(Some(user.id), None).await;
        assert_eq!(ctx.cross_channel_memory.len(), 8);
        for snippet in &ctx.cross_channel_memory {
            // "user: " + 160 chars
            assert_eq!(snippet.chars().count(), 6 + 160);
            assert!(snippet.ends_with('…'));
        }
    }

    #[test]
    fn test_agent_and_system_messages_are_not_snippets() {
        let now = chrono::Utc::now();
        let message = |role, content: &str| ChatMessage {
            id: uuid::Uuid::now_v7(),
            session_id: "s".into(),
            seq: 1,
            role,
            content: content.into(),
            agent_tag: None,
            created_at: now,
        };
        let messages = vec![
            message(ChatRole::Agent, "stock: 4"),
            message(ChatRole::System, "prompt"),
            message(ChatRole::User, "hi"),
        ];
        let snippets = memory_snippets(&messages, &MemoryLimits::default());
        assert_eq!(snippets, vec!["user: hi".to_string()]);
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 10), "héllo");
        assert_eq!(truncate_chars("héllo wörld", 5), "héll…");
    }
}
