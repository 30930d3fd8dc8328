//! Per-turn sales pipeline.
//!
//! resolve session -> load history -> persist user message ->
//! (classify || build context) -> fan out -> compose -> persist -> respond.
//!
//! Only session and message store failures abort a turn. Everything else
//! (context lookups, specialists, the LLM) degrades in place.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use clara_types::chat::{ChatMessage, ChatRole};
use clara_types::config::AssistantConfig;
use clara_types::error::RepositoryError;
use clara_types::llm::{Message, MessageRole};
use clara_types::sales::{SalesRequest, SalesResponse};

use crate::agent::action::derive_action;
use crate::agent::classifier::IntentClassifier;
use crate::agent::composer::SalesComposer;
use crate::agent::context::{ContextBuilder, MemoryLimits};
use crate::agent::coordinator::FanOutCoordinator;
use crate::chat::session::SessionManager;
use crate::llm::box_provider::BoxLlmProvider;
use crate::repository::Store;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("session store error: {0}")]
    Session(#[from] RepositoryError),
}

pub struct Orchestrator<S: Store> {
    classifier: IntentClassifier,
    contexts: ContextBuilder<S>,
    coordinator: FanOutCoordinator<S>,
    composer: SalesComposer<S>,
    sessions: SessionManager<S>,
    history_limit: u32,
}

impl<S: Store> Orchestrator<S> {
    pub fn new(store: Arc<S>, provider: Option<BoxLlmProvider>, config: &AssistantConfig) -> Self {
        let settings = &config.orchestrator;
        Self {
            classifier: IntentClassifier::new(),
            contexts: ContextBuilder::new(Arc::clone(&store), MemoryLimits::from(settings)),
            coordinator: FanOutCoordinator::new(
                Arc::clone(&store),
                Duration::from_millis(settings.agent_timeout_ms),
            ),
            composer: SalesComposer::new(Arc::clone(&store), provider, config.llm.clone())
                .with_history_limit(settings.history_limit as usize),
            sessions: SessionManager::new(store),
            history_limit: settings.history_limit,
        }
    }

    pub fn sessions(&self) -> &SessionManager<S> {
        &self.sessions
    }

    pub fn has_llm(&self) -> bool {
        self.composer.has_provider()
    }

    /// Handle one customer message end to end.
    pub async fn process_message(
        &self,
        request: SalesRequest,
    ) -> Result<SalesResponse, OrchestratorError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(OrchestratorError::EmptyMessage);
        }

        let session_id = self
            .sessions
            .resolve_session(request.session_id.as_deref(), request.user_id, request.channel)
            .await?;

        // Loaded before the user message is appended, so it excludes this turn.
        let history = match session_id.as_deref() {
            Some(id) => self
                .sessions
                .conversation(id, self.history_limit)
                .await?
                .iter()
                .filter_map(to_llm_message)
                .collect(),
            None => request.history.clone().unwrap_or_default(),
        };

        if let Some(id) = session_id.as_deref() {
            self.sessions.append(id, ChatRole::User, message, None).await?;
        }

        let (categories, context) = tokio::join!(
            async { self.classifier.classify(message) },
            self.contexts.build(request.user_id, session_id.as_deref()),
        );
        debug!(?categories, user_id = ?request.user_id, "Routed message");

        let context = Arc::new(context);
        let outputs = self
            .coordinator
            .run(&categories, message, Arc::clone(&context))
            .await;

        let composition = self
            .composer
            .compose(message, &history, &context, request.channel, &outputs)
            .await;

        if let Some(id) = session_id.as_deref() {
            for output in &outputs {
                self.sessions
                    .append(id, ChatRole::Agent, &output.content, Some(&output.source))
                    .await?;
            }
            self.sessions
                .append(id, ChatRole::Assistant, &composition.reply, None)
                .await?;
        }

        let action = derive_action(&composition.reply, &composition.candidates, request.user_id);
        info!(
            session_id = session_id.as_deref().unwrap_or("-"),
            channel = %request.channel,
            agents = outputs.len(),
            reply_source = ?composition.source,
            requires_action = action.is_some(),
            "Turn complete"
        );

        Ok(SalesResponse {
            reply: composition.reply,
            session_id,
            requires_action: action.is_some(),
            action_type: action.as_ref().map(|a| a.action_type),
            action_data: action.map(|a| a.data),
        })
    }
}

/// Stored user/assistant turns become LLM history; agent and system rows do not.
fn to_llm_message(message: &ChatMessage) -> Option<Message> {
    let role = match message.role {
        ChatRole::User => MessageRole::User,
        ChatRole::Assistant => MessageRole::Assistant,
        ChatRole::Agent | ChatRole::System => return None,
    };
    Some(Message::new(role, message.content.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::repository::ChatRepository;
    use crate::testing::{MemoryStore, ScriptedProvider};
    use clara_types::sales::ActionType;

    fn orchestrator(
        store: &Arc<MemoryStore>,
        provider: &ScriptedProvider,
    ) -> Orchestrator<MemoryStore> {
        Orchestrator::new(
            Arc::clone(store),
            Some(BoxLlmProvider::new(provider.clone())),
            &AssistantConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_anonymous_turn_is_not_persisted() {
        let store = Arc::new(MemoryStore::new());
        let provider = ScriptedProvider::replying("Happy to help you find a look!");
        let mut request = SalesRequest::new("suggest something for brunch");
        request.history = Some(vec![
            Message::new(MessageRole::User, "hi"),
            Message::new(MessageRole::Assistant, "Hello!"),
        ]);

        let response = orchestrator(&store, &provider)
            .process_message(request)
            .await
            .unwrap();

        assert_eq!(response.reply, "Happy to help you find a look!");
        assert!(response.session_id.is_none());
        assert_eq!(store.session_count(), 0);
        assert_eq!(store.message_count(), 0);
        // Client-held history + current message.
        assert_eq!(provider.last_request().unwrap().messages.len(), 3);
    }

    #[tokio::test]
    async fn test_known_user_turn_is_persisted_with_agent_outputs() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Nora", 40);
        let provider = ScriptedProvider::replying("You can return it within 30 days.");
        let mut request = SalesRequest::new("I'd like to return a dress");
        request.user_id = Some(user.id);

        let response = orchestrator(&store, &provider)
            .process_message(request)
            .await
            .unwrap();

        let session_id = response.session_id.unwrap();
        let stored = store.get_history(&session_id, 10).await.unwrap();
        let roles: Vec<ChatRole> = stored.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Agent, ChatRole::Assistant]);
        assert_eq!(stored[1].agent_tag.as_deref(), Some("support_agent"));
        assert_eq!(stored[2].content, "You can return it within 30 days.");

        let system = provider.last_request().unwrap().system.unwrap();
        assert!(system.contains("[support_agent]"));
        assert!(system.contains("Name: Nora Tester"));
    }

    #[tokio::test]
    async fn test_stored_history_excludes_agent_rows_and_current_turn() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Nora", 0);
        store.add_session("sess_existing", Some(user.id));
        store
            .append_message("sess_existing", ChatRole::User, "earlier question", None)
            .await
            .unwrap();
        store
            .append_message("sess_existing", ChatRole::Agent, "tool text", Some("support_agent"))
            .await
            .unwrap();
        store
            .append_message("sess_existing", ChatRole::Assistant, "earlier answer", None)
            .await
            .unwrap();
        let provider = ScriptedProvider::replying("ok");

        let mut request = SalesRequest::new("suggest a jacket");
        request.user_id = Some(user.id);
        request.session_id = Some("sess_existing".into());
        orchestrator(&store, &provider)
            .process_message(request)
            .await
            .unwrap();

        let contents: Vec<String> = provider
            .last_request()
            .unwrap()
            .messages
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["earlier question", "earlier answer", "suggest a jacket"]);
    }

    #[tokio::test]
    async fn test_history_window_counts_only_conversation_turns() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Nora", 0);
        store.add_session("sess_long", Some(user.id));
        for turn in 1..=6 {
            store
                .append_message("sess_long", ChatRole::User, &format!("question {turn}"), None)
                .await
                .unwrap();
            for agent in ["inventory_agent", "recommendation_agent"] {
                store
                    .append_message("sess_long", ChatRole::Agent, "agent notes", Some(agent))
                    .await
                    .unwrap();
            }
            store
                .append_message("sess_long", ChatRole::Assistant, &format!("answer {turn}"), None)
                .await
                .unwrap();
        }
        let provider = ScriptedProvider::replying("ok");

        let mut request = SalesRequest::new("anything else?");
        request.user_id = Some(user.id);
        request.session_id = Some("sess_long".into());
        orchestrator(&store, &provider)
            .process_message(request)
            .await
            .unwrap();

        let messages = provider.last_request().unwrap().messages;
        assert_eq!(messages.len(), 13);
        assert_eq!(messages[0].content, "question 1");
        assert_eq!(messages[11].content, "answer 6");
        assert_eq!(messages[12].content, "anything else?");
    }

    #[tokio::test]
    async fn test_message_store_failure_is_fatal() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Nora", 0);
        store.fail("append_message");
        let provider = ScriptedProvider::replying("unused");
        let mut request = SalesRequest::new("hello there");
        request.user_id = Some(user.id);

        let result = orchestrator(&store, &provider).process_message(request).await;
        assert!(matches!(result, Err(OrchestratorError::Session(_))));
    }

    #[tokio::test]
    async fn test_context_failures_degrade() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("Nora", 0);
        store.fail("get_user");
        store.fail("search_products");
        let provider = ScriptedProvider::replying("Still here to help.");
        let mut request = SalesRequest::new("suggest a look");
        request.user_id = Some(user.id);

        let response = orchestrator(&store, &provider)
            .process_message(request)
            .await
            .unwrap();
        assert_eq!(response.reply, "Still here to help.");
    }

    #[tokio::test]
    async fn test_reply_mentioning_cart_sets_action() {
        let store = Arc::new(MemoryStore::new());
        let gown = store.add_product("Emerald Satin Gown", "formal", 280, 6, &["Emerald"]);
        let provider =
            ScriptedProvider::replying("The Emerald Satin Gown is stunning. Want me to add to cart?");

        let response = orchestrator(&store, &provider)
            .process_message(SalesRequest::new("recommend a formal gown"))
            .await
            .unwrap();

        assert!(response.requires_action);
        assert_eq!(response.action_type, Some(ActionType::AddToCart));
        assert_eq!(response.action_data.unwrap()["product_id"], gown.id);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let store = Arc::new(MemoryStore::new());
        let provider = ScriptedProvider::replying("unused");
        let result = orchestrator(&store, &provider)
            .process_message(SalesRequest::new("   "))
            .await;
        assert!(matches!(result, Err(OrchestratorError::EmptyMessage)));
    }
}
