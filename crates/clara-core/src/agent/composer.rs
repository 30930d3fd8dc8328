//! Final reply composition.
//!
//! Ranks catalog candidates against the message, builds the sales prompt
//! and makes a single bounded LLM call. Any failure (no provider, provider
//! error, timeout, empty completion) and the fast path fall back to
//! [`fallback_reply`], so `compose` always produces a reply.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, field, info_span, warn, Instrument};

use clara_observe::genai_attrs::{
    GEN_AI_RESPONSE_FINISH_REASONS, GEN_AI_USAGE_INPUT_TOKENS, GEN_AI_USAGE_OUTPUT_TOKENS,
};

use clara_types::agent::{SpecialistOutput, UserContext};
use clara_types::catalog::ProductQuery;
use clara_types::chat::Channel;
use clara_types::commerce::cart_subtotal;
use clara_types::config::LlmSettings;
use clara_types::llm::{CompletionRequest, LlmError, Message, MessageRole};

use crate::agent::fallback::{fallback_reply, is_short_message};
use crate::agent::preferences::{words, Preferences};
use crate::agent::prompt::{CartSummary, PromptInput, SalesPromptBuilder};
use crate::agent::retrieval::{rank_candidates, Candidate};
use crate::llm::box_provider::BoxLlmProvider;
use crate::repository::Store;

/// Conversation messages sent with the prompt.
pub const DEFAULT_HISTORY_LIMIT: usize = 12;

/// Coarse intent used for prompt framing and the fast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesIntent {
    Recommendation,
    InventoryCheck,
    Purchase,
    Fulfillment,
    GeneralSales,
}

impl SalesIntent {
    pub fn infer(message: &str) -> Self {
        // Keywords match word prefixes, so "address" is not a dress.
        let words = words(message);
        let has = |keys: &[&str]| {
            keys.iter()
                .any(|k| words.iter().any(|w| w.starts_with(k)))
        };

        if has(&["recommend", "suggest", "find", "dress", "outfit"]) {
            SalesIntent::Recommendation
        } else if has(&["stock", "available", "inventory"]) {
            SalesIntent::InventoryCheck
        } else if has(&["checkout", "pay", "buy", "purchase"]) {
            SalesIntent::Purchase
        } else if has(&["delivery", "ship", "pickup"]) {
            SalesIntent::Fulfillment
        } else {
            SalesIntent::GeneralSales
        }
    }

    /// Transactional intents are answered by specialists; the model adds nothing.
    pub fn skips_llm(&self) -> bool {
        matches!(
            self,
            SalesIntent::InventoryCheck | SalesIntent::Purchase | SalesIntent::Fulfillment
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SalesIntent::Recommendation => "recommendation",
            SalesIntent::InventoryCheck => "inventory_check",
            SalesIntent::Purchase => "purchase",
            SalesIntent::Fulfillment => "fulfillment",
            SalesIntent::GeneralSales => "general_sales",
        }
    }
}

impl fmt::Display for SalesIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Llm,
    Fallback,
}

/// A composed reply plus the candidates it was drawn from.
#[derive(Debug, Clone)]
pub struct Composition {
    pub reply: String,
    pub candidates: Vec<Candidate>,
    pub source: ReplySource,
}

pub struct SalesComposer<S: Store> {
    store: Arc<S>,
    provider: Option<BoxLlmProvider>,
    settings: LlmSettings,
    history_limit: usize,
}

impl<S: Store> SalesComposer<S> {
    pub fn new(store: Arc<S>, provider: Option<BoxLlmProvider>, settings: LlmSettings) -> Self {
        Self {
            store,
            provider,
            settings,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Compose the reply for one turn. `history` excludes `message`.
    pub async fn compose(
        &self,
        message: &str,
        history: &[Message],
        context: &UserContext,
        channel: Channel,
        tool_outputs: &[SpecialistOutput],
    ) -> Composition {
        let preferences = Preferences::from_message(message, &context.style);
        let intent = SalesIntent::infer(message);

        let catalog = self
            .store
            .search_products(&ProductQuery::default())
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Catalog unavailable, composing without candidates");
                Vec::new()
            });
        let candidates = rank_candidates(catalog, &preferences);

        if is_short_message(message) || intent.skips_llm() {
            debug!(%intent, "Fast path, skipping LLM");
            return fallback(message, context, &preferences, candidates);
        }
        let Some(provider) = self.provider.as_ref() else {
            debug!("No LLM provider configured");
            return fallback(message, context, &preferences, candidates);
        };

        let cart = self.cart_summary(context.user_id).await;
        let system = SalesPromptBuilder::build(&PromptInput {
            context,
            channel,
            intent,
            preferences: &preferences,
            candidates: &candidates,
            cart: cart.as_ref(),
            tool_outputs,
        });
        let request = self.build_request(provider, system, history, message);

        match self.call(provider, &request).await {
            Ok(reply) => Composition {
                reply,
                candidates,
                source: ReplySource::Llm,
            },
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "LLM call failed, using fallback reply");
                fallback(message, context, &preferences, candidates)
            }
        }
    }

    fn build_request(
        &self,
        provider: &BoxLlmProvider,
        system: String,
        history: &[Message],
        message: &str,
    ) -> CompletionRequest {
        let skip = history.len().saturating_sub(self.history_limit);
        let mut messages: Vec<Message> = history.iter().skip(skip).cloned().collect();
        messages.push(Message::new(MessageRole::User, message));

        let model = if self.settings.model.is_empty() {
            provider.default_model().to_string()
        } else {
            self.settings.model.clone()
        };

        CompletionRequest {
            model,
            messages,
            system: Some(system),
            max_tokens: self.settings.max_tokens,
            temperature: Some(self.settings.temperature),
        }
    }

    async fn call(
        &self,
        provider: &BoxLlmProvider,
        request: &CompletionRequest,
    ) -> Result<String, LlmError> {
        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.usage.input_tokens = field::Empty,
            gen_ai.usage.output_tokens = field::Empty,
            gen_ai.response.finish_reasons = field::Empty,
        );
        let limit = Duration::from_secs(self.settings.timeout_secs);

        let response =
            tokio::time::timeout(limit, provider.complete(request).instrument(span.clone()))
                .await
                .map_err(|_| LlmError::Timeout(self.settings.timeout_secs))??;

        span.record(GEN_AI_USAGE_INPUT_TOKENS, response.usage.input_tokens);
        span.record(GEN_AI_USAGE_OUTPUT_TOKENS, response.usage.output_tokens);
        span.record(
            GEN_AI_RESPONSE_FINISH_REASONS,
            response.stop_reason.to_string().as_str(),
        );

        let content = response.content.trim();
        if content.is_empty() {
            return Err(LlmError::Provider {
                message: "empty completion".to_string(),
            });
        }
        debug!(
            output_tokens = response.usage.output_tokens,
            stop_reason = %response.stop_reason,
            "LLM reply received"
        );
        Ok(content.to_string())
    }

    async fn cart_summary(&self, user_id: Option<i64>) -> Option<CartSummary> {
        let user_id = user_id?;
        match self.store.get_cart(user_id).await {
            Ok(lines) if !lines.is_empty() => Some(CartSummary {
                items: lines.iter().map(|l| l.item.quantity).sum(),
                subtotal: cart_subtotal(&lines),
            }),
            Ok(_) => None,
            Err(e) => {
                warn!(user_id, error = %e, "Cart unavailable for prompt");
                None
            }
        }
    }
}

fn fallback(
    message: &str,
    context: &UserContext,
    preferences: &Preferences,
    candidates: Vec<Candidate>,
) -> Composition {
    Composition {
        reply: fallback_reply(message, context, preferences, &candidates),
        candidates,
        source: ReplySource::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::CartRepository;
    use crate::testing::{MemoryStore, ScriptedProvider};

    fn composer(
        store: &Arc<MemoryStore>,
        provider: Option<&ScriptedProvider>,
    ) -> SalesComposer<MemoryStore> {
        SalesComposer::new(
            Arc::clone(store),
            provider.map(|p| BoxLlmProvider::new(p.clone())),
            LlmSettings::default(),
        )
    }

    fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_product("Emerald Satin Gown", "formal", 280, 6, &["Emerald"]);
        store.add_product("Denim Shirt Dress", "casual", 70, 12, &["Blue"]);
        store
    }

    #[test]
    fn test_intent_ignores_keywords_inside_words() {
        assert_eq!(
            SalesIntent::infer("update my shipping address"),
            SalesIntent::Fulfillment
        );
        assert_eq!(SalesIntent::infer("show me dresses"), SalesIntent::Recommendation);
        assert_eq!(SalesIntent::infer("is the payment done"), SalesIntent::Purchase);
    }

    #[test]
    fn test_intent_inference() {
        assert_eq!(SalesIntent::infer("suggest an outfit"), SalesIntent::Recommendation);
        assert_eq!(SalesIntent::infer("is it available in M"), SalesIntent::InventoryCheck);
        assert_eq!(SalesIntent::infer("I want to checkout"), SalesIntent::Purchase);
        assert_eq!(SalesIntent::infer("pickup tomorrow?"), SalesIntent::Fulfillment);
        assert_eq!(SalesIntent::infer("hello there"), SalesIntent::GeneralSales);
        assert!(SalesIntent::Purchase.skips_llm());
        assert!(!SalesIntent::Recommendation.skips_llm());
    }

    #[tokio::test]
    async fn test_llm_reply_is_returned_trimmed() {
        let store = seeded();
        let provider = ScriptedProvider::replying("  The Emerald Satin Gown is perfect.  \n");
        let composition = composer(&store, Some(&provider))
            .compose(
                "recommend a formal gown under $300",
                &[],
                &UserContext::default(),
                Channel::Web,
                &[],
            )
            .await;

        assert_eq!(composition.source, ReplySource::Llm);
        assert_eq!(composition.reply, "The Emerald Satin Gown is perfect.");

        let request = provider.last_request().unwrap();
        assert_eq!(request.temperature, Some(0.25));
        assert_eq!(request.max_tokens, 800);
        let system = request.system.unwrap();
        assert!(system.contains("Emerald Satin Gown | $280"));
        assert!(system.contains("Inferred intent: recommendation"));
        assert_eq!(
            request.messages.last().map(|m| m.content.as_str()),
            Some("recommend a formal gown under $300")
        );
    }

    #[tokio::test]
    async fn test_provider_error_falls_back() {
        let store = seeded();
        let provider = ScriptedProvider::failing();
        let composition = composer(&store, Some(&provider))
            .compose("find me something formal", &[], &UserContext::default(), Channel::Web, &[])
            .await;

        assert_eq!(composition.source, ReplySource::Fallback);
        assert!(composition.reply.contains("• Emerald Satin Gown — $280 (formal)"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_completion_falls_back() {
        let store = seeded();
        let provider = ScriptedProvider::replying("   ");
        let composition = composer(&store, Some(&provider))
            .compose("find me something formal", &[], &UserContext::default(), Channel::Web, &[])
            .await;
        assert_eq!(composition.source, ReplySource::Fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_llm_times_out() {
        let store = seeded();
        let provider = ScriptedProvider::replying("too late").with_delay(Duration::from_secs(120));
        let composition = composer(&store, Some(&provider))
            .compose("find me something formal", &[], &UserContext::default(), Channel::Web, &[])
            .await;
        assert_eq!(composition.source, ReplySource::Fallback);
        assert!(!composition.reply.contains("too late"));
    }

    #[tokio::test]
    async fn test_fast_path_skips_llm() {
        let store = seeded();
        let provider = ScriptedProvider::replying("unused");
        let composer = composer(&store, Some(&provider));

        let short = composer
            .compose("hey", &[], &UserContext::default(), Channel::Web, &[])
            .await;
        assert!(short.reply.starts_with("Hi there!"));

        let stock = composer
            .compose("is the gown in stock?", &[], &UserContext::default(), Channel::Web, &[])
            .await;
        assert_eq!(stock.source, ReplySource::Fallback);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_provider_falls_back() {
        let store = seeded();
        let composition = composer(&store, None)
            .compose("suggest a casual look", &[], &UserContext::default(), Channel::Web, &[])
            .await;
        assert_eq!(composition.source, ReplySource::Fallback);
        assert!(!composition.candidates.is_empty());
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let store = seeded();
        let provider = ScriptedProvider::replying("ok");
        let history: Vec<Message> = (0..20)
            .map(|i| Message::new(MessageRole::User, format!("message {i}")))
            .collect();

        composer(&store, Some(&provider))
            .compose("suggest a casual look", &history, &UserContext::default(), Channel::Web, &[])
            .await;

        let request = provider.last_request().unwrap();
        assert_eq!(request.messages.len(), DEFAULT_HISTORY_LIMIT + 1);
        assert_eq!(request.messages[0].content, "message 8");
    }

    #[tokio::test]
    async fn test_cart_summary_reaches_prompt() {
        let store = seeded();
        let user = store.add_user("Ivy", 0);
        let shoes = store.add_product("Block Heel Sandal", "party", 60, 3, &[]);
        store.add_to_cart(user.id, shoes.id, 2).await.unwrap();
        let provider = ScriptedProvider::replying("ok");
        let ctx = UserContext {
            user_id: Some(user.id),
            name: Some("Ivy Tester".into()),
            ..UserContext::default()
        };

        composer(&store, Some(&provider))
            .compose("suggest a matching bag", &[], &ctx, Channel::Web, &[])
            .await;

        let system = provider.last_request().unwrap().system.unwrap();
        assert!(system.contains("<cart>\nItems: 2\nSubtotal: $120\n</cart>"));
    }
}
