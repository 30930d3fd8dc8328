//! LLM provider implementations.
//!
//! Contains the OpenAI-compatible implementation of the [`LlmProvider`]
//! trait defined in `clara-core`, a factory ([`create_provider`]) that builds
//! it from [`LlmSettings`], and a connection check
//! ([`test_provider_connection`]) used by `clara status`.
//!
//! [`LlmProvider`]: clara_core::llm::provider::LlmProvider

pub mod openai_compat;

use secrecy::SecretString;
use tracing::info;

use clara_core::llm::box_provider::BoxLlmProvider;
use clara_types::config::LlmSettings;
use clara_types::llm::{CompletionRequest, LlmError, Message, MessageRole};

use self::openai_compat::{OpenAiCompatConfig, OpenAiCompatibleProvider, OPENROUTER_BASE_URL};

/// Build the chat provider, or `None` when no API key is configured.
///
/// Without a provider the composer answers every turn with the
/// deterministic fallback reply.
pub fn create_provider(settings: &LlmSettings, api_key: Option<SecretString>) -> Option<BoxLlmProvider> {
    let api_key = api_key?;
    let provider_name = if settings.base_url.trim_end_matches('/') == OPENROUTER_BASE_URL {
        "openrouter"
    } else {
        "openai_compatible"
    };
    info!(provider = provider_name, model = %settings.model, "LLM provider configured");

    let provider = OpenAiCompatibleProvider::new(OpenAiCompatConfig {
        provider_name: provider_name.to_string(),
        base_url: settings.base_url.clone(),
        api_key,
        model: settings.model.clone(),
    });
    Some(BoxLlmProvider::new(provider))
}

/// Send a tiny completion to verify the key and endpoint.
pub async fn test_provider_connection(provider: &BoxLlmProvider) -> Result<(), LlmError> {
    let request = CompletionRequest {
        model: String::new(),
        messages: vec![Message::new(MessageRole::User, "Hello")],
        system: None,
        max_tokens: 10,
        temperature: Some(0.0),
    };
    provider.complete(&request).await?;
    Ok(())
}
