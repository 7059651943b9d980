use std::str::FromStr;

use strum_macros::{Display, EnumIter, EnumString};

use super::anthropic::AnthropicProvider;
use super::base::Provider;
use super::configs::{
    AnthropicProviderConfig, DeepSeekProviderConfig, GroqProviderConfig, OpenAiProviderConfig,
    OpenRouterProviderConfig, ProviderConfig,
};
use super::deepseek::DeepSeekProvider;
use super::groq::GroqProvider;
use super::mock::MockProvider;
use super::openai::OpenAiProvider;
use super::openrouter::OpenRouterProvider;
use crate::errors::{AgentError, AgentResult};

/// The closed set of supported vendors. Adding one means adding a config,
/// an adapter, and a match arm here; the orchestration loop is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, Display)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum ProviderType {
    Groq,
    OpenAi,
    Anthropic,
    DeepSeek,
    OpenRouter,
    Mock,
}

impl ProviderType {
    /// Parse a provider identifier, e.g. from configuration
    pub fn parse(name: &str) -> AgentResult<Self> {
        Self::from_str(name)
            .map_err(|_| AgentError::Configuration(format!("Unsupported provider: {}", name)))
    }
}

pub fn get_provider(config: ProviderConfig) -> AgentResult<Box<dyn Provider + Send + Sync>> {
    match config {
        ProviderConfig::Groq(groq_config) => Ok(Box::new(GroqProvider::new(groq_config)?)),
        ProviderConfig::OpenAi(openai_config) => Ok(Box::new(OpenAiProvider::new(openai_config)?)),
        ProviderConfig::Anthropic(anthropic_config) => {
            Ok(Box::new(AnthropicProvider::new(anthropic_config)?))
        }
        ProviderConfig::DeepSeek(deepseek_config) => {
            Ok(Box::new(DeepSeekProvider::new(deepseek_config)?))
        }
        ProviderConfig::OpenRouter(openrouter_config) => {
            Ok(Box::new(OpenRouterProvider::new(openrouter_config)?))
        }
        ProviderConfig::Mock(responses) => Ok(Box::new(MockProvider::new(responses))),
    }
}

/// Resolve a provider from its configuration-string identifier and credential.
///
/// Convenience over [`get_provider`] for callers holding a provider name from
/// user configuration; defaults (host, model) come from the named provider's
/// config type.
pub fn resolve_provider(name: &str, api_key: &str) -> AgentResult<Box<dyn Provider + Send + Sync>> {
    let provider_type = ProviderType::parse(name)?;

    if api_key.is_empty() && provider_type != ProviderType::Mock {
        return Err(AgentError::Configuration(
            "API key is required".to_string(),
        ));
    }

    let config = match provider_type {
        ProviderType::Groq => ProviderConfig::Groq(GroqProviderConfig::new(api_key)),
        ProviderType::OpenAi => ProviderConfig::OpenAi(OpenAiProviderConfig::new(api_key)),
        ProviderType::Anthropic => {
            ProviderConfig::Anthropic(AnthropicProviderConfig::new(api_key))
        }
        ProviderType::DeepSeek => ProviderConfig::DeepSeek(DeepSeekProviderConfig::new(api_key)),
        ProviderType::OpenRouter => {
            ProviderConfig::OpenRouter(OpenRouterProviderConfig::new(api_key))
        }
        ProviderType::Mock => ProviderConfig::Mock(Vec::new()),
    };

    get_provider(config)
}
