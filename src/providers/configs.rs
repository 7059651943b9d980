use std::env;

use super::anthropic::{ANTHROPIC_API_VERSION, ANTHROPIC_DEFAULT_MODEL, ANTHROPIC_HOST};
use super::base::Completion;
use super::deepseek::{DEEPSEEK_DEFAULT_MODEL, DEEPSEEK_HOST};
use super::groq::{GROQ_DEFAULT_MODEL, GROQ_HOST};
use super::openai::{OPENAI_DEFAULT_MODEL, OPENAI_HOST};
use super::openrouter::{OPENROUTER_DEFAULT_MODEL, OPENROUTER_HOST};
use crate::errors::{AgentError, AgentResult};

/// Unified enum to wrap different provider configurations
pub enum ProviderConfig {
    Groq(GroqProviderConfig),
    OpenAi(OpenAiProviderConfig),
    Anthropic(AnthropicProviderConfig),
    DeepSeek(DeepSeekProviderConfig),
    OpenRouter(OpenRouterProviderConfig),
    Mock(Vec<Completion>),
}

fn require_env(key: &str) -> AgentResult<String> {
    env::var(key).map_err(|_| AgentError::Configuration(format!("{} must be set", key)))
}

pub struct GroqProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl GroqProviderConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            host: GROQ_HOST.to_string(),
            api_key: api_key.into(),
            model: GROQ_DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn from_env() -> AgentResult<Self> {
        let mut config = Self::new(require_env("GROQ_API_KEY")?);
        if let Ok(host) = env::var("GROQ_HOST") {
            config.host = host;
        }
        if let Ok(model) = env::var("GROQ_MODEL") {
            config.model = model;
        }
        Ok(config)
    }
}

pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl OpenAiProviderConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            host: OPENAI_HOST.to_string(),
            api_key: api_key.into(),
            model: OPENAI_DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn from_env() -> AgentResult<Self> {
        let mut config = Self::new(require_env("OPENAI_API_KEY")?);
        if let Ok(host) = env::var("OPENAI_HOST") {
            config.host = host;
        }
        if let Ok(model) = env::var("OPENAI_MODEL") {
            config.model = model;
        }
        Ok(config)
    }
}

pub struct AnthropicProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub api_version: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl AnthropicProviderConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            host: ANTHROPIC_HOST.to_string(),
            api_key: api_key.into(),
            model: ANTHROPIC_DEFAULT_MODEL.to_string(),
            api_version: ANTHROPIC_API_VERSION.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn from_env() -> AgentResult<Self> {
        let mut config = Self::new(require_env("ANTHROPIC_API_KEY")?);
        if let Ok(host) = env::var("ANTHROPIC_HOST") {
            config.host = host;
        }
        if let Ok(model) = env::var("ANTHROPIC_MODEL") {
            config.model = model;
        }
        Ok(config)
    }
}

pub struct DeepSeekProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl DeepSeekProviderConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            host: DEEPSEEK_HOST.to_string(),
            api_key: api_key.into(),
            model: DEEPSEEK_DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn from_env() -> AgentResult<Self> {
        let mut config = Self::new(require_env("DEEPSEEK_API_KEY")?);
        if let Ok(host) = env::var("DEEPSEEK_HOST") {
            config.host = host;
        }
        if let Ok(model) = env::var("DEEPSEEK_MODEL") {
            config.model = model;
        }
        Ok(config)
    }
}

pub struct OpenRouterProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    /// Optional site URL reported for OpenRouter rankings
    pub site_url: Option<String>,
    /// Optional application name reported for OpenRouter rankings
    pub app_name: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl OpenRouterProviderConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            host: OPENROUTER_HOST.to_string(),
            api_key: api_key.into(),
            model: OPENROUTER_DEFAULT_MODEL.to_string(),
            site_url: None,
            app_name: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn from_env() -> AgentResult<Self> {
        let mut config = Self::new(require_env("OPENROUTER_API_KEY")?);
        if let Ok(host) = env::var("OPENROUTER_HOST") {
            config.host = host;
        }
        if let Ok(model) = env::var("OPENROUTER_MODEL") {
            config.model = model;
        }
        config.site_url = env::var("OPENROUTER_SITE_URL").ok();
        config.app_name = env::var("OPENROUTER_APP_NAME").ok();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GroqProviderConfig::new("key");
        assert_eq!(config.host, GROQ_HOST);
        assert_eq!(config.model, GROQ_DEFAULT_MODEL);
        assert_eq!(config.api_key, "key");
        assert!(config.temperature.is_none());
    }

    #[test]
    fn test_missing_credential_is_configuration_error() {
        env::remove_var("DEEPSEEK_API_KEY");
        let result = DeepSeekProviderConfig::from_env();
        assert!(matches!(result, Err(AgentError::Configuration(_))));
    }
}
