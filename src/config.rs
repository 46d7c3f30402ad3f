use crate::error::ConfigError;
use std::fmt;
use std::time::Duration;

/// Which text generation service drafts the newsletter
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Provider {
    /// Cohere chat API; text only, uploaded images are not sent
    #[default]
    Cohere,
    /// Anthropic messages API; uploaded images are attached to the prompt
    #[value(alias = "claude")]
    Anthropic,
}

impl Provider {
    /// Environment variable holding the provider's API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Provider::Cohere => "COHERE_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Cohere => "command-r-plus",
            Provider::Anthropic => "claude-3-5-sonnet-20241022",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Cohere => write!(f, "cohere"),
            Provider::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Everything needed to talk to a text generation service
#[derive(Clone)]
pub struct GeneratorConfig {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Applied to the whole request; there is no retry
    pub timeout: Duration,
}

impl GeneratorConfig {
    /// Build a configuration with the provider's defaults. A missing or blank
    /// key is rejected here, before any request is attempted.
    pub fn new(provider: Provider, api_key: Option<String>) -> Result<GeneratorConfig, ConfigError> {
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey {
                var: provider.api_key_var(),
            })?;

        Ok(GeneratorConfig {
            provider,
            api_key,
            model: provider.default_model().to_string(),
            max_tokens: 2048,
            temperature: 0.7,
            timeout: Duration::from_secs(120),
        })
    }

    /// Read the provider's API key from the process environment
    pub fn from_env(provider: Provider) -> Result<GeneratorConfig, ConfigError> {
        GeneratorConfig::new(provider, std::env::var(provider.api_key_var()).ok())
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_keys_are_missing() {
        assert_eq!(
            GeneratorConfig::new(Provider::Cohere, None).err(),
            Some(ConfigError::MissingApiKey {
                var: "COHERE_API_KEY"
            })
        );
        assert_eq!(
            GeneratorConfig::new(Provider::Anthropic, Some("  ".into())).err(),
            Some(ConfigError::MissingApiKey {
                var: "ANTHROPIC_API_KEY"
            })
        );
    }

    #[test]
    fn defaults_follow_the_provider() {
        let config = GeneratorConfig::new(Provider::Anthropic, Some(" sk-test \n".into())).unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, Provider::Anthropic.default_model());
        assert_eq!(config.max_tokens, 2048);

        let config = config.with_model("custom");
        assert_eq!(config.model, "custom");
        assert!(!format!("{config:?}").contains("sk-test"));
    }

    #[test]
    fn parses_provider_names() {
        use clap::ValueEnum;

        assert_eq!(Provider::from_str("Cohere", true), Ok(Provider::Cohere));
        assert_eq!(Provider::from_str("claude", true), Ok(Provider::Anthropic));
        assert!(Provider::from_str("openai", true).is_err());
        assert_eq!(Provider::Anthropic.to_string(), "anthropic");
    }
}
