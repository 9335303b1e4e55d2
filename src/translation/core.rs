/*!
 * Core translation service implementation.
 *
 * This module contains the TranslationService struct, which builds the
 * configured provider client and adapts it to the [`Provider`] trait so the
 * line translator can drive any backend the same way.
 */

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::debug;
use std::time::Instant;
use url::Url;

use crate::app_config::{TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::errors::ProviderError;
use crate::language_utils::get_language_name;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::google::GoogleTranslate;
use crate::providers::ollama::{GenerationRequest, Ollama};
use crate::providers::{Provider, TranslationRequest};

/// Upper bound on generated tokens for a single line
const MAX_LINE_TOKENS: u32 = 1024;

/// Check that an endpoint string is a usable URL
fn validate_endpoint(endpoint: &str) -> Result<()> {
    if endpoint.is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    url.host_str()
        .ok_or_else(|| anyhow!("Invalid host in endpoint: {}", endpoint))?;
    Ok(())
}

/// Translation provider implementation variants
#[derive(Debug)]
enum TranslationProviderImpl {
    /// Google web translation
    Google {
        /// Client instance
        client: GoogleTranslate,
    },

    /// Ollama LLM service
    Ollama {
        /// Client instance
        client: Ollama,
    },

    /// Anthropic API service
    Anthropic {
        /// Client instance
        client: Anthropic,
    },
}

/// Translation service backed by the configured provider
#[derive(Debug)]
pub struct TranslationService {
    /// Provider implementation
    provider: TranslationProviderImpl,

    /// Configuration for the translation service
    pub config: TranslationConfig,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: TranslationConfig) -> Result<Self> {
        let endpoint = config.get_endpoint();
        let timeout_secs = config.get_timeout_secs();

        let provider = match config.provider {
            ConfigTranslationProvider::Google => {
                validate_endpoint(&endpoint)?;
                TranslationProviderImpl::Google {
                    client: GoogleTranslate::new(endpoint, timeout_secs),
                }
            }
            ConfigTranslationProvider::Ollama => {
                validate_endpoint(&endpoint)?;
                TranslationProviderImpl::Ollama {
                    client: Ollama::new(&endpoint, timeout_secs),
                }
            }
            ConfigTranslationProvider::Anthropic => TranslationProviderImpl::Anthropic {
                client: Anthropic::new(config.get_api_key(), endpoint, timeout_secs),
            },
        };

        Ok(Self { provider, config })
    }

    /// Fill the configured system prompt for a locale pair
    pub fn system_prompt(&self, source_language: &str, target_language: &str) -> String {
        let describe = |code: &str| get_language_name(code).unwrap_or_else(|_| code.to_string());
        self.config
            .common
            .system_prompt
            .replace("{source_language}", &describe(source_language))
            .replace("{target_language}", &describe(target_language))
    }
}

#[async_trait]
impl Provider for TranslationService {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let start_time = Instant::now();

        let translated = match &self.provider {
            TranslationProviderImpl::Google { client } => client.translate(request).await?,
            TranslationProviderImpl::Ollama { client } => {
                let generation = GenerationRequest::new(self.config.get_model(), request.text.as_str())
                    .system(self.system_prompt(&request.source_language, &request.target_language))
                    .temperature(self.config.common.temperature);
                client.generate(generation).await?.response
            }
            TranslationProviderImpl::Anthropic { client } => {
                let message = AnthropicRequest::new(self.config.get_model(), MAX_LINE_TOKENS)
                    .system(self.system_prompt(&request.source_language, &request.target_language))
                    .add_message("user", request.text.as_str())
                    .temperature(self.config.common.temperature);
                Anthropic::extract_text(&client.complete(message).await?)
            }
        };

        debug!(
            "{} response received in {:?}",
            self.config.provider.display_name(),
            start_time.elapsed()
        );
        Ok(translated.trim().to_string())
    }

    fn name(&self) -> &str {
        match &self.provider {
            TranslationProviderImpl::Google { .. } => "google",
            TranslationProviderImpl::Ollama { .. } => "ollama",
            TranslationProviderImpl::Anthropic { .. } => "anthropic",
        }
    }

    async fn test_connection(&self, source_language: &str, target_language: &str) -> Result<(), ProviderError> {
        match &self.provider {
            TranslationProviderImpl::Ollama { client } => client.version().await.map(|_| ()),
            _ => {
                let probe = TranslationRequest::new("Hello", source_language, target_language);
                self.translate(&probe).await.map(|_| ())
            }
        }
    }
}
