/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for the supported backends:
 * - Google: the public web translation endpoint (default)
 * - Ollama: Local LLM server
 * - Anthropic: Anthropic API integration
 * - Mock: scripted provider for tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// One line of text to translate between two locales
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    /// The text to translate
    pub text: String,
    /// Source locale code (e.g. `en`)
    pub source_language: String,
    /// Target locale code (e.g. `zh-tw`)
    pub target_language: String,
}

impl TranslationRequest {
    pub fn new(
        text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }
}

/// Common trait for all translation providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the line translator.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Translate a single request
    ///
    /// # Arguments
    /// * `request` - The text and locale pair
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or an error
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError>;

    /// Short provider name for logs
    fn name(&self) -> &str;

    /// Check that the provider is reachable by translating a short probe
    async fn test_connection(&self, source_language: &str, target_language: &str) -> Result<(), ProviderError> {
        let probe = TranslationRequest::new("Hello", source_language, target_language);
        self.translate(&probe).await.map(|_| ())
    }
}

pub mod anthropic;
pub mod google;
pub mod mock;
pub mod ollama;
