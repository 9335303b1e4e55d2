/*!
 * Per-line translation with fallback.
 *
 * A line is translated with exactly one provider call. Any failure keeps the
 * original text so a document run never stops because of the service.
 */

use log::warn;

use crate::errors::TranslationError;
use crate::providers::{Provider, TranslationRequest};

/// Result of translating one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    /// Blank input, returned unchanged without a provider call
    Skipped(String),
    /// The provider's translation
    Translated(String),
    /// The provider failed; the original text is kept
    Failed {
        original: String,
        reason: String,
    },
}

impl TranslationOutcome {
    /// The text to render: the translation, or the original text on failure
    pub fn into_text(self) -> String {
        match self {
            Self::Skipped(text) | Self::Translated(text) => text,
            Self::Failed { original, .. } => original,
        }
    }

    /// Warning message for a failed attempt
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Failed { original, reason } => {
                Some(format!("Translation failed for '{}': {}", original, reason))
            }
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Translates single lines through a provider
#[derive(Debug)]
pub struct LineTranslator<P: Provider> {
    provider: P,
}

impl<P: Provider> LineTranslator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Translate a line and report how it went
    pub async fn attempt(&self, text: &str, source_language: &str, target_language: &str) -> TranslationOutcome {
        if text.trim().is_empty() {
            return TranslationOutcome::Skipped(text.to_string());
        }

        let request = TranslationRequest::new(text, source_language, target_language);
        let result = match self.provider.translate(&request).await {
            Ok(translated) if translated.trim().is_empty() => Err(TranslationError::EmptyResponse),
            Ok(translated) => Ok(translated),
            Err(e) => Err(TranslationError::from(e)),
        };

        match result {
            Ok(translated) => TranslationOutcome::Translated(translated),
            Err(e) => {
                let outcome = TranslationOutcome::Failed {
                    original: text.to_string(),
                    reason: e.to_string(),
                };
                if let Some(message) = outcome.warning() {
                    warn!("{} ({})", message, self.provider.name());
                }
                outcome
            }
        }
    }

    /// Translate a line, falling back to the original text on failure
    pub async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> String {
        self.attempt(text, source_language, target_language).await.into_text()
    }
}
