use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::language_utils::to_service_locale;
use crate::providers::{Provider, TranslationRequest};

/// Public endpoint used by the Google web translation widget
pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com";

/// Client for the keyless Google web translation endpoint
#[derive(Debug)]
pub struct GoogleTranslate {
    /// HTTP client for API requests
    client: Client,
    /// Base URL, without the `/translate_a/single` path
    endpoint: String,
}

impl GoogleTranslate {
    /// Create a new client; an empty endpoint selects the public one
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        let endpoint = endpoint.into();
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            endpoint: if endpoint.is_empty() {
                DEFAULT_ENDPOINT.to_string()
            } else {
                endpoint.trim_end_matches('/').to_string()
            },
        }
    }

    /// Build the request URL for a translation
    pub fn request_url(&self, request: &TranslationRequest) -> Result<Url, ProviderError> {
        let base = format!("{}/translate_a/single", self.endpoint);
        Url::parse_with_params(
            &base,
            &[
                ("client", "gtx"),
                ("sl", to_service_locale(&request.source_language).as_str()),
                ("tl", to_service_locale(&request.target_language).as_str()),
                ("dt", "t"),
                ("q", request.text.as_str()),
            ],
        )
        .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint {}: {}", base, e)))
    }

    /// Extract the translation from a response body.
    ///
    /// The body is a nested array whose first element lists sentence
    /// segments as `[translated, original, ...]`.
    pub fn parse_response(body: &Value) -> Result<String, ProviderError> {
        let segments = body
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::ParseError("missing translation segments".to_string()))?;

        Ok(segments
            .iter()
            .filter_map(|segment| segment.get(0).and_then(Value::as_str))
            .collect())
    }
}

#[async_trait]
impl Provider for GoogleTranslate {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let url = self.request_url(request)?;
        debug!("Google translate request: {} chars", request.text.chars().count());

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Google translate error ({}): {}", status, error_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let body: Value = response.json().await?;
        Self::parse_response(&body)
    }

    fn name(&self) -> &str {
        "google"
    }
}
