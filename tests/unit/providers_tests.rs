/*!
 * Tests for provider clients and the configured translation service
 */

use anyhow::Result;
use serde_json::json;
use pdftrans::app_config::{TranslationConfig, TranslationProvider};
use pdftrans::errors::ProviderError;
use pdftrans::providers::anthropic::{Anthropic, AnthropicRequest};
use pdftrans::providers::google::GoogleTranslate;
use pdftrans::providers::mock::MockProvider;
use pdftrans::providers::{Provider, TranslationRequest};
use pdftrans::translation::TranslationService;

/// Unused local port; connections are refused immediately
const CLOSED_ENDPOINT: &str = "http://127.0.0.1:9";

fn config_for(provider: TranslationProvider) -> TranslationConfig {
    let mut config = TranslationConfig::default();
    config.provider = provider;
    config
}

/// Test the Google query string
#[test]
fn test_google_request_url_shouldCarryLocalesAndText() -> Result<()> {
    let client = GoogleTranslate::new("https://translate.example.com", 5);
    let url = client.request_url(&TranslationRequest::new("Hello world", "en", "zh-tw"))?;

    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert!(pairs.contains(&("sl".to_string(), "en".to_string())));
    assert!(pairs.contains(&("tl".to_string(), "zh-TW".to_string())));
    assert!(pairs.contains(&("q".to_string(), "Hello world".to_string())));
    assert_eq!(url.host_str(), Some("translate.example.com"));
    Ok(())
}

/// Test that Google segments are concatenated
#[test]
fn test_google_parse_response_shouldJoinSegments() {
    let body = json!([[["Hallo ", "Hello ", null], ["Welt", "world", null]], null, "en"]);
    assert_eq!(GoogleTranslate::parse_response(&body).unwrap(), "Hallo Welt");

    let invalid = json!({"error": "nope"});
    assert!(matches!(
        GoogleTranslate::parse_response(&invalid),
        Err(ProviderError::ParseError(_))
    ));
}

/// Test that Anthropic refuses to send without a key
#[tokio::test]
async fn test_anthropic_complete_withoutKey_shouldFailAuthentication() {
    let client = Anthropic::new("", "https://api.anthropic.com", 5);
    let request = AnthropicRequest::new("claude-3-haiku-20240307", 64).add_message("user", "Hello");

    let result = client.complete(request).await;
    assert!(matches!(result, Err(ProviderError::AuthenticationError(_))));
}

/// Test service names follow the configured provider
#[test]
fn test_translation_service_name_shouldFollowConfig() -> Result<()> {
    assert_eq!(TranslationService::new(config_for(TranslationProvider::Google))?.name(), "google");
    assert_eq!(TranslationService::new(config_for(TranslationProvider::Ollama))?.name(), "ollama");
    assert_eq!(TranslationService::new(config_for(TranslationProvider::Anthropic))?.name(), "anthropic");
    Ok(())
}

/// Test that an endpoint without host is rejected
#[test]
fn test_translation_service_withHostlessEndpoint_shouldFail() {
    let mut config = config_for(TranslationProvider::Ollama);
    config.active_provider_config_mut().endpoint = "http://".to_string();

    assert!(TranslationService::new(config).is_err());
}

/// Test that an unreachable server is reported as a connection problem
#[tokio::test]
async fn test_translation_service_withClosedPort_shouldReturnError() -> Result<()> {
    let mut config = config_for(TranslationProvider::Ollama);
    config.active_provider_config_mut().endpoint = CLOSED_ENDPOINT.to_string();
    config.active_provider_config_mut().timeout_secs = 2;
    let service = TranslationService::new(config)?;

    let result = service.translate(&TranslationRequest::new("Hello", "en", "de")).await;
    assert!(result.is_err());
    assert!(service.test_connection("en", "de").await.is_err());
    Ok(())
}

/// Test the default connection check of the mock provider
#[tokio::test]
async fn test_mock_test_connection_shouldFollowBehavior() {
    assert!(MockProvider::working().test_connection("en", "de").await.is_ok());
    assert!(MockProvider::failing().test_connection("en", "de").await.is_err());
}
