/*!
 * Tests for error types
 */

use pdftrans::errors::{AppError, DocumentError, ProviderError, TranslationError};

/// Test provider error messages
#[test]
fn test_provider_error_display_shouldIncludeDetails() {
    let error = ProviderError::ApiError {
        message: "Service unavailable".to_string(),
        status_code: 503,
    };
    let message = error.to_string();

    assert!(message.contains("503"));
    assert!(message.contains("Service unavailable"));
}

/// Test that provider errors convert into translation errors
#[test]
fn test_translation_error_fromProviderError_shouldWrap() {
    let error: TranslationError = ProviderError::ConnectionError("refused".to_string()).into();

    assert!(matches!(error, TranslationError::Provider(_)));
    assert!(error.to_string().contains("refused"));
}

/// Test lopdf errors map to format errors
#[test]
fn test_document_error_fromLopdfError_shouldBeFormatError() {
    let Err(lopdf_error) = lopdf::Document::load_mem(b"plain text, not a document") else {
        panic!("plain text should not parse as PDF");
    };
    let error: DocumentError = lopdf_error.into();

    assert!(matches!(error, DocumentError::Format(_)));
    assert!(error.to_string().starts_with("Invalid PDF document"));
}

/// Test that the app error wraps the library errors
#[test]
fn test_app_error_fromDocumentError_shouldWrap() {
    let error: AppError = DocumentError::Write("disk full".to_string()).into();

    assert!(matches!(error, AppError::Document(_)));
    assert!(error.to_string().contains("disk full"));
}
