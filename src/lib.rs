/*!
 * # pdftrans - PDF line translator
 *
 * A Rust library that translates a PDF document line by line and writes the
 * translations back where the original lines were.
 *
 * ## Features
 *
 * - Text extraction with geometry (blocks, lines and spans per page)
 * - Translation through pluggable providers:
 *   - Google web translation
 *   - Ollama (local LLM)
 *   - Anthropic API
 * - Whiteout and reinsert: original glyphs are removed and covered, the
 *   translation is drawn at the line's bottom-left corner
 * - Failed translations keep the original line text
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `pdf`: document model, content interpreter, text geometry and page edits
 * - `translation`: the configured provider service and the line translator
 * - `rewriter`: the per-line replacement loop over a whole document
 * - `providers`: HTTP clients for the translation backends, plus a mock
 * - `app_config`: Configuration management
 * - `app_controller`: File and folder processing for the command line
 * - `file_utils`: File system operations
 * - `language_utils`: Locale code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod pdf;
pub mod providers;
pub mod rewriter;
pub mod translation;

pub use app_config::Config;
pub use errors::{AppError, DocumentError, ProviderError, TranslationError};
pub use language_utils::{get_language_name, normalize_to_part2t};
pub use pdf::{PdfDocument, TextPage};
pub use rewriter::{DocumentRewriter, RewriteOutput, RewriteReport};
pub use translation::{LineTranslator, TranslationOutcome, TranslationService};
