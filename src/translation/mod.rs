/*!
 * Translation services.
 *
 * - `core`: the configured provider behind a single service
 * - `line`: single-line translation with fallback to the original text
 */

pub mod core;
pub mod line;

pub use self::core::TranslationService;
pub use self::line::{LineTranslator, TranslationOutcome};
