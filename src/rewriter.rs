/*!
 * Document rewriter.
 *
 * Walks every page's text lines in extraction order, translates each
 * non-blank line, erases it and writes the translation back at the line's
 * bottom-left corner.
 */

use log::{debug, info, warn};

use crate::errors::DocumentError;
use crate::pdf::{PdfDocument, Point};
use crate::providers::Provider;
use crate::translation::LineTranslator;

/// Font size of inserted translations
pub const INSERT_FONT_SIZE: f64 = 12.0;

/// Distance from the bottom edge of a line's box to the inserted baseline
pub const BASELINE_OFFSET: f64 = 2.0;

/// Counters collected during a rewrite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    pub pages: usize,
    /// Pages whose content was rewritten
    pub pages_modified: usize,
    pub lines_seen: usize,
    pub lines_translated: usize,
    /// Blank lines left untouched
    pub lines_skipped: usize,
    /// Lines whose original text was reinserted after a failed translation
    pub lines_failed: usize,
    pub glyphs_removed: usize,
    /// Non-fatal problems, in the order they happened
    pub warnings: Vec<String>,
}

/// Rewritten document bytes plus the run report
#[derive(Debug, Clone)]
pub struct RewriteOutput {
    pub bytes: Vec<u8>,
    pub report: RewriteReport,
}

/// Replaces every text line of a document with its translation
#[derive(Debug)]
pub struct DocumentRewriter<P: Provider> {
    translator: LineTranslator<P>,
}

impl<P: Provider> DocumentRewriter<P> {
    pub fn new(provider: P) -> Self {
        Self {
            translator: LineTranslator::new(provider),
        }
    }

    /// Translate a document, returning the new document bytes
    pub async fn rewrite(&self, bytes: &[u8], source_language: &str, target_language: &str) -> Result<Vec<u8>, DocumentError> {
        Ok(self.rewrite_with_report(bytes, source_language, target_language).await?.bytes)
    }

    /// Translate a document and report what happened
    pub async fn rewrite_with_report(
        &self,
        bytes: &[u8],
        source_language: &str,
        target_language: &str,
    ) -> Result<RewriteOutput, DocumentError> {
        self.rewrite_with_progress(bytes, source_language, target_language, |_, _| {}).await
    }

    /// Translate a document, calling `progress(pages_done, page_count)` after each page
    pub async fn rewrite_with_progress<F>(
        &self,
        bytes: &[u8],
        source_language: &str,
        target_language: &str,
        mut progress: F,
    ) -> Result<RewriteOutput, DocumentError>
    where
        F: FnMut(usize, usize),
    {
        let mut document = PdfDocument::load(bytes)?;
        let page_count = document.page_count();
        let mut report = RewriteReport {
            pages: page_count,
            ..Default::default()
        };
        info!("Rewriting {} page(s) from {} to {}", page_count, source_language, target_language);

        for index in 0..page_count {
            let mut canvas = match document.page(index) {
                Ok(canvas) => canvas,
                Err(e) => {
                    let message = format!("Page {} skipped: {}", index + 1, e);
                    warn!("{}", message);
                    report.warnings.push(message);
                    progress(index + 1, page_count);
                    continue;
                }
            };

            let text_page = canvas.text_page();
            debug!("Page {}: {} line(s) in {} block(s)", index + 1, text_page.line_count(), text_page.blocks.len());

            for line in text_page.lines() {
                report.lines_seen += 1;
                let text = line.text();
                if text.trim().is_empty() {
                    report.lines_skipped += 1;
                    continue;
                }

                let outcome = self.translator.attempt(&text, source_language, target_language).await;
                match outcome.warning() {
                    Some(message) => {
                        report.lines_failed += 1;
                        report.warnings.push(message);
                    }
                    None => report.lines_translated += 1,
                }

                canvas.add_redaction(line.bbox);
                report.glyphs_removed += canvas.apply_redactions();
                canvas.insert_text(
                    Point::new(line.bbox.x0, line.bbox.y1 - BASELINE_OFFSET),
                    &outcome.into_text(),
                    INSERT_FONT_SIZE,
                );
            }

            if canvas.is_modified() {
                document.commit_page(canvas)?;
                report.pages_modified += 1;
            }
            progress(index + 1, page_count);
        }

        let bytes = document.save()?;
        info!(
            "Rewrite finished: {} translated, {} failed, {} blank line(s)",
            report.lines_translated, report.lines_failed, report.lines_skipped
        );
        Ok(RewriteOutput { bytes, report })
    }
}
