/*!
 * End-to-end tests of the document rewrite loop
 */

use anyhow::Result;
use lopdf::{Object, StringFormat};
use std::cell::RefCell;
use pdftrans::errors::DocumentError;
use pdftrans::pdf::{PdfDocument, Rect};
use pdftrans::providers::mock::MockProvider;
use pdftrans::providers::TranslationRequest;
use pdftrans::rewriter::DocumentRewriter;
use crate::common;

fn german(request: &TranslationRequest) -> String {
    match request.text.as_str() {
        "Hello world" => "Hallo Welt".to_string(),
        other => format!("DE {}", other),
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.01
}

fn intersects(a: &Rect, b: &Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

fn shows_text(op: &lopdf::content::Operation, needle: &[u8]) -> bool {
    op.operator == "Tj"
        && matches!(op.operands.first(), Some(Object::String(bytes, _)) if bytes.windows(needle.len()).any(|w| w == needle))
}

/// A single line is erased and its translation drawn at the line's corner
#[tokio::test]
async fn test_rewrite_withSingleLine_shouldReplaceTextInPlace() -> Result<()> {
    common::init_test_logger();
    let provider = MockProvider::working().with_custom_response(german);
    let rewriter = DocumentRewriter::new(provider.clone());
    let input = common::hello_world_pdf()?;

    let output = rewriter.rewrite_with_report(&input, "en", "de").await?;

    let lines = common::page_lines(&output.bytes, 0)?;
    assert_eq!(lines.len(), 1, "only the translation should remain: {:?}", lines);
    assert_eq!(lines[0].text(), "Hallo Welt");
    let span = &lines[0].spans[0];
    assert!(close(span.origin.x, 72.0), "x = {}", span.origin.x);
    assert!(close(span.origin.y, 110.0), "y = {}", span.origin.y);
    assert!(close(span.size, 12.0));

    assert_eq!(provider.request_count(), 1);
    assert_eq!(output.report.pages, 1);
    assert_eq!(output.report.pages_modified, 1);
    assert_eq!(output.report.lines_translated, 1);
    assert_eq!(output.report.glyphs_removed, "Hello world".len());
    assert!(output.report.warnings.is_empty());
    Ok(())
}

/// Blank lines are left alone and cost no provider call
#[tokio::test]
async fn test_rewrite_withBlankLine_shouldTranslateOnlyTextLine() -> Result<()> {
    let provider = MockProvider::working().with_custom_response(german);
    let rewriter = DocumentRewriter::new(provider.clone());
    let input = common::blank_and_text_pdf()?;

    let output = rewriter.rewrite_with_report(&input, "en", "de").await?;

    assert_eq!(provider.request_count(), 1);
    assert_eq!(provider.requests()[0].text, "Hello world");
    assert_eq!(output.report.lines_seen, 2);
    assert_eq!(output.report.lines_skipped, 1);
    assert_eq!(output.report.lines_translated, 1);

    let texts = common::page_texts(&output.bytes, 0)?;
    assert!(texts.contains(&"Hallo Welt".to_string()));
    assert!(!texts.iter().any(|t| t.contains("Hello")));

    // The blank line's operator and area come through untouched
    let blank = common::page_lines(&input, 0)?
        .into_iter()
        .find(|line| line.is_blank())
        .expect("fixture has a blank line");
    let operations = common::page_operations(&output.bytes, 0)?;
    let blank_show = Object::String(b"   ".to_vec(), StringFormat::Literal);
    assert!(
        operations
            .iter()
            .any(|op| op.operator == "Tj" && op.operands == vec![blank_show.clone()])
    );
    let rects = common::filled_rects(&operations);
    assert_eq!(rects.len(), 1);
    assert!(rects.iter().all(|rect| !intersects(rect, &blank.bbox)), "{:?} vs {:?}", rects, blank.bbox);
    Ok(())
}

/// Overlapping line boxes: each redaction lands after the previous insertion
#[tokio::test]
async fn test_rewrite_withOverlappingLines_shouldRedactAfterPreviousInsert() -> Result<()> {
    let provider = MockProvider::working();
    let rewriter = DocumentRewriter::new(provider.clone());
    let input = common::build_pdf(&[vec![
        common::line("First line", 72.0, 700.0, 12.0),
        common::line("Second line", 72.0, 692.0, 12.0),
    ]])?;
    let boxes: Vec<Rect> = common::page_lines(&input, 0)?.iter().map(|l| l.bbox).collect();
    assert_eq!(boxes.len(), 2);
    assert!(intersects(&boxes[0], &boxes[1]));

    let output = rewriter.rewrite_with_report(&input, "en", "de").await?;

    let requested: Vec<String> = provider.requests().into_iter().map(|r| r.text).collect();
    assert_eq!(requested, vec!["First line", "Second line"]);
    assert_eq!(output.report.lines_translated, 2);

    let operations = common::page_operations(&output.bytes, 0)?;
    let first_insert = operations
        .iter()
        .position(|op| shows_text(op, b"First line"))
        .expect("first translation is drawn");
    let fills: Vec<usize> = operations
        .iter()
        .enumerate()
        .filter(|(_, op)| op.operator == "re")
        .map(|(i, _)| i)
        .collect();
    assert_eq!(fills.len(), 2);
    assert!(fills[0] < first_insert);
    assert!(fills[1] > first_insert);
    Ok(())
}

/// Lines drawn by a Form XObject are translated and erased like page lines
#[tokio::test]
async fn test_rewrite_withFormXObjectLine_shouldTranslateAndEraseIt() -> Result<()> {
    let provider = MockProvider::working();
    let rewriter = DocumentRewriter::new(provider.clone());
    let input = common::form_xobject_pdf()?;

    let output = rewriter.rewrite_with_report(&input, "en", "de").await?;

    let requested: Vec<String> = provider.requests().into_iter().map(|r| r.text).collect();
    assert_eq!(requested, vec!["Form text", "Page text"]);
    assert_eq!(output.report.lines_seen, 2);
    assert_eq!(output.report.glyphs_removed, "Form text".len() + "Page text".len());
    assert_eq!(
        common::page_texts(&output.bytes, 0)?,
        vec!["[TRANSLATED to de] Form text", "[TRANSLATED to de] Page text"]
    );

    // The page paints an edited copy; the original form stream is unchanged
    let operations = common::page_operations(&output.bytes, 0)?;
    let painted = operations.iter().find(|op| op.operator == "Do").expect("form is still painted");
    assert_eq!(painted.operands, vec![Object::Name(b"XPdfTrans".to_vec())]);

    let document = lopdf::Document::load_mem(&output.bytes)?;
    let forms: Vec<&lopdf::Stream> = document
        .objects
        .values()
        .filter_map(|obj| obj.as_stream().ok())
        .filter(|stream| matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(n)) if n.as_slice() == b"Form"))
        .collect();
    assert_eq!(forms.len(), 2);
    let with_text = forms
        .iter()
        .filter(|stream| stream.content.windows(9).any(|w| w == b"Form text"))
        .count();
    assert_eq!(with_text, 1);
    Ok(())
}

/// Non-PDF input fails before any translation happens
#[tokio::test]
async fn test_rewrite_withPlainText_shouldFailWithFormatError() {
    let provider = MockProvider::working();
    let rewriter = DocumentRewriter::new(provider.clone());

    let result = rewriter.rewrite(b"This is a plain text file.\n", "en", "de").await;

    assert!(matches!(result, Err(DocumentError::Format(_))));
    assert_eq!(provider.request_count(), 0);
}

/// A failing provider keeps the original text, re-inserted at the new anchor
#[tokio::test]
async fn test_rewrite_withFailingProvider_shouldReinsertOriginalText() -> Result<()> {
    common::init_test_logger();
    let rewriter = DocumentRewriter::new(MockProvider::failing());
    let input = common::hello_world_pdf()?;

    let output = rewriter.rewrite_with_report(&input, "en", "de").await?;

    let lines = common::page_lines(&output.bytes, 0)?;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text(), "Hello world");
    assert!(close(lines[0].spans[0].origin.y, 110.0));
    assert!(lines[0].spans[0].font.starts_with("FPdfTrans"));

    assert_eq!(output.report.lines_failed, 1);
    assert_eq!(output.report.lines_translated, 0);
    assert_eq!(output.report.warnings.len(), 1);
    assert!(output.report.warnings[0].contains("Hello world"));
    Ok(())
}

/// An empty reply is treated like a failure
#[tokio::test]
async fn test_rewrite_withEmptyReplies_shouldKeepOriginalText() -> Result<()> {
    let rewriter = DocumentRewriter::new(MockProvider::empty());
    let input = common::hello_world_pdf()?;

    let bytes = rewriter.rewrite(&input, "en", "de").await?;

    assert_eq!(common::page_texts(&bytes, 0)?, vec!["Hello world".to_string()]);
    Ok(())
}

/// Page count is preserved and progress is reported per page
#[tokio::test]
async fn test_rewrite_withSeveralPages_shouldKeepPageCount() -> Result<()> {
    let provider = MockProvider::working();
    let rewriter = DocumentRewriter::new(provider.clone());
    let input = common::multi_page_pdf(3)?;
    let progress = RefCell::new(Vec::new());

    let output = rewriter
        .rewrite_with_progress(&input, "en", "de", |done, total| progress.borrow_mut().push((done, total)))
        .await?;

    assert_eq!(PdfDocument::load(&output.bytes)?.page_count(), 3);
    assert_eq!(progress.into_inner(), vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(provider.request_count(), 6);
    assert_eq!(output.report.pages_modified, 3);

    let texts = common::page_texts(&output.bytes, 1)?;
    assert_eq!(
        texts,
        vec![
            "[TRANSLATED to de] Page 2 title".to_string(),
            "[TRANSLATED to de] Some body text".to_string(),
        ]
    );
    Ok(())
}

/// Pages without text are not rewritten
#[tokio::test]
async fn test_rewrite_withEmptyPage_shouldLeaveItUnmodified() -> Result<()> {
    let provider = MockProvider::working();
    let rewriter = DocumentRewriter::new(provider.clone());
    let input = common::build_pdf(&[
        vec![common::line("Hello world", 72.0, common::HELLO_BASELINE, 12.0)],
        vec![],
    ])?;

    let output = rewriter.rewrite_with_report(&input, "en", "de").await?;

    assert_eq!(output.report.pages, 2);
    assert_eq!(output.report.pages_modified, 1);
    assert!(common::page_texts(&output.bytes, 1)?.is_empty());
    Ok(())
}

/// Characters outside WinAnsi are drawn as question marks
#[tokio::test]
async fn test_rewrite_withCjkTranslation_shouldReplaceUnsupportedCharacters() -> Result<()> {
    let provider = MockProvider::working().with_custom_response(|_| "你好世界".to_string());
    let rewriter = DocumentRewriter::new(provider);
    let input = common::hello_world_pdf()?;

    let bytes = rewriter.rewrite(&input, "en", "zh-tw").await?;

    assert_eq!(common::page_texts(&bytes, 0)?, vec!["????".to_string()]);
    Ok(())
}

/// Running the rewrite on its own output translates the translation again
#[tokio::test]
async fn test_rewrite_twice_shouldNotBeIdempotent() -> Result<()> {
    let rewriter = DocumentRewriter::new(MockProvider::working());
    let input = common::hello_world_pdf()?;

    let once = rewriter.rewrite(&input, "en", "de").await?;
    let twice = rewriter.rewrite(&once, "en", "de").await?;

    let first = common::page_lines(&once, 0)?;
    let second = common::page_lines(&twice, 0)?;
    assert_eq!(first[0].text(), "[TRANSLATED to de] Hello world");
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].text(), "[TRANSLATED to de] [TRANSLATED to de] Hello world");
    // The anchor drifts: the second pass measures the inserted line's box
    assert!(second[0].spans[0].origin.y > first[0].spans[0].origin.y);
    Ok(())
}
