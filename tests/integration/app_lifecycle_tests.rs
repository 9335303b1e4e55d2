/*!
 * Integration tests for application lifecycle
 */

use anyhow::Result;
use indicatif::MultiProgress;
use std::fs;
use pdftrans::app_config::Config;
use pdftrans::app_controller::{Controller, FileOutcome, ISSUES_LOG_FILE};
use pdftrans::providers::mock::MockProvider;
use pdftrans::rewriter::DocumentRewriter;
use crate::common;

fn controller() -> Result<Controller> {
    Controller::with_config(Config::default())
}

/// Test the controller initialization with default config
#[test]
fn test_controller_initialization_withDefaultConfig_shouldSucceed() -> Result<()> {
    let controller = controller()?;

    assert_eq!(controller.config().source_language, "en");
    assert_eq!(controller.config().target_language, "zh-tw");
    Ok(())
}

/// Test translating one file next to its input
#[tokio::test]
async fn test_run_with_singleFile_shouldWriteTranslatedPdf() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_pdf(temp_dir.path(), "hello.pdf")?;
    let provider = MockProvider::working();
    let rewriter = DocumentRewriter::new(provider.clone());

    controller()?.run_with(&rewriter, input.clone(), None, false).await?;

    let output = temp_dir.path().join("hello.zh-tw.pdf");
    assert!(output.exists());
    let texts = common::page_texts(&fs::read(&output)?, 0)?;
    assert_eq!(texts, vec!["[TRANSLATED to zh-tw] Hello world".to_string()]);
    assert_eq!(provider.request_count(), 1);
    // The input is left untouched
    assert_eq!(common::page_texts(&fs::read(&input)?, 0)?, vec!["Hello world".to_string()]);
    Ok(())
}

/// Test an explicit output file path
#[tokio::test]
async fn test_run_with_outputFile_shouldWriteThere() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_pdf(temp_dir.path(), "hello.pdf")?;
    let output = temp_dir.path().join("out").join("result.pdf");
    let rewriter = DocumentRewriter::new(MockProvider::working());

    controller()?.run_with(&rewriter, input, Some(output.clone()), false).await?;

    assert!(output.exists());
    Ok(())
}

/// Test that an existing translation is kept unless forced
#[tokio::test]
async fn test_run_file_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_pdf(temp_dir.path(), "hello.pdf")?;
    let output = common::create_test_file(temp_dir.path(), "hello.zh-tw.pdf", b"previous")?;
    let provider = MockProvider::working();
    let rewriter = DocumentRewriter::new(provider.clone());
    let controller = controller()?;
    let multi_progress = MultiProgress::new();

    let outcome = controller.run_file(&rewriter, &input, &output, false, &multi_progress).await?;
    assert!(matches!(outcome, FileOutcome::Skipped { .. }));
    assert_eq!(fs::read(&output)?, b"previous");
    assert_eq!(provider.request_count(), 0);

    let outcome = controller.run_file(&rewriter, &input, &output, true, &multi_progress).await?;
    match outcome {
        FileOutcome::Translated { report, .. } => assert_eq!(report.lines_translated, 1),
        other => panic!("expected a translation, got {:?}", other),
    }
    assert_ne!(fs::read(&output)?, b"previous");
    Ok(())
}

/// Test that failed lines are written to the issues log
#[tokio::test]
async fn test_run_with_failingProvider_shouldWriteIssuesLog() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_pdf(temp_dir.path(), "hello.pdf")?;
    let rewriter = DocumentRewriter::new(MockProvider::failing());

    controller()?.run_with(&rewriter, input, None, false).await?;

    assert!(temp_dir.path().join("hello.zh-tw.pdf").exists());
    let log = fs::read_to_string(temp_dir.path().join(ISSUES_LOG_FILE))?;
    assert!(log.contains("Translation failed for 'Hello world'"));
    Ok(())
}

/// Test that a missing input is reported
#[tokio::test]
async fn test_run_with_missingInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let rewriter = DocumentRewriter::new(MockProvider::working());

    let result = controller()?
        .run_with(&rewriter, temp_dir.path().join("missing.pdf"), None, false)
        .await;

    assert!(result.is_err());
    Ok(())
}

/// Test that a non-PDF input produces no output file
#[tokio::test]
async fn test_run_with_plainTextInput_shouldFailWithoutOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "notes.pdf", b"just text")?;
    let rewriter = DocumentRewriter::new(MockProvider::working());

    let result = controller()?.run_with(&rewriter, input, None, false).await;

    assert!(result.is_err());
    assert!(!temp_dir.path().join("notes.zh-tw.pdf").exists());
    Ok(())
}

/// Test folder mode over a nested tree
#[tokio::test]
async fn test_run_folder_withNestedPdfs_shouldTranslateEach() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_pdf(temp_dir.path(), "a.pdf")?;
    common::create_test_pdf(temp_dir.path(), "nested/b.pdf")?;
    // Previous output must not be translated again
    common::create_test_pdf(temp_dir.path(), "c.zh-tw.pdf")?;
    let provider = MockProvider::working();
    let rewriter = DocumentRewriter::new(provider.clone());

    let summary = controller()?
        .run_folder(&rewriter, temp_dir.path(), None, false)
        .await?;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.errors, 0);
    assert!(temp_dir.path().join("a.zh-tw.pdf").exists());
    assert!(temp_dir.path().join("nested").join("b.zh-tw.pdf").exists());
    assert_eq!(provider.request_count(), 2);

    // A second run finds the translations and skips both files
    let summary = controller()?
        .run_folder(&rewriter, temp_dir.path(), None, false)
        .await?;
    assert_eq!(summary.skipped, 2);
    Ok(())
}

/// Test that one broken file does not stop the folder
#[tokio::test]
async fn test_run_folder_withBrokenFile_shouldCountError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_pdf(temp_dir.path(), "good.pdf")?;
    common::create_test_file(temp_dir.path(), "broken.pdf", b"not a pdf")?;
    let output_dir = temp_dir.path().join("translated");
    let rewriter = DocumentRewriter::new(MockProvider::working());
    let controller = controller()?;

    let summary = controller
        .run_folder(&rewriter, temp_dir.path(), Some(&output_dir), false)
        .await?;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.errors, 1);
    assert!(output_dir.join("good.zh-tw.pdf").exists());

    let result = controller
        .run_with(&rewriter, temp_dir.path().to_path_buf(), Some(output_dir), true)
        .await;
    assert!(result.is_err());
    Ok(())
}

/// Test that an empty folder is an error
#[tokio::test]
async fn test_run_folder_withoutPdfs_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "readme.txt", b"hello")?;
    let rewriter = DocumentRewriter::new(MockProvider::working());

    let result = controller()?.run_folder(&rewriter, temp_dir.path(), None, false).await;

    assert!(result.is_err());
    Ok(())
}

/// Test that a folder cannot be translated into a single output file
#[tokio::test]
async fn test_run_with_folderAndPdfOutput_shouldFailWithoutWriting() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().join("in");
    common::create_test_pdf(&input_dir, "a.pdf")?;
    common::create_test_pdf(&input_dir, "b.pdf")?;
    let output = temp_dir.path().join("result.pdf");
    let provider = MockProvider::working();
    let rewriter = DocumentRewriter::new(provider.clone());

    let result = controller()?.run_with(&rewriter, input_dir, Some(output.clone()), false).await;

    assert!(result.is_err());
    assert!(!output.exists());
    assert_eq!(provider.request_count(), 0);
    Ok(())
}

/// Test that files with the same name in different subfolders keep separate outputs
#[tokio::test]
async fn test_run_folder_withSameNamesInSubfolders_shouldMirrorSubfolders() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().join("in");
    common::create_test_pdf(&input_dir, "x/doc.pdf")?;
    common::create_test_pdf(&input_dir, "y/doc.pdf")?;
    let output_dir = temp_dir.path().join("out");
    let provider = MockProvider::working();
    let rewriter = DocumentRewriter::new(provider.clone());

    let summary = controller()?
        .run_folder(&rewriter, &input_dir, Some(&output_dir), false)
        .await?;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 0);
    assert!(output_dir.join("x").join("doc.zh-tw.pdf").exists());
    assert!(output_dir.join("y").join("doc.zh-tw.pdf").exists());
    assert_eq!(provider.request_count(), 2);
    Ok(())
}

/// Test that the issues log collects the warnings of every file in a folder
#[tokio::test]
async fn test_run_folder_withFailingProvider_shouldKeepEveryFilesIssues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_pdf(temp_dir.path(), "a.pdf")?;
    common::create_test_pdf(temp_dir.path(), "b.pdf")?;
    let rewriter = DocumentRewriter::new(MockProvider::failing());

    let summary = controller()?
        .run_folder(&rewriter, temp_dir.path(), None, false)
        .await?;

    assert_eq!(summary.processed, 2);
    let log = fs::read_to_string(temp_dir.path().join(ISSUES_LOG_FILE))?;
    assert_eq!(log.matches("Translation failed for 'Hello world'").count(), 2);
    assert!(log.contains("a.pdf"));
    assert!(log.contains("b.pdf"));
    Ok(())
}
