/*!
 * Tests for controller helpers
 */

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use pdftrans::app_config::{Config, TranslationProvider};
use pdftrans::app_controller::Controller;

/// Test that an invalid configuration is rejected up front
#[test]
fn test_with_config_withInvalidLanguage_shouldFail() {
    let mut config = Config::default();
    config.source_language = "notalanguage".to_string();

    assert!(Controller::with_config(config).is_err());
}

/// Test that an Anthropic config without key is rejected
#[test]
fn test_with_config_withMissingApiKey_shouldFail() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Anthropic;

    assert!(Controller::with_config(config).is_err());
}

/// Test the default output location next to the input
#[test]
fn test_output_path_for_withoutOutput_shouldWriteNextToInput() -> Result<()> {
    let controller = Controller::with_config(Config::default())?;
    let path = controller.output_path_for(Path::new("/docs/report.pdf"), None);

    assert_eq!(path, PathBuf::from("/docs/report.zh-tw.pdf"));
    Ok(())
}

/// Test an explicit output directory
#[test]
fn test_output_path_for_withDirectory_shouldJoinTranslatedName() -> Result<()> {
    let controller = Controller::with_config(Config::default())?;
    let path = controller.output_path_for(Path::new("/docs/report.pdf"), Some(Path::new("/out")));

    assert_eq!(path, PathBuf::from("/out/report.zh-tw.pdf"));
    Ok(())
}

/// Test an explicit output file
#[test]
fn test_output_path_for_withPdfPath_shouldUseItAsIs() -> Result<()> {
    let controller = Controller::with_config(Config::default())?;
    let path = controller.output_path_for(Path::new("/docs/report.pdf"), Some(Path::new("/out/final.PDF")));

    assert_eq!(path, PathBuf::from("/out/final.PDF"));
    Ok(())
}

/// Test that folder outputs keep the input's subfolder
#[test]
fn test_folder_output_path_withOutputDir_shouldKeepRelativeSubfolder() -> Result<()> {
    let controller = Controller::with_config(Config::default())?;
    let input_dir = Path::new("/data/in");
    let file = input_dir.join("reports").join("q1.pdf");

    assert_eq!(
        controller.folder_output_path(input_dir, &file, Some(Path::new("/data/out"))),
        PathBuf::from("/data/out/reports/q1.zh-tw.pdf")
    );
    assert_eq!(
        controller.folder_output_path(input_dir, &file, None),
        PathBuf::from("/data/in/reports/q1.zh-tw.pdf")
    );
    Ok(())
}

/// Test duration formatting
#[test]
fn test_format_duration_shouldPickUnits() {
    assert_eq!(Controller::format_duration(Duration::from_millis(1500)), "1.500s");
    assert_eq!(Controller::format_duration(Duration::from_secs(125)), "2m 5s");
    assert_eq!(Controller::format_duration(Duration::from_secs(3725)), "1h 2m 5s");
}
