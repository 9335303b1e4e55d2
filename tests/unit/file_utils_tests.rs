/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::path::Path;
use pdftrans::file_utils::{FileManager, FileType};
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "test_file_exists.tmp", b"test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that generate_output_path creates the correct path
#[test]
fn test_generate_output_path_withValidInputs_shouldCreateCorrectPath() {
    let output_path = FileManager::generate_output_path(
        Path::new("/tmp/input/report.pdf"),
        Path::new("/tmp/output"),
        "zh-tw",
        "pdf",
    );

    assert_eq!(output_path, Path::new("/tmp/output/report.zh-tw.pdf"));
}

/// Test that ensure_dir creates nested directories
#[test]
fn test_ensure_dir_withNonExistentDir_shouldCreateDirectory() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b");

    FileManager::ensure_dir(&nested)?;

    assert!(FileManager::dir_exists(&nested));
    Ok(())
}

/// Test recursive, sorted, case-insensitive file search
#[test]
fn test_find_files_withNestedPdfs_shouldReturnSortedMatches() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "b.pdf", b"%PDF-1.5")?;
    common::create_test_file(temp_dir.path(), "sub/a.PDF", b"%PDF-1.5")?;
    common::create_test_file(temp_dir.path(), "notes.txt", b"text")?;

    let files = FileManager::find_files(temp_dir.path(), ".pdf")?;

    assert_eq!(files.len(), 2);
    assert_eq!(files[0], temp_dir.path().join("b.pdf"));
    assert_eq!(files[1], temp_dir.path().join("sub").join("a.PDF"));
    Ok(())
}

/// Test that write_bytes creates the parent directory
#[test]
fn test_write_bytes_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out").join("doc.pdf");

    FileManager::write_bytes(&path, b"%PDF-1.5")?;

    assert_eq!(FileManager::read_bytes(&path)?, b"%PDF-1.5");
    Ok(())
}

/// Test that append_to_log_file keeps earlier content
#[test]
fn test_append_to_log_file_calledTwice_shouldKeepBothEntries() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("logs").join("issues.log");

    FileManager::append_to_log_file(&path, "first\n")?;
    FileManager::append_to_log_file(&path, "second\n")?;

    assert_eq!(std::fs::read_to_string(&path)?, "first\nsecond\n");
    Ok(())
}

/// Test file type detection by extension and by magic bytes
#[test]
fn test_detect_file_type_shouldRecognizePdfs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let by_extension = common::create_test_file(temp_dir.path(), "doc.pdf", b"anything")?;
    let by_magic = common::create_test_file(temp_dir.path(), "doc.bin", b"%PDF-1.7\n")?;
    let plain = common::create_test_file(temp_dir.path(), "doc.txt", b"hello")?;

    assert_eq!(FileManager::detect_file_type(&by_extension)?, FileType::Pdf);
    assert_eq!(FileManager::detect_file_type(&by_magic)?, FileType::Pdf);
    assert_eq!(FileManager::detect_file_type(&plain)?, FileType::Unknown);
    assert!(FileManager::detect_file_type(temp_dir.path().join("missing.pdf")).is_err());
    Ok(())
}
