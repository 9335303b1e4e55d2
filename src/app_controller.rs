use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::file_utils::{FileManager, FileType};
use crate::providers::Provider;
use crate::rewriter::{DocumentRewriter, RewriteOutput, RewriteReport};
use crate::translation::TranslationService;

// @module: Application controller for PDF translation

/// Name of the file collecting per-run warnings
pub const ISSUES_LOG_FILE: &str = "pdftrans.issues.log";

/// Outcome of processing one input file
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// The document was rewritten and saved
    Translated {
        output_path: PathBuf,
        report: RewriteReport,
    },
    /// A translation already existed and overwriting was not requested
    Skipped { output_path: PathBuf },
}

/// Totals for a folder run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Main application controller for PDF translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run with the configured translation provider.
    ///
    /// `input` may be a PDF file or a directory. For a file, `output` is a file
    /// path when it ends in `.pdf`, otherwise a directory; for a directory it
    /// must be a directory.
    pub async fn run(&self, input: PathBuf, output: Option<PathBuf>, force_overwrite: bool) -> Result<()> {
        let service = TranslationService::new(self.config.translation.clone())?;
        info!(
            "Provider: {} - {}",
            self.config.translation.provider.display_name(),
            self.config.translation.get_model()
        );
        let rewriter = DocumentRewriter::new(service);
        self.run_with(&rewriter, input, output, force_overwrite).await
    }

    /// Run with an explicit rewriter
    pub async fn run_with<P: Provider>(
        &self,
        rewriter: &DocumentRewriter<P>,
        input: PathBuf,
        output: Option<PathBuf>,
        force_overwrite: bool,
    ) -> Result<()> {
        if FileManager::dir_exists(&input) {
            let summary = self.run_folder(rewriter, &input, output.as_deref(), force_overwrite).await?;
            if summary.errors > 0 {
                return Err(anyhow!("{} file(s) failed to translate", summary.errors));
            }
            return Ok(());
        }

        let output_path = self.output_path_for(&input, output.as_deref());
        let multi_progress = MultiProgress::new();
        self.run_file(rewriter, &input, &output_path, force_overwrite, &multi_progress)
            .await
            .map(|_| ())
    }

    /// Work out where the translation of `input_file` is written
    pub fn output_path_for(&self, input_file: &Path, output: Option<&Path>) -> PathBuf {
        let target = &self.config.target_language;
        match output {
            Some(path) if Self::is_pdf_path(path) => path.to_path_buf(),
            Some(dir) => FileManager::generate_output_path(input_file, dir, target, "pdf"),
            None => {
                let dir = input_file.parent().unwrap_or_else(|| Path::new(""));
                FileManager::generate_output_path(input_file, dir, target, "pdf")
            }
        }
    }

    /// Output path of a file found under `input_dir`; its subfolder is kept
    /// below `output_dir`
    pub fn folder_output_path(&self, input_dir: &Path, input_file: &Path, output_dir: Option<&Path>) -> PathBuf {
        let Some(output_dir) = output_dir else {
            return self.output_path_for(input_file, None);
        };
        let relative = input_file
            .parent()
            .and_then(|parent| parent.strip_prefix(input_dir).ok())
            .unwrap_or_else(|| Path::new(""));
        FileManager::generate_output_path(input_file, output_dir.join(relative), &self.config.target_language, "pdf")
    }

    /// Translate a single PDF file
    pub async fn run_file<P: Provider>(
        &self,
        rewriter: &DocumentRewriter<P>,
        input_file: &Path,
        output_path: &Path,
        force_overwrite: bool,
        multi_progress: &MultiProgress,
    ) -> Result<FileOutcome> {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        if output_path.exists() && !force_overwrite {
            warn!("Skipping file, translation already exists (use -f to force overwrite): {}", output_path.display());
            return Ok(FileOutcome::Skipped {
                output_path: output_path.to_path_buf(),
            });
        }

        if FileManager::detect_file_type(input_file)? != FileType::Pdf {
            warn!("Input does not look like a PDF, trying anyway: {}", input_file.display());
        }

        let bytes = FileManager::read_bytes(input_file)?;

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        progress_bar.set_style(Self::bar_style("pages"));
        progress_bar.set_message(Self::display_name(input_file));

        let pb = progress_bar.clone();
        let result = rewriter
            .rewrite_with_progress(
                &bytes,
                &self.config.source_language,
                &self.config.target_language,
                move |done, total| {
                    pb.set_length(total as u64);
                    pb.set_position(done as u64);
                },
            )
            .await;
        progress_bar.finish_and_clear();

        let RewriteOutput { bytes, report } =
            result.with_context(|| format!("Failed to translate {}", input_file.display()))?;

        FileManager::write_bytes(output_path, &bytes)?;

        if !report.warnings.is_empty() {
            info!("Translation completed with {} warning(s).", report.warnings.len());
            let log_dir = output_path.parent().unwrap_or_else(|| Path::new(""));
            let context = format!(
                "{} ({})",
                input_file.display(),
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            );
            if let Err(e) = self.write_logs_to_file(&report.warnings, &log_dir.join(ISSUES_LOG_FILE), &context) {
                warn!("Failed to write logs to file: {}", e);
            }
        }

        info!(
            "Success: {} ({} line(s) on {} page(s) in {})",
            output_path.display(),
            report.lines_translated,
            report.pages,
            Self::format_duration(start_time.elapsed())
        );

        Ok(FileOutcome::Translated {
            output_path: output_path.to_path_buf(),
            report,
        })
    }

    /// Translate every PDF under a directory, recursively.
    /// Files that already carry the target language suffix are left alone.
    pub async fn run_folder<P: Provider>(
        &self,
        rewriter: &DocumentRewriter<P>,
        input_dir: &Path,
        output_dir: Option<&Path>,
        force_overwrite: bool,
    ) -> Result<FolderSummary> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        if let Some(output) = output_dir.filter(|path| Self::is_pdf_path(path)) {
            return Err(anyhow!(
                "Output must be a directory when translating a folder, got file path: {:?}",
                output
            ));
        }

        let suffix = format!(".{}", self.config.target_language.to_lowercase());
        let pdf_files: Vec<PathBuf> = FileManager::find_files(input_dir, "pdf")?
            .into_iter()
            .filter(|path| {
                !path
                    .file_stem()
                    .is_some_and(|stem| stem.to_string_lossy().to_lowercase().ends_with(&suffix))
            })
            .collect();

        if pdf_files.is_empty() {
            return Err(anyhow!("No PDF files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(pdf_files.len() as u64));
        folder_pb.set_style(Self::bar_style("files"));
        folder_pb.set_message("Processing files");

        let mut summary = FolderSummary::default();

        for pdf_file in &pdf_files {
            let file_name = Self::display_name(pdf_file);
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_path = self.folder_output_path(input_dir, pdf_file, output_dir);
            match self
                .run_file(rewriter, pdf_file, &output_path, force_overwrite, &multi_progress)
                .await
            {
                Ok(FileOutcome::Translated { .. }) => summary.processed += 1,
                Ok(FileOutcome::Skipped { .. }) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    summary.errors += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        info!(
            "Folder processing completed: {} processed, {} skipped, {} errors in {}",
            summary.processed,
            summary.skipped,
            summary.errors,
            Self::format_duration(start_time.elapsed())
        );

        Ok(summary)
    }

    /// Append translation warnings to a log file shared by every run in its directory
    fn write_logs_to_file(&self, warnings: &[String], file_path: &Path, translation_context: &str) -> Result<()> {
        let mut log_content = String::new();

        log_content.push_str(&format!(
            "Translation Log - {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        log_content.push_str(&format!("Context: {}\n\n", translation_context));

        for warning in warnings {
            log_content.push_str(&format!("[WARN] {}\n", warning));
        }
        log_content.push('\n');

        FileManager::append_to_log_file(file_path, &log_content)
    }

    fn bar_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }

    fn display_name(path: &Path) -> String {
        path.file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn is_pdf_path(path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
