use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::errors::{AppError, FormatError, TranslationError};
use crate::file_utils::FileManager;
use crate::formats::ResourceFormat;
use crate::language_utils;
use crate::ledger::{FailureLedger, FailureRecord, RetryOutcome, RetrySummary};
use crate::providers::{OpenAI, Provider};
use crate::translation::{Batcher, Dispatcher, key_divergences, reconstruct};

// @module: Application controller for resource file translation

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Written to the output path with this many translated entries
    Translated(usize),
    /// Source copied unchanged to the output path and recorded in the ledger
    FellBack(String),
}

/// Totals for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub translated: usize,
    pub failed: Vec<PathBuf>,
    pub output: PathBuf,
}

/// Main application controller for resource translation
#[derive(Debug)]
pub struct Controller<P: Provider = OpenAI> {
    // @field: App configuration
    config: Config,
    // @field: Splits a file's entries into requests
    batcher: Batcher,
    // @field: Sends batches to the backend
    dispatcher: Dispatcher<P>,
    // @field: Failed (file, language) pairs
    ledger: FailureLedger,
}

impl Controller<OpenAI> {
    // @method: Create a controller talking to the configured OpenAI-compatible endpoint
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        config.validate()?;
        let provider = OpenAI::new(config.api_key.clone(), config.endpoint.clone(), config.timeout());
        Ok(Self::with_provider(config, provider))
    }
}

impl<P: Provider> Controller<P> {
    // @method: Create a controller around any provider
    pub fn with_provider(config: Config, provider: P) -> Self {
        let dispatcher = Dispatcher::new(provider, config.model.clone(), config.max_output_tokens)
            .with_retry_policy(config.retry_policy());
        Self {
            batcher: Batcher::new(config.max_tokens),
            ledger: FailureLedger::new(config.ledger_path.clone()),
            dispatcher,
            config,
        }
    }

    /// Abort in-flight requests and backoff waits when `token` fires
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.dispatcher = self.dispatcher.with_cancellation(token);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &FailureLedger {
        &self.ledger
    }

    fn is_cancelled(&self) -> bool {
        self.dispatcher.cancellation_token().is_cancelled()
    }

    /// Translate a file or every resource file under a directory
    pub async fn run(&self, input: &Path, language: &str) -> Result<RunSummary, AppError> {
        let language = language_utils::validate_language_code(language)
            .map_err(|e| AppError::Config(e.to_string()))?;

        if input.is_dir() {
            self.run_folder(input, &language).await
        } else if input.is_file() {
            self.run_file(input, &language).await
        } else {
            Err(AppError::Config(format!("Input path does not exist: {:?}", input)))
        }
    }

    /// Translate one file into a sibling `<stem>.<lang>.<ext>` file
    pub async fn run_file(&self, input_file: &Path, language: &str) -> Result<RunSummary, AppError> {
        if ResourceFormat::from_path(input_file).is_none() {
            return Err(AppError::Config(format!(
                "Unsupported input file (expected .resx or .json): {:?}",
                input_file
            )));
        }
        let output = FileManager::output_path_for(input_file, language)
            .map_err(|e| AppError::File(e.to_string()))?;

        let mut summary = RunSummary {
            output: output.clone(),
            ..RunSummary::default()
        };
        match self.translate_and_save(input_file, &output, language).await? {
            FileOutcome::Translated(_) => summary.translated += 1,
            FileOutcome::FellBack(_) => summary.failed.push(output),
        }
        Ok(summary)
    }

    /// Translate every .resx and .json file under `input_dir` into `<input_dir>_<lang>`
    pub async fn run_folder(&self, input_dir: &Path, language: &str) -> Result<RunSummary, AppError> {
        let start_time = Instant::now();

        let files = FileManager::find_resource_files(input_dir).map_err(|e| AppError::File(e.to_string()))?;
        let output_root =
            FileManager::output_dir_for(input_dir, language).map_err(|e| AppError::File(e.to_string()))?;
        let mut summary = RunSummary {
            output: output_root.clone(),
            ..RunSummary::default()
        };

        if files.is_empty() {
            warn!("No .resx or .json files found in {:?}", input_dir);
            return Ok(summary);
        }

        let mut jobs = Vec::with_capacity(files.len());
        for source in files {
            let output = FileManager::mirrored_output_path(&source, input_dir, &output_root, language)
                .map_err(|e| AppError::File(e.to_string()))?;
            jobs.push((source, output));
        }
        info!(
            "Translating {} file(s) from {:?} into {:?}",
            jobs.len(),
            input_dir,
            output_root
        );

        let progress_bar = ProgressBar::new(jobs.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating files");

        let concurrency = self.config.concurrent_files.max(1);
        let results: Vec<(PathBuf, Result<FileOutcome, AppError>)> = stream::iter(jobs)
            .map(|(source, output)| {
                let progress_bar = &progress_bar;
                async move {
                    let result = if self.is_cancelled() {
                        let cancelled = AppError::Translation(TranslationError::Cancelled);
                        self.fall_back(&source, &output, language, cancelled)
                    } else {
                        progress_bar.set_message(display_name(&source));
                        self.translate_and_save(&source, &output, language).await
                    };
                    progress_bar.inc(1);
                    (output, result)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut fatal = None;
        for (output, result) in results {
            match result {
                Ok(FileOutcome::Translated(_)) => summary.translated += 1,
                Ok(FileOutcome::FellBack(_)) => summary.failed.push(output),
                Err(e) if fatal.is_none() => fatal = Some(e),
                Err(e) => debug!("Further run-level error: {}", e),
            }
        }

        progress_bar.finish_with_message("Folder processing complete");
        info!(
            "Folder processing completed in {}: {} translated, {} failed",
            format_duration(start_time.elapsed()),
            summary.translated,
            summary.failed.len()
        );

        match fatal {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    /// Translate `source` into `output`, falling back to an untranslated copy.
    ///
    /// A failed file is recorded in the ledger under its output path and the
    /// source is copied there unchanged. Only run-level failures are returned as
    /// errors; a cancellation still leaves the fallback copy behind.
    pub async fn translate_and_save(
        &self,
        source: &Path,
        output: &Path,
        language: &str,
    ) -> Result<FileOutcome, AppError> {
        match self.translate_file(source, output, language).await {
            Ok(count) => {
                info!("Translated {} entries: {:?}", count, output);
                Ok(FileOutcome::Translated(count))
            }
            Err(e) => {
                error!("Translation failed for {:?}: {}", source, e);
                self.fall_back(source, output, language, e)
            }
        }
    }

    /// Copy `source` to `output` unchanged and record the pair in the ledger.
    ///
    /// The copy always happens first so the output exists even when the
    /// ledger cannot be written.
    fn fall_back(
        &self,
        source: &Path,
        output: &Path,
        language: &str,
        error: AppError,
    ) -> Result<FileOutcome, AppError> {
        if let Err(copy_error) = FileManager::copy_file(source, output) {
            error!("Failed to copy untranslated {:?} to {:?}: {}", source, output, copy_error);
        }
        self.ledger.record(&FailureRecord::new(output, language))?;

        if error.is_fatal_for_run() {
            return Err(error);
        }
        Ok(FileOutcome::FellBack(error.to_string()))
    }

    /// Run the full pipeline for one file with no fallback: parse, batch,
    /// dispatch, reconstruct, write. Returns the number of translated entries.
    pub async fn translate_file(&self, source: &Path, output: &Path, language: &str) -> Result<usize, AppError> {
        let format = ResourceFormat::from_path(source)
            .ok_or_else(|| AppError::Format(FormatError::Unsupported(source.to_path_buf())))?;

        let entries = format.parse(source)?;
        let batches = self.batcher.batch(&entries);
        debug!("{:?}: {} entries in {} batch(es)", source, entries.len(), batches.len());

        let translated = self.dispatcher.translate_batches(&batches, language).await?;

        let keys = entries.keys();
        for divergence in key_divergences(&keys, &translated) {
            warn!(
                "{:?}: entry {} came back as '{}' instead of '{}'",
                source, divergence.position, divergence.returned, divergence.expected
            );
        }

        let mapping = reconstruct(&keys, &translated);
        if mapping.len() < entries.len() {
            warn!(
                "{:?}: only {} of {} entries were translated",
                source,
                mapping.len(),
                entries.len()
            );
        }

        if let Some(parent) = output.parent() {
            FileManager::ensure_dir(parent).map_err(|e| AppError::File(e.to_string()))?;
        }
        format.reconstruct(source, &mapping, output)?;
        Ok(mapping.len())
    }

    /// Re-run every ledger record in place and keep only the ones still failing
    pub async fn retry_failed(&self) -> Result<RetrySummary, AppError> {
        let summary = self
            .ledger
            .retry_pass(move |record| self.retry_record(record))
            .await?;

        info!(
            "Retry pass: {} succeeded, {} still failing, {} dropped",
            summary.succeeded.len(),
            summary.still_failing.len(),
            summary.dropped.len()
        );
        if summary.interrupted {
            return Err(AppError::Translation(TranslationError::Cancelled));
        }
        Ok(summary)
    }

    async fn retry_record(&self, record: FailureRecord) -> RetryOutcome {
        if self.is_cancelled() {
            return RetryOutcome::Interrupted;
        }
        if !FileManager::file_exists(&record.path) {
            return RetryOutcome::Dropped("file does not exist".to_string());
        }
        if ResourceFormat::from_path(&record.path).is_none() {
            return RetryOutcome::Dropped("unsupported file type".to_string());
        }
        let language = match language_utils::validate_language_code(&record.language) {
            Ok(language) => language,
            Err(e) => return RetryOutcome::Dropped(e.to_string()),
        };

        match self.translate_file(&record.path, &record.path, &language).await {
            Ok(_) => RetryOutcome::Succeeded,
            Err(AppError::Translation(TranslationError::Cancelled)) => RetryOutcome::Interrupted,
            Err(e) => RetryOutcome::Failed(e.to_string()),
        }
    }

    /// Log every record in the ledger; returns how many there are
    pub fn report_failures(&self) -> Result<usize, AppError> {
        let records = self.ledger.list_all()?;
        if records.is_empty() {
            return Ok(0);
        }

        warn!("{} translation(s) failed:", records.len());
        for record in &records {
            warn!("  {}", record);
        }
        warn!(
            "Failed files were copied untranslated and recorded in {:?}. Re-run with --retry to translate them again.",
            self.ledger.path()
        );
        Ok(records.len())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:01}s", seconds, duration.subsec_millis() / 100)
    }
}
