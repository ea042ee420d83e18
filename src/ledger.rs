/*!
 * Durable record of failed (file, language) pairs.
 *
 * The ledger is a plain text file with one `path|language` line per failure.
 * Appends happen one complete line at a time; the retry pass replaces the whole
 * file once, atomically, with the records that are still failing. All writes
 * go through a single lock so concurrent file pipelines never interleave lines.
 */

use log::{info, warn};
use parking_lot::Mutex;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::future::Future;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::errors::LedgerError;

/// Ledger file name used when none is configured
pub const DEFAULT_LEDGER_FILE: &str = "failed_translations.log";

const FIELD_SEPARATOR: char = '|';

/// A file that could not be translated into a language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FailureRecord {
    pub path: PathBuf,
    pub language: String,
}

impl FailureRecord {
    pub fn new(path: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language: language.into(),
        }
    }

    /// Serialized form, without the trailing newline
    pub fn to_line(&self) -> String {
        format!("{}{}{}", self.path.display(), FIELD_SEPARATOR, self.language)
    }

    /// Parse one ledger line.
    ///
    /// The language is everything after the last separator, so paths may
    /// themselves contain one. Both fields must be non-empty.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (path, language) = line.rsplit_once(FIELD_SEPARATOR)?;
        let language = language.trim();
        if path.is_empty() || language.is_empty() {
            return None;
        }
        Some(Self::new(path, language))
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path.display(), self.language)
    }
}

/// What happened to one record during a retry pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Translated; the record leaves the ledger
    Succeeded,
    /// Failed again; the record stays
    Failed(String),
    /// Can never succeed (file gone, unsupported); the record leaves the ledger
    Dropped(String),
    /// The run was interrupted; the pass stops and the ledger is left untouched
    Interrupted,
}

/// Result of a retry pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrySummary {
    pub succeeded: Vec<FailureRecord>,
    pub still_failing: Vec<FailureRecord>,
    pub dropped: Vec<FailureRecord>,
    pub interrupted: bool,
}

impl RetrySummary {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.still_failing.len() + self.dropped.len()
    }
}

/// Append-only failure log with a whole-file rewrite for retry passes
#[derive(Debug)]
pub struct FailureLedger {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FailureLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Append one record, creating the ledger if needed
    pub fn record(&self, record: &FailureRecord) -> Result<(), LedgerError> {
        let line = format!("{}\n", record.to_line());

        let _guard = self.lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(line.as_bytes()).map_err(|e| self.io_error(e))?;
        file.sync_data().map_err(|e| self.io_error(e))?;
        Ok(())
    }

    /// All parseable records, in file order. A missing ledger is empty.
    pub fn list_all(&self) -> Result<Vec<FailureRecord>, LedgerError> {
        let content = {
            let _guard = self.lock.lock();
            match fs::read_to_string(&self.path) {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(self.io_error(e)),
            }
        };

        let mut records = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match FailureRecord::parse_line(line) {
                Some(record) => records.push(record),
                None => warn!(
                    "Skipping malformed line {} in {}: {:?}",
                    number + 1,
                    self.path.display(),
                    line
                ),
            }
        }
        Ok(records)
    }

    /// Atomically replace the ledger contents with `records`
    pub fn rewrite(&self, records: &[FailureRecord]) -> Result<(), LedgerError> {
        let content: String = records
            .iter()
            .map(|r| format!("{}\n", r.to_line()))
            .collect();
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let _guard = self.lock.lock();
        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        temp.write_all(content.as_bytes()).map_err(|e| self.io_error(e))?;
        temp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        temp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }

    /// Retry every record in ledger order and keep only the ones that still fail.
    ///
    /// The ledger is rewritten once, after the last record. If `retry` reports
    /// an interruption the pass stops there and the ledger is not touched.
    pub async fn retry_pass<F, Fut>(&self, mut retry: F) -> Result<RetrySummary, LedgerError>
    where
        F: FnMut(FailureRecord) -> Fut,
        Fut: Future<Output = RetryOutcome>,
    {
        let records = self.list_all()?;
        let mut summary = RetrySummary::default();
        if records.is_empty() {
            info!("No failed translations to retry in {}", self.path.display());
            return Ok(summary);
        }

        info!("Retrying {} failed translation(s)", records.len());
        for record in records {
            match retry(record.clone()).await {
                RetryOutcome::Succeeded => {
                    info!("Retry succeeded: {}", record);
                    summary.succeeded.push(record);
                }
                RetryOutcome::Failed(reason) => {
                    warn!("Retry failed: {}: {}", record, reason);
                    summary.still_failing.push(record);
                }
                RetryOutcome::Dropped(reason) => {
                    warn!("Dropping {} from the ledger: {}", record, reason);
                    summary.dropped.push(record);
                }
                RetryOutcome::Interrupted => {
                    warn!("Retry pass interrupted; ledger left unchanged");
                    summary.interrupted = true;
                    return Ok(summary);
                }
            }
        }

        self.rewrite(&summary.still_failing)?;
        Ok(summary)
    }
}
