/*!
 * # ResxAI - localization resource translation with AI
 *
 * A Rust library for translating `.resx` and flat `.json` localization files
 * through an OpenAI-compatible chat-completion API.
 *
 * ## Features
 *
 * - Size-bounded batching of key/value entries
 * - Sequential dispatch with exponential backoff and cancellation
 * - Positional reconstruction that leaves the rest of a ResX document untouched
 * - A failure ledger with a retry pass for files that could not be translated
 * - ISO 639-1 language code validation
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `formats`: ResX and JSON parsing and write-back
 * - `translation`: The pipeline core:
 *   - `translation::batch`: Greedy size-bounded batching
 *   - `translation::dispatch`: Per-batch requests with retry
 *   - `translation::reconstruct`: Positional key/value mapping
 *   - `translation::prompts`: System instruction
 * - `ledger`: Failure ledger and retry pass
 * - `file_utils`: File system operations and output naming
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Completion backends:
 *   - `providers::openai`: OpenAI-compatible API client
 *   - `providers::mock`: Scripted backend for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod formats;
pub mod language_utils;
pub mod ledger;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, FileOutcome, RunSummary};
pub use errors::{AppError, FormatError, LedgerError, ProviderError, TranslationError};
pub use formats::{Entry, ResourceEntries, ResourceFormat};
pub use language_utils::{get_language_name, validate_language_code};
pub use ledger::{FailureLedger, FailureRecord, RetryOutcome, RetrySummary};
