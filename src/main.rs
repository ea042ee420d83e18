// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use resxai::app_config::{Config, LogLevel};
use resxai::app_controller::Controller;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for resxai
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// ResxAI - localization resource translation with AI
///
/// Translates .resx and flat .json resource files through an
/// OpenAI-compatible chat-completion API.
#[derive(Parser, Debug)]
#[command(name = "resxai")]
#[command(version)]
#[command(about = "AI-powered .resx / .json resource translation tool")]
#[command(subcommand_negates_reqs = true)]
#[command(long_about = "ResxAI translates .resx and flat .json localization files using an OpenAI-compatible API.

EXAMPLES:
    resxai -i Strings.resx -l fr -m gpt-4o-mini          # Writes Strings.fr.resx
    resxai -i ./Resources -l de -m gpt-4o-mini           # Mirrors into ./Resources_de
    resxai -i i18n/app.en.json -l es                     # Writes i18n/app.es.json
    resxai --retry                                       # Retry files recorded as failed
    resxai completions bash > resxai.bash                # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. Command line flags override the file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input .resx/.json file or directory to translate
    #[arg(short, long, value_name = "PATH", required_unless_present = "retry")]
    input: Option<PathBuf>,

    /// Target language code (e.g., 'fr', 'de', 'pt-BR')
    #[arg(short, long, required_unless_present = "retry")]
    language: Option<String>,

    /// API key for the completion endpoint
    #[arg(short = 'k', long = "apikey", env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Retry the files recorded in the failure ledger instead of translating new input
    #[arg(long, conflicts_with_all = ["input", "language"])]
    retry: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config: PathBuf,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // The level is updated after loading the config
    CustomLogger::init(LevelFilter::Info)?;

    // Usage errors exit with 1; --help and --version exit with 0
    let cli = match CommandLineOptions::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "resxai", &mut std::io::stdout());
        return Ok(());
    }

    run_translate(cli).await
}

async fn run_translate(options: CommandLineOptions) -> Result<()> {
    if let Some(level) = options.log_level {
        log::set_max_level(LogLevel::from(level).to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config)?;

    // Override config with CLI options if provided
    if let Some(api_key) = options.api_key {
        config.api_key = api_key;
    }
    if let Some(model) = options.model {
        config.model = model;
    }
    if let Some(level) = options.log_level {
        config.log_level = level.into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current request");
            signal_token.cancel();
        }
    });

    let controller = Controller::with_config(config)
        .context("Configuration validation failed")?
        .with_cancellation(cancel);

    let outcome = if options.retry {
        controller.retry_failed().await.map(|summary| {
            info!(
                "Retried {} file(s): {} now translated",
                summary.attempted(),
                summary.succeeded.len()
            );
        })
    } else {
        // Both are present unless --retry, which clap enforces
        let input = options.input.unwrap_or_default();
        let language = options.language.unwrap_or_default();
        controller.run(&input, &language).await.map(|summary| {
            info!(
                "{} file(s) translated, {} failed. Output: {:?}",
                summary.translated,
                summary.failed.len(),
                summary.output
            );
        })
    };

    if let Err(e) = controller.report_failures() {
        error!("Could not read the failure ledger: {}", e);
    }
    outcome.map_err(anyhow::Error::from)
}
