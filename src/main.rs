// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{info, warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use doctrans::app_config::{self, Config, TranslationBackendKind};
use doctrans::text::{RawText, Sanitizer};
use doctrans::translation::Direction;
use doctrans::Controller;

/// CLI Wrapper for TranslationBackendKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliBackend {
    Google,
    DeepL,
    OpenAI,
    Anthropic,
    Mock,
}

impl From<CliBackend> for TranslationBackendKind {
    fn from(cli_backend: CliBackend) -> Self {
        match cli_backend {
            CliBackend::Google => TranslationBackendKind::Google,
            CliBackend::DeepL => TranslationBackendKind::DeepL,
            CliBackend::OpenAI => TranslationBackendKind::OpenAI,
            CliBackend::Anthropic => TranslationBackendKind::Anthropic,
            CliBackend::Mock => TranslationBackendKind::Mock,
        }
    }
}

/// CLI Wrapper for Direction to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliDirection {
    ZhToFr,
    FrToZh,
    ZhToEn,
    EnToZh,
    EnToFr,
    FrToEn,
}

impl From<CliDirection> for Direction {
    fn from(cli_direction: CliDirection) -> Self {
        match cli_direction {
            CliDirection::ZhToFr => Direction::ZhToFr,
            CliDirection::FrToZh => Direction::FrToZh,
            CliDirection::ZhToEn => Direction::ZhToEn,
            CliDirection::EnToZh => Direction::EnToZh,
            CliDirection::EnToFr => Direction::EnToFr,
            CliDirection::FrToEn => Direction::FrToEn,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate the text of a DXF drawing, or of every drawing in a folder
    Translate(TranslateArgs),

    /// Run the sanitizer on a string and print the result
    Clean {
        /// Text to clean
        text: String,

        /// Print the name of every pass that changed the text
        #[arg(long)]
        trace: bool,
    },

    /// Translate a whole document with the remote document service
    Remote(RemoteArgs),

    /// Generate shell completions for doctrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input drawing or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Output file (single drawing) or directory (folder)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Translation direction
    #[arg(short, long, value_enum)]
    direction: Option<CliDirection>,

    /// Translation backend to use
    #[arg(short, long, value_enum)]
    backend: Option<CliBackend>,

    /// Also translate text inside named block definitions
    #[arg(long)]
    include_blocks: bool,

    /// Use the in-process mock backend, no network access
    #[arg(long)]
    dry_run: bool,

    /// Force overwrite of an existing output file
    #[arg(short, long)]
    force_overwrite: bool,
}

#[derive(Parser, Debug)]
struct RemoteArgs {
    /// Document to upload
    #[arg(value_name = "INPUT_FILE")]
    input_file: PathBuf,

    /// Target language code sent to the service (defaults to the direction's target)
    #[arg(short, long)]
    target_language: Option<String>,

    /// Source language code sent to the service
    #[arg(short, long)]
    source_language: Option<String>,
}

/// doctrans - translate the text of CAD drawings
///
/// Reads DXF drawings, translates every text element between Chinese and
/// French (or English), and writes a new drawing plus a CSV report.
#[derive(Parser, Debug)]
#[command(name = "doctrans")]
#[command(version = "1.0.0")]
#[command(about = "Drawing text translation tool")]
#[command(long_about = "doctrans translates the text elements of DXF drawings and writes a new drawing next to the input.

EXAMPLES:
    doctrans translate plan.dxf                      # Translate using default config
    doctrans translate -d fr-to-zh plan.dxf          # Translate from French to Chinese
    doctrans translate -b deepl plans/               # Process a directory with DeepL
    doctrans translate --dry-run plan.dxf            # Exercise the pipeline without a backend
    doctrans clean --trace 'Caf\u{e9}'               # Show what the sanitizer does
    doctrans remote deck.pptx -t fr                  # Whole-document translation service
    doctrans completions bash > doctrans.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED BACKENDS:
    google    - Public web endpoint (no key)
    deepl     - DeepL API (requires API key)
    openai    - OpenAI API (requires API key)
    anthropic - Anthropic API (requires API key)
    mock      - Echo backend for dry runs")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
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
    // Raised or lowered once the configuration is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();
    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "doctrans", &mut std::io::stdout());
            Ok(())
        }
        Commands::Clean { text, trace } => {
            run_clean(&text, trace);
            Ok(())
        }
        Commands::Translate(args) => {
            let config = load_config(&cli.config_path, cli.log_level.is_some())?;
            run_translate(config, args).await
        }
        Commands::Remote(args) => {
            let config = load_config(&cli.config_path, cli.log_level.is_some())?;
            let controller = Controller::with_config(config)?;
            let output = controller
                .run_remote(args.input_file, args.target_language, args.source_language)
                .await?;
            info!("Success: {}", output.display());
            Ok(())
        }
    }
}

fn load_config(config_path: &str, log_level_from_cli: bool) -> Result<Config> {
    let config = Config::load_or_create(Path::new(config_path))?;
    if !log_level_from_cli {
        log::set_max_level(config.log_level.to_level_filter());
    }
    Ok(config)
}

fn run_clean(text: &str, trace: bool) {
    let sanitizer = Sanitizer::with_debug(trace);
    let (cleaned, passes) = sanitizer.clean_traced(&RawText::from(text));
    println!("{}", cleaned);
    if trace {
        if !passes.changed() {
            info!("No pass changed the text");
        }
        for change in &passes.changes {
            info!("[{}:{}] '{}' -> '{}'", change.round, change.pass, change.before, change.after);
        }
    }
}

async fn run_translate(mut config: Config, options: TranslateArgs) -> Result<()> {
    if let Some(direction) = options.direction {
        config.direction = direction.into();
    }
    if let Some(backend) = options.backend {
        config.translation.backend = backend.into();
    }
    if options.dry_run {
        config.translation.backend = TranslationBackendKind::Mock;
        config.translation.common.cooldown_ms = 0;
    }
    if options.include_blocks {
        config.document.include_blocks = true;
    }

    config.validate()
        .context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;

    if options.input_path.is_file() {
        if let Some(output) = &options.output {
            if output.exists() && !options.force_overwrite {
                warn!("Output file already exists: {:?}. Use -f to force overwrite.", output);
                return Ok(());
            }
        }
        controller.run(options.input_path, options.output).await?;
    } else if options.input_path.is_dir() {
        let summaries = controller.run_folder(options.input_path, options.output).await?;
        for summary in &summaries {
            info!("{} -> {}", summary.input.display(), summary.output.display());
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", options.input_path));
    }

    Ok(())
}
