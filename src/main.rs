/*!
 * modelvault CLI
 *
 * Reconciles an Ollama models directory against its manifests and prints
 * the result as tables or JSON. Never modifies the store.
 */

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::generate;
use modelvault::{
    cli_style,
    config::{LogLevel, VaultConfig},
    core::{reconcile, reconcile_model, ReconcileOptions, ReconcileReport},
    error::{Result, VaultError, EXIT_INTEGRITY, EXIT_PARTIAL, EXIT_SUCCESS},
    logging,
    output::OutputWriter,
    LocalSystem, ModelRef,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "modelvault")]
#[command(version, about = "Check Ollama model manifests against the blob store", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level (overrides the config file)
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Path to log file, written as JSON (default: stderr)
    #[arg(long = "log", value_name = "FILE", global = true)]
    log: Option<PathBuf>,

    /// Verbose logging (debug level)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Human-readable sizes (e.g. 4.34 GB)
    #[arg(short = 'H', long = "human-readable", global = true)]
    human_readable: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct StoreArgs {
    /// Ollama models directory (default: $OLLAMA_MODELS or ~/.ollama/models)
    #[arg(short = 's', long = "store", value_name = "PATH")]
    store: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every blob as present, missing, size-mismatched or orphaned
    Reconcile {
        #[command(flatten)]
        store: StoreArgs,

        /// Also hash present blobs and compare against their digest
        #[arg(long)]
        verify: bool,

        /// Exit with code 3 if any referenced blob is missing or damaged
        #[arg(long)]
        check: bool,
    },

    /// List installed models with size and completeness
    Models {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Show one model's layers and their status
    Show {
        /// Model reference (`llama3`, `llama3:8b`, `user/model:tag`)
        model: String,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    fn json(&self) -> bool {
        match self {
            Commands::Reconcile { store, .. }
            | Commands::Models { store }
            | Commands::Show { store, .. } => store.json,
            Commands::Completions { .. } => false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            OutputWriter::new(cli.command.json(), false).error(&e);
            std::process::exit(e.exit_code());
        }
    };
    let output = OutputWriter::new(cli.command.json(), config.human_readable);

    let code = match run(cli.command, &config, &output) {
        Ok(code) => code,
        Err(e) => {
            output.error(&e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

/// Config file (if any) with CLI flags applied on top
fn load_config(cli: &Cli) -> Result<VaultConfig> {
    let mut config = match cli.config {
        Some(ref path) => VaultConfig::from_file(path)?,
        None => VaultConfig::default(),
    };

    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    if cli.log.is_some() {
        config.log_file = cli.log.clone();
    }
    config.verbose |= cli.verbose;
    config.human_readable |= cli.human_readable;
    Ok(config)
}

fn run(command: Commands, config: &VaultConfig, output: &OutputWriter) -> Result<i32> {
    if !matches!(command, Commands::Completions { .. }) {
        if let Err(e) = logging::init_logging(config) {
            cli_style::print_warning(&format!("Failed to initialize logging: {}", e));
        }
    }

    match command {
        Commands::Reconcile {
            store,
            verify,
            check,
        } => {
            let mut options = ReconcileOptions::from(config);
            options.verify_digests |= verify;
            let report = run_pass(config, &store, &options)?;
            output.report(&report);
            Ok(reconcile_exit_code(&report, check))
        }
        Commands::Models { store } => {
            let report = run_pass(config, &store, &ReconcileOptions::from(config))?;
            output.models(&report.models);
            Ok(partial_exit_code(&report))
        }
        Commands::Show { model, store } => {
            let model = ModelRef::parse(&model).map_err(VaultError::from)?;
            let root = config.resolve_store_root(store.store.as_deref())?;
            let (_, summary) = reconcile_model(
                &LocalSystem::new(),
                &root,
                &model,
                &ReconcileOptions::from(config),
            )?;
            output.model(&summary);
            Ok(EXIT_SUCCESS)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "modelvault", &mut std::io::stdout());
            Ok(EXIT_SUCCESS)
        }
    }
}

fn run_pass(
    config: &VaultConfig,
    store: &StoreArgs,
    options: &ReconcileOptions,
) -> Result<ReconcileReport> {
    let root = config.resolve_store_root(store.store.as_deref())?;
    reconcile(&LocalSystem::new(), &root, options)
}

/// 3 for integrity problems under `--check`, otherwise as `partial_exit_code`
fn reconcile_exit_code(report: &ReconcileReport, check: bool) -> i32 {
    if check && report.has_integrity_problems() {
        EXIT_INTEGRITY
    } else {
        partial_exit_code(report)
    }
}

/// 1 when manifests were skipped or entries could not be read
fn partial_exit_code(report: &ReconcileReport) -> i32 {
    if report.is_partial() {
        EXIT_PARTIAL
    } else {
        EXIT_SUCCESS
    }
}
