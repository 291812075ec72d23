pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use commands::agents::AgentsCommand;
use commands::evaluate::EvaluateArgs;
use commands::guidelines::GuidelinesCommand;
use commands::services::ServicesCommand;
use commands::{connect, load_config, CommandResult};
use parlant_console_client::ConsoleClient;
use parlant_console_core::config::{
    AppConfig, ConfigOverrides, LoadOptions, LogFormat, LoggingConfig,
};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(
    name = "parlant-console",
    about = "Parlant operator console",
    long_about = "Manage agents, guidelines and tool services of a Parlant backend, and evaluate new guidelines before committing them.",
    after_help = "Examples:\n  parlant-console doctor --json\n  parlant-console agents list\n  parlant-console evaluate --agent ag_1 --condition \"user asks for refund\" --action \"offer store credit\" --commit"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    #[arg(long, global = true, value_name = "PATH", help = "Explicit config file path")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "URL", help = "Override api.base_url")]
    pub api_url: Option<String>,
    #[arg(long, global = true, value_name = "LEVEL", help = "Override logging.level")]
    pub log_level: Option<String>,
    #[arg(long, global = true, value_name = "FORMAT", help = "compact, pretty or json")]
    pub log_format: Option<LogFormat>,
}

impl GlobalArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                api_base_url: self.api_url.clone(),
                log_level: self.log_level.clone(),
                log_format: self.log_format,
                ..ConfigOverrides::default()
            },
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and check that the backend answers")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(subcommand, about = "Manage agents")]
    Agents(AgentsCommand),
    #[command(subcommand, about = "Inspect and edit guidelines of an agent")]
    Guidelines(GuidelinesCommand),
    #[command(about = "Evaluate a new guideline and optionally commit it")]
    Evaluate(EvaluateArgs),
    #[command(subcommand, about = "Manage tool services")]
    Services(ServicesCommand),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime.block_on(execute(cli)),
        Err(error) => CommandResult::failure(
            "runtime",
            "runtime",
            format!("failed to initialize async runtime: {error}"),
            1,
        ),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

pub async fn execute(cli: Cli) -> CommandResult {
    let options = cli.global.load_options();

    match cli.command {
        Command::Config => commands::config::run(options),
        Command::Doctor { json } => commands::doctor::run(options, json).await,
        Command::Agents(command) => match prepare("agents", options) {
            Ok((_, client)) => commands::agents::run(client, command).await,
            Err(failure) => failure,
        },
        Command::Guidelines(command) => match prepare("guidelines", options) {
            Ok((_, client)) => commands::guidelines::run(client, command).await,
            Err(failure) => failure,
        },
        Command::Evaluate(args) => match prepare("evaluate", options) {
            Ok((config, client)) => commands::evaluate::run(client, &config, args).await,
            Err(failure) => failure,
        },
        Command::Services(command) => match prepare("services", options) {
            Ok((_, client)) => commands::services::run(client, command).await,
            Err(failure) => failure,
        },
    }
}

fn prepare(
    command: &str,
    options: LoadOptions,
) -> Result<(AppConfig, ConsoleClient), CommandResult> {
    let config = load_config(command, options)?;
    init_logging(&config.logging);
    let client = connect(command, &config)?;
    Ok((config, client))
}

/// Logs go to stderr so stdout carries only command output.
fn init_logging(logging: &LoggingConfig) {
    let log_level = logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(log_level);

    // A subscriber may already be installed when commands run in-process.
    let _ = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
