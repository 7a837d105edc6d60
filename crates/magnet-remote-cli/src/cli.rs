//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use magnet_remote_config::{ProtocolKind, resolve_config_dir};
use magnet_remote_telemetry::{LogFormat, LoggingConfig, init_logging};

use crate::client::{CliContext, CliResult, config_error};
use crate::commands::config::{handle_config_set, handle_config_show};
use crate::commands::daemon::{handle_send, handle_test};
use crate::commands::history::{handle_history_clear, handle_history_list};

/// Filter applied when `RUST_LOG` is unset; command output stays uncluttered.
const CLI_LOG_LEVEL: &str = "warn";

/// Parses CLI arguments and executes the requested command. Returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    init_cli_logging(cli.log_format);

    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn init_cli_logging(format: LogFormat) {
    let config = LoggingConfig {
        level: CLI_LOG_LEVEL,
        format,
        ..LoggingConfig::default()
    };
    if let Err(err) = init_logging(&config) {
        eprintln!("warning: logging unavailable: {err}");
    }
}

pub(crate) async fn dispatch(cli: Cli) -> CliResult<()> {
    let config_dir = resolve_config_dir(cli.config_dir).map_err(config_error)?;
    let ctx = CliContext::open(&config_dir, cli.output)?;

    match cli.command {
        Command::Send(args) => handle_send(&ctx, args).await,
        Command::Test => handle_test(&ctx).await,
        Command::Config(config) => match config {
            ConfigCommand::Show => handle_config_show(&ctx).await,
            ConfigCommand::Set(args) => handle_config_set(&ctx, args).await,
        },
        Command::History(history) => match history {
            HistoryCommand::List => handle_history_list(&ctx),
            HistoryCommand::Clear => handle_history_clear(&ctx),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "magnet-remote",
    about = "Send magnet links to a remote torrent daemon"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        help = "Directory holding settings.json and recent_magnets.json"
    )]
    pub(crate) config_dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "MAGNET_REMOTE_LOG_FORMAT",
        default_value = "auto",
        value_parser = parse_log_format,
        help = "Log output format: json, pretty, or auto"
    )]
    pub(crate) log_format: LogFormat,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    #[command(about = "Send a magnet link to the configured daemon")]
    Send(SendArgs),
    #[command(about = "Check that the configured daemon accepts the credentials")]
    Test,
    #[command(subcommand, about = "Inspect or change the daemon profile")]
    Config(ConfigCommand),
    #[command(subcommand, about = "Inspect or clear recently sent magnets")]
    History(HistoryCommand),
}

#[derive(Args)]
pub(crate) struct SendArgs {
    #[arg(help = "Magnet URI (must start with magnet:)")]
    pub(crate) magnet: String,
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommand {
    Show,
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub(crate) struct ConfigSetArgs {
    #[arg(long, value_parser = parse_protocol)]
    pub(crate) protocol: ProtocolKind,
    #[arg(long, help = "Hostname or IP address, without scheme or path")]
    pub(crate) host: String,
    #[arg(long, help = "Defaults to the protocol's standard port")]
    pub(crate) port: Option<u16>,
    #[arg(long, help = "Connect over HTTPS")]
    pub(crate) tls: bool,
    #[arg(long)]
    pub(crate) username: Option<String>,
    #[arg(long, value_enum)]
    pub(crate) notifications: Option<Switch>,
}

#[derive(Subcommand)]
pub(crate) enum HistoryCommand {
    List,
    Clear,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Switch {
    On,
    Off,
}

impl Switch {
    pub(crate) const fn enabled(self) -> bool {
        matches!(self, Self::On)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn parse_protocol(value: &str) -> Result<ProtocolKind, String> {
    value.parse().map_err(|_| {
        let known: Vec<&str> = ProtocolKind::ALL.iter().map(|kind| kind.as_str()).collect();
        format!("expected one of: {}", known.join(", "))
    })
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value
        .parse()
        .map_err(|_| "expected json, pretty, or auto".to_string())
}
