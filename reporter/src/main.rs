//! CLI entry point for the DEGIRO reporter.

use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use degiro_broker::DegiroClient;
use degiro_broker::http::HttpTransport;
use degiro_broker::Session;
use degiro_reporter::commands::{self, Command};
use degiro_reporter::config::Config;
use degiro_reporter::credentials::{self, USAGE};
use degiro_reporter::error::Result;

#[derive(Parser)]
#[command(name = "degiro")]
#[command(about = "Portfolio, product and price reports for a DEGIRO account")]
#[command(override_usage = USAGE)]
#[command(version)]
struct Cli {
    /// Path to config.toml (built-in defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Credentials file or USERNAME PASSWORD, then the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    args: Vec<String>,
}

/// The command part of the arguments, after the credentials.
#[derive(Parser)]
#[command(name = "degiro", no_binary_name = true)]
struct Invocation {
    #[command(subcommand)]
    command: Command,
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load_or_default(cli.config.as_deref())?;
    let (source, rest) = credentials::split_args(&cli.args)?;
    let command = match Invocation::try_parse_from(rest) {
        Ok(invocation) => invocation.command,
        Err(e) => e.exit(),
    };
    let credentials = credentials::resolve(source, credentials::prompt_password)?;

    let transport = HttpTransport::new(config.timeout())?;
    let client = DegiroClient::new(transport, config.endpoints());
    let mut stdout = io::stdout().lock();
    Session::scoped(client, &credentials, |session| {
        commands::execute(session, &config, &command, &mut stdout)
    })
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(e.exit_code());
    }
}
