//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = crate::config::load(cli.config.as_deref(), &cli.dns_servers)?;

    let ctx = commands::Context {
        config,
        output_format: cli.output.unwrap_or(OutputFormat::Pretty),
        no_color: cli.no_color,
    };

    match cli.command {
        Commands::Resolve(args) => commands::resolve::execute(ctx, args).await,
        Commands::Tlsa(args) => commands::tlsa::execute(ctx, args).await,
        Commands::Servers => commands::servers::execute(&ctx),
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
