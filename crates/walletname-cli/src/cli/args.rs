//! Command-line argument definitions using clap.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use url::Url;

use crate::output::OutputFormat;

/// Resolve wallet names through DNSSEC-authenticated DNS
///
/// A wallet name publishes its currencies in `_wallet.<name>.` TXT records.
/// Answers are only trusted when the DNS server authenticated them.
#[derive(Parser, Debug)]
#[command(name = "wallet-resolve")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "WALLETNAME_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// DNS server to query; repeat for backups (overrides the configuration)
    #[arg(short = 's', long = "dns-server", global = true)]
    pub dns_servers: Vec<SocketAddr>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a wallet name to an address or payment request
    Resolve(ResolveArgs),

    /// Check an HTTPS endpoint against its TLSA records
    Tlsa(TlsaArgs),

    /// Show the DNS servers that would be queried, primary first
    Servers,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Wallet name (e.g. wallet.example.com)
    pub label: String,

    /// Currency code (e.g. btc)
    #[arg(default_value = "btc")]
    pub currency: String,

    /// Require TLSA validation of indirection endpoints
    #[arg(long)]
    pub verify: bool,
}

#[derive(Args, Debug)]
pub struct TlsaArgs {
    /// HTTPS endpoint to check
    pub url: Url,
}
