//! wallet-resolve - resolve wallet names from the command line.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    walletname_cli::run().await
}
