//! `wallet-resolve servers` - show the DNS servers in failover order.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::output::OutputFormat;

pub fn execute(ctx: &Context) -> Result<()> {
    let servers = walletname::configured_servers(&ctx.config)?;

    match ctx.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(servers.as_slice())?),
        OutputFormat::Pretty => {
            for (i, server) in servers.as_slice().iter().enumerate() {
                let role = if i == 0 { "primary" } else { "backup" };
                if ctx.no_color {
                    println!("{server:<24} {role}");
                } else {
                    println!("{:<24} {}", server.to_string().cyan(), role.dimmed());
                }
            }
        }
    }
    Ok(())
}
