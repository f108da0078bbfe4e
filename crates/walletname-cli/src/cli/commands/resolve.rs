//! `wallet-resolve resolve` - resolve a wallet name for one currency.

use anyhow::Result;
use walletname::{WalletNameQuery, WalletNameResolver};

use super::Context;
use crate::cli::args::ResolveArgs;
use crate::output::print_resolution;

pub async fn execute(ctx: Context, args: ResolveArgs) -> Result<()> {
    // Reject an empty label before touching the network.
    let query = WalletNameQuery::new(&args.label, &args.currency, args.verify)?;

    let resolver = WalletNameResolver::new(ctx.config)?;
    let resolution = resolver.resolve_query(&query).await?;

    print_resolution(&resolution, ctx.output_format, ctx.no_color)
}
