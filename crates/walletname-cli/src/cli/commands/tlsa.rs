//! `wallet-resolve tlsa` - check an endpoint against its TLSA records.

use std::sync::Arc;

use anyhow::{bail, Result};
use colored::Colorize;
use serde_json::json;
use walletname::{
    DaneOutcome, DnssecLookup, DnssecResolver, LookupError, TlsCertificateFetcher, TlsaValidator,
    TrustStore,
};

use super::Context;
use crate::cli::args::TlsaArgs;
use crate::output::OutputFormat;

pub async fn execute(ctx: Context, args: TlsaArgs) -> Result<()> {
    let lookup = Arc::new(DnssecResolver::new(&ctx.config)?);
    let server = lookup.servers().primary().ok_or(LookupError::NoServers)?;

    let validator = TlsaValidator::new(
        lookup,
        Arc::new(TlsCertificateFetcher::new(ctx.config.fetch_timeout())?),
        TrustStore::new(ctx.config.ca_bundle_paths.clone()),
    );
    let outcome = validator.validate(&args.url, server).await?;

    let (status, detail) = match &outcome {
        DaneOutcome::Verified => ("verified", String::new()),
        DaneOutcome::SelfSignedRoot(root) => ("self-signed root", root.subject()),
        DaneOutcome::Mismatch(reason) => ("mismatch", reason.clone()),
    };

    match ctx.output_format {
        OutputFormat::Json => {
            let report = json!({ "url": args.url.as_str(), "status": status, "detail": detail });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Pretty => {
            let line = if detail.is_empty() {
                format!("{}: {status}", args.url)
            } else {
                format!("{}: {status} ({detail})", args.url)
            };
            match (&outcome, ctx.no_color) {
                (_, true) => println!("{line}"),
                (DaneOutcome::Mismatch(_), false) => println!("{}", line.red()),
                (_, false) => println!("{}", line.green()),
            }
        }
    }

    if !outcome.is_valid() {
        bail!("endpoint does not match its TLSA records");
    }
    Ok(())
}
