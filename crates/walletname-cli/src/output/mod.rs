//! Output formatting for different formats.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use walletname::{PaymentTarget, Resolution};

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text with colors
    #[default]
    Pretty,
    /// JSON output
    Json,
}

/// Serializable view of a resolution.
#[derive(Debug, Serialize)]
pub struct ResolutionView {
    pub label: String,
    pub currency: String,
    pub dns_server: String,
    pub failovers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Base64 of a serialized payment request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_request: Option<String>,
}

impl From<&Resolution> for ResolutionView {
    fn from(resolution: &Resolution) -> Self {
        let (uri, address, payment_request) = match &resolution.target {
            PaymentTarget::Uri(uri) => (
                Some(uri.to_string()),
                Some(uri.address().to_string()),
                None,
            ),
            PaymentTarget::PaymentRequest(request) => {
                (None, None, Some(STANDARD.encode(request.as_bytes())))
            }
        };

        Self {
            label: resolution.query.label().to_string(),
            currency: resolution.query.currency().to_string(),
            dns_server: resolution.dns_server.to_string(),
            failovers: resolution.failovers,
            uri,
            address,
            payment_request,
        }
    }
}

/// Print a resolution in the requested format.
pub fn print_resolution(
    resolution: &Resolution,
    format: OutputFormat,
    no_color: bool,
) -> anyhow::Result<()> {
    let view = ResolutionView::from(resolution);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Pretty => {
            let heading = format!("{} ({})", view.label, view.currency);
            if no_color {
                println!("{heading}");
            } else {
                println!("{}", heading.bold());
            }
            if let Some(uri) = &view.uri {
                println!("  URI:             {uri}");
            }
            if let Some(address) = &view.address {
                println!("  Address:         {address}");
            }
            if let Some(request) = &view.payment_request {
                println!("  Payment request: {} bytes", STANDARD.decode(request)?.len());
            }
            println!("  DNS server:      {}", view.dns_server);
            if view.failovers > 0 {
                println!("  Failovers:       {}", view.failovers);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use walletname::{PaymentRequestPayload, PaymentUri, WalletNameQuery};

    fn resolution(target: PaymentTarget) -> Resolution {
        Resolution {
            query: WalletNameQuery::new("Wallet.Example.com", "BTC", false).unwrap(),
            target,
            dns_server: "8.8.8.8:53".parse().unwrap(),
            failovers: 1,
        }
    }

    #[test]
    fn uri_view() {
        let uri = PaymentUri::parse("bitcoin:1CpLXM15vjULK3ZPGUTDMUcGATGR9xGitv").unwrap();
        let json = serde_json::to_value(ResolutionView::from(&resolution(PaymentTarget::Uri(uri))))
            .unwrap();

        assert_eq!(json["label"], "wallet.example.com");
        assert_eq!(json["address"], "1CpLXM15vjULK3ZPGUTDMUcGATGR9xGitv");
        assert_eq!(json["failovers"], 1);
        assert!(json.get("payment_request").is_none());
    }

    #[test]
    fn payment_request_view() {
        let bytes = [0x08, 0x01, 0x22, 0x02, 0x0a, 0x00];
        let request = PaymentRequestPayload::recognize(&bytes).unwrap();
        let view = ResolutionView::from(&resolution(PaymentTarget::PaymentRequest(request)));

        assert_eq!(view.payment_request, Some(STANDARD.encode(bytes)));
        assert!(view.uri.is_none());
    }
}
