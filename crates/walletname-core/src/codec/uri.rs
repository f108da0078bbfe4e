//! Currency payment URIs (`bitcoin:<address>?amount=..&label=..`).
//!
//! Only the structure is checked here: a scheme, an address made of
//! base58/bech32-compatible characters, and well-formed query parameters.
//! Address checksums are the wallet's business.

use std::fmt;

use thiserror::Error;

/// Shortest address accepted.
const MIN_ADDRESS_LEN: usize = 20;

/// Longest address accepted.
const MAX_ADDRESS_LEN: usize = 128;

/// Why a string is not a payment URI.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    /// No `<scheme>:` prefix
    #[error("missing URI scheme")]
    MissingScheme,

    /// Scheme contains non-alphabetic characters
    #[error("invalid URI scheme: {0}")]
    InvalidScheme(String),

    /// No address and no payment request URL
    #[error("missing address")]
    MissingAddress,

    /// Address has invalid characters or length
    #[error("bad address syntax: {0}")]
    InvalidAddress(String),

    /// `amount` is not a decimal number
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A `req-` parameter this parser cannot honour
    #[error("unsupported required parameter: {0}")]
    UnsupportedRequirement(String),
}

/// A parsed currency payment URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUri {
    scheme: String,
    address: String,
    params: Vec<(String, String)>,
}

impl PaymentUri {
    /// Parse `<scheme>:<address>[?<params>]`.
    pub fn parse(input: &str) -> Result<Self, UriError> {
        let input = input.trim();
        let (scheme, rest) = input.split_once(':').ok_or(UriError::MissingScheme)?;

        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(UriError::InvalidScheme(scheme.to_string()));
        }

        let rest = rest.strip_prefix("//").unwrap_or(rest);
        let (address, query) = rest
            .split_once('?')
            .map_or((rest, None), |(a, q)| (a, Some(q)));

        let params: Vec<(String, String)> = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        for (key, value) in &params {
            if key.starts_with("req-") {
                return Err(UriError::UnsupportedRequirement(key.clone()));
            }
            if key == "amount" && !is_decimal(value) {
                return Err(UriError::InvalidAmount(value.clone()));
            }
        }

        let has_request = params.iter().any(|(k, _)| k == "r");
        if address.is_empty() {
            if !has_request {
                return Err(UriError::MissingAddress);
            }
        } else if !is_address_syntax(address) {
            return Err(UriError::InvalidAddress(address.to_string()));
        }

        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            address: address.to_string(),
            params,
        })
    }

    /// URI scheme, lower-cased (e.g. `bitcoin`)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Address part; empty for pure payment-request URIs
    pub fn address(&self) -> &str {
        &self.address
    }

    /// First value of a query parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Requested amount, in the currency's main unit
    pub fn amount(&self) -> Option<&str> {
        self.param("amount")
    }

    /// Recipient label
    pub fn label(&self) -> Option<&str> {
        self.param("label")
    }

    /// Payment message
    pub fn message(&self) -> Option<&str> {
        self.param("message")
    }

    /// Payment request URL (`r=`), if the URI defers to one
    pub fn payment_request_url(&self) -> Option<&str> {
        self.param("r")
    }
}

impl fmt::Display for PaymentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.address)?;
        if !self.params.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.params.iter())
                .finish();
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// URI scheme marker used for a currency code when a bare address is published.
#[must_use]
pub fn scheme_for_currency(currency: &str) -> &str {
    match currency {
        "btc" | "tbtc" => "bitcoin",
        "ltc" => "litecoin",
        "dgc" => "digitalcoin",
        "doge" => "dogecoin",
        "bch" => "bitcoincash",
        "eth" => "ethereum",
        other => other,
    }
}

fn is_address_syntax(address: &str) -> bool {
    (MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&address.len())
        && address.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_decimal(value: &str) -> bool {
    let mut parts = value.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let frac = parts.next().unwrap_or_default();
    !(whole.is_empty() && frac.is_empty())
        && whole.chars().all(|c| c.is_ascii_digit())
        && frac.chars().all(|c| c.is_ascii_digit())
}
