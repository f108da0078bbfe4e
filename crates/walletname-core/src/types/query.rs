//! Wallet name query type.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WalletNameError};

/// A single wallet name resolution request.
///
/// Label and currency are lower-cased on construction so that lookups are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QueryFields")]
pub struct WalletNameQuery {
    label: String,
    currency: String,
    verify_endpoint: bool,
}

impl WalletNameQuery {
    /// Create a query, rejecting an empty label before any network activity.
    pub fn new(
        label: impl AsRef<str>,
        currency: impl AsRef<str>,
        verify_endpoint: bool,
    ) -> Result<Self> {
        let label = label.as_ref().trim().to_lowercase();
        let currency = currency.as_ref().trim().to_lowercase();

        if label.is_empty() || label == "." {
            return Err(WalletNameError::EmptyLabel);
        }

        Ok(Self {
            label,
            currency,
            verify_endpoint,
        })
    }

    /// Wallet name label (e.g. `wallet.example.com`)
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Three letter currency code (e.g. `btc`)
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Whether indirection endpoints must pass TLSA validation
    pub const fn verify_endpoint(&self) -> bool {
        self.verify_endpoint
    }
}

/// Wire shape of a query before normalization.
#[derive(Deserialize)]
struct QueryFields {
    label: String,
    currency: String,
    #[serde(default)]
    verify_endpoint: bool,
}

impl TryFrom<QueryFields> for WalletNameQuery {
    type Error = WalletNameError;

    fn try_from(fields: QueryFields) -> Result<Self> {
        Self::new(fields.label, fields.currency, fields.verify_endpoint)
    }
}
