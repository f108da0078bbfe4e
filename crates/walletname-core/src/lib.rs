//! Core types and traits for DNSSEC-authenticated wallet name resolution.
//!
//! This crate provides the pieces shared by the resolver crates:
//!
//! - **Types**: queries, DNS server lists, authenticated records, decoded payloads
//! - **Codecs**: currency payment URIs and payment-request recognition
//! - **Errors**: the [`WalletNameError`] taxonomy and per-lookup [`LookupError`]
//! - **Lookup seam**: the [`DnssecLookup`] trait implemented by the DNS crate
//!
//! # Example
//!
//! ```rust,ignore
//! use walletname_core::{names, DecodedPayload, WalletNameQuery};
//!
//! let query = WalletNameQuery::new("Wallet.Example.com", "BTC", false)?;
//! assert_eq!(names::wallet_list_name(query.label()), "_wallet.wallet.example.com.");
//! ```

pub mod codec;
mod config;
mod error;
mod lookup;
pub mod names;
pub mod types;

pub use codec::{scheme_for_currency, PaymentRequestPayload, PaymentUri, UriError};
pub use config::{ResolverConfig, ROOT_TRUST_ANCHOR};
pub use error::{ErrorKind, LookupError, Result, WalletNameError};
pub use lookup::DnssecLookup;
pub use types::*;
