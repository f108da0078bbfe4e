//! # walletname-cli
//!
//! Command-line front end for DNSSEC-authenticated wallet name resolution.
//!
//! ## Commands
//!
//! - **resolve**: look up a wallet name for a currency
//! - **tlsa**: check an HTTPS endpoint against its TLSA records
//! - **servers**: show the DNS servers that would be queried

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
