//! DNSSEC-authenticated wallet name resolution.
//!
//! A wallet name such as `wallet.example.com` publishes the currencies it
//! accepts at `_wallet.wallet.example.com.` and a payload per currency at
//! `_btc._wallet.wallet.example.com.`. Both TXT records are only accepted when
//! the DNS server authenticated them. A payload is either an address (or
//! currency URI) or an HTTPS URL whose certificate can be pinned through
//! TLSA records before it is fetched.
//!
//! # Example
//!
//! ```rust,ignore
//! use walletname::{ResolverConfig, WalletNameResolver};
//!
//! let resolver = WalletNameResolver::new(ResolverConfig::load("walletname.toml".as_ref())?)?;
//! let resolution = resolver.resolve("wallet.example.com", "btc", true).await?;
//! println!("pay to {}", resolution.target);
//! ```

pub mod endpoint;
pub mod resolver;

pub use endpoint::{classify_response, EndpointRequest, EndpointResolver, HttpsEndpointResolver};
pub use resolver::{Resolution, WalletNameResolver, WalletNameResolverBuilder};

pub use walletname_core::{
    DnsServerList, DnssecLookup, ErrorKind, LookupError, PaymentRequestPayload, PaymentTarget,
    PaymentUri, ResolverConfig, Result, WalletNameError, WalletNameQuery,
};
pub use walletname_dane::{
    Certificate, DaneError, DaneOutcome, TlsCertificateFetcher, TlsaValidator, TrustStore,
};
pub use walletname_dns::{configured_servers, system_servers, DnssecResolver};
