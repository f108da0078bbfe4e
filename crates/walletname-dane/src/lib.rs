//! TLSA/DANE validation for wallet name indirection endpoints.
//!
//! - [`TrustStore`]: shared, append-only root set loaded lazily from the
//!   system CA bundles
//! - [`ChainValidator`]: leaf-to-root chain checks, distinguishing an
//!   unknown self-signed root from a broken chain
//! - [`CertificateAssociation`]: matching rules for hickory's typed [`TLSA`] records
//! - [`TlsaValidator`]: looks up `_port._tcp.host.` through a
//!   [`walletname_core::DnssecLookup`] and judges the presented chain
//!
//! # Example
//!
//! ```rust,ignore
//! let validator = TlsaValidator::new(lookup, Arc::new(TlsCertificateFetcher::new(timeout)?), store);
//! match validator.validate(&url, dns_server).await? {
//!     DaneOutcome::Verified => {}
//!     DaneOutcome::SelfSignedRoot(root) => client_roots.push(root),
//!     DaneOutcome::Mismatch(reason) => return Err(reason.into()),
//! }
//! ```

mod cert;
pub mod chain;
mod error;
pub mod fetch;
mod hash;
pub mod tlsa;
pub mod trust_store;
pub mod validator;

#[cfg(test)]
mod test_certs;

pub use cert::Certificate;
pub use chain::{ChainValidation, ChainValidator};
pub use error::{DaneError, Result};
pub use fetch::{CertificateFetcher, TlsCertificateFetcher};
pub use tlsa::{CertUsage, CertificateAssociation, Matching, Selector, TLSA};
pub use trust_store::{RootSet, TrustStore};
pub use validator::{DaneOutcome, TlsaValidator};
