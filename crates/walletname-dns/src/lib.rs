//! DNSSEC-validating lookups for wallet name resolution.
//!
//! - [`DnssecResolver`]: queries one server at a time, requires an
//!   authenticated NOERROR answer, then validates its signatures from the
//!   configured [`TrustAnchor`] with hickory's DNSSEC handle
//! - [`HickoryTransport`]: UDP transport with TCP fallback behind the
//!   [`DnsTransport`] seam
//! - [`system_servers`]: resolver discovery from the host configuration

pub mod resolver;
pub mod system;
pub mod transport;
pub mod trust_anchor;

pub use resolver::{DnssecResolver, VALIDATION_REASON_CLASS};
pub use system::{configured_servers, system_servers};
pub use transport::{DnsTransport, HickoryTransport, ServerHandle};
pub use trust_anchor::{TrustAnchor, TrustAnchorError, TrustAnchorSource};
