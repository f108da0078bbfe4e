//! The DNSSEC lookup seam between the resolver crates.

use std::net::SocketAddr;

use async_trait::async_trait;

use crate::error::LookupError;
use crate::types::{DnsServerList, RecordKind, ResolvedRecord};

/// A DNSSEC-validating lookup against an explicit DNS server.
///
/// Implementations return records only for authenticated, successful answers.
/// Every other outcome is a [`LookupError`]; an unauthenticated answer is never
/// reported as success.
#[async_trait]
pub trait DnssecLookup: Send + Sync {
    /// Configured servers, primary first
    fn servers(&self) -> &DnsServerList;

    /// Query `name` for records of `kind` at `server`.
    ///
    /// Returns every authenticated record of the requested type, in answer order.
    async fn lookup(
        &self,
        server: SocketAddr,
        name: &str,
        kind: RecordKind,
    ) -> Result<Vec<ResolvedRecord>, LookupError>;
}
