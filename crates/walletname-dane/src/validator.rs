//! TLSA/DANE validation of HTTPS endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;
use walletname_core::{names, DnssecLookup, RecordKind};

use crate::cert::Certificate;
use crate::chain::{ChainValidation, ChainValidator};
use crate::error::{DaneError, Result};
use crate::fetch::CertificateFetcher;
use crate::tlsa::{CertUsage, CertificateAssociation, TLSA};
use crate::trust_store::{RootSet, TrustStore};

/// Result of validating an endpoint against its TLSA records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaneOutcome {
    /// The presented chain satisfies a TLSA record
    Verified,
    /// A TLSA record vouches for a root that is not otherwise trusted.
    ///
    /// The caller may trust this root for the fetch that follows.
    SelfSignedRoot(Certificate),
    /// No TLSA record is satisfied
    Mismatch(String),
}

impl DaneOutcome {
    /// Returns true unless the outcome is a mismatch
    pub const fn is_valid(&self) -> bool {
        !matches!(self, Self::Mismatch(_))
    }
}

/// Checks endpoint certificates against DNSSEC-authenticated TLSA records.
#[derive(Clone)]
pub struct TlsaValidator {
    lookup: Arc<dyn DnssecLookup>,
    fetcher: Arc<dyn CertificateFetcher>,
    store: TrustStore,
}

impl std::fmt::Debug for TlsaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsaValidator")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl TlsaValidator {
    /// Create a validator from its collaborators.
    pub fn new(
        lookup: Arc<dyn DnssecLookup>,
        fetcher: Arc<dyn CertificateFetcher>,
        store: TrustStore,
    ) -> Self {
        Self {
            lookup,
            fetcher,
            store,
        }
    }

    /// The trust store consulted for PKIX checks
    pub const fn trust_store(&self) -> &TrustStore {
        &self.store
    }

    /// Validate the endpoint of `url`, looking up its TLSA records at `dns_server`.
    ///
    /// A missing TLSA record is an error, never a pass.
    pub async fn validate(&self, url: &Url, dns_server: SocketAddr) -> Result<DaneOutcome> {
        let host = url
            .host_str()
            .ok_or_else(|| DaneError::InvalidUrl(url.to_string()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| DaneError::InvalidUrl(url.to_string()))?;

        let name = names::tlsa_name(host, port);
        debug!(name = %name, server = %dns_server, "looking up TLSA records");
        let answers = self
            .lookup
            .lookup(dns_server, &name, RecordKind::Tlsa)
            .await?;

        let records: Vec<&TLSA> = answers
            .iter()
            .filter_map(|answer| answer.as_tlsa())
            .filter(|record| match record.check_usable() {
                Ok(()) => true,
                Err(e) => {
                    warn!(name = %name, record = %record, error = %e, "ignoring unusable TLSA record");
                    false
                }
            })
            .collect();
        if records.is_empty() {
            return Err(DaneError::Tlsa(format!("no usable TLSA record at {name}")));
        }

        let chain = self.fetcher.fetch_chain(host, port).await?;
        if chain.is_empty() {
            return Ok(DaneOutcome::Mismatch(String::from(
                "endpoint presented no certificate",
            )));
        }

        let roots = self.store.snapshot().await;
        let mut first_mismatch = None;
        for record in records {
            match check(record, &chain, &roots) {
                DaneOutcome::Mismatch(reason) => {
                    debug!(record = %record, reason = %reason, "TLSA record not satisfied");
                    first_mismatch.get_or_insert(reason);
                }
                outcome => {
                    info!(host, port, record = %record, "endpoint matches TLSA record");
                    return Ok(outcome);
                }
            }
        }

        Ok(DaneOutcome::Mismatch(first_mismatch.unwrap_or_default()))
    }
}

/// Evaluate one TLSA record against a presented chain.
fn check(record: &TLSA, chain: &[Certificate], roots: &RootSet) -> DaneOutcome {
    match record.cert_usage() {
        CertUsage::DaneEe | CertUsage::PkixEe => check_service_cert(record, chain, roots),
        CertUsage::DaneTa => check_trust_anchor(record, chain, roots),
        CertUsage::PkixTa => check_ca_constraint(record, chain, roots),
        other => DaneOutcome::Mismatch(format!(
            "unsupported certificate usage {}",
            u8::from(other)
        )),
    }
}

/// The leaf alone decides; the chain only tells whether its root needs elevating.
fn check_service_cert(record: &TLSA, chain: &[Certificate], roots: &RootSet) -> DaneOutcome {
    if !chain.first().is_some_and(|leaf| record.matches(leaf)) {
        return DaneOutcome::Mismatch(String::from(
            "leaf certificate does not match the TLSA association",
        ));
    }

    match ChainValidator::validate(chain, roots, None) {
        ChainValidation::SelfSignedUnknownRoot(root) => DaneOutcome::SelfSignedRoot(root),
        _ => DaneOutcome::Verified,
    }
}

/// The association names a trust anchor, which need not be a public root.
fn check_trust_anchor(record: &TLSA, chain: &[Certificate], roots: &RootSet) -> DaneOutcome {
    let Some(anchor) = chain
        .iter()
        .find(|cert| record.matches(cert))
        .cloned()
        .or_else(|| record.certificate())
    else {
        return DaneOutcome::Mismatch(String::from(
            "no presented certificate matches the TLSA trust anchor",
        ));
    };

    match ChainValidator::validate(chain, roots, Some(&anchor)) {
        ChainValidation::Trusted { anchor } if roots.contains(&anchor) => DaneOutcome::Verified,
        ChainValidation::Trusted { anchor } => DaneOutcome::SelfSignedRoot(anchor),
        ChainValidation::SelfSignedUnknownRoot(root) if record.matches(&root) => {
            DaneOutcome::SelfSignedRoot(root)
        }
        ChainValidation::SelfSignedUnknownRoot(root) => DaneOutcome::Mismatch(format!(
            "chain ends at {} instead of the TLSA trust anchor",
            root.subject()
        )),
        ChainValidation::Untrusted(reason) => DaneOutcome::Mismatch(reason),
    }
}

/// The chain must validate against the standard roots and pass through the association.
fn check_ca_constraint(record: &TLSA, chain: &[Certificate], roots: &RootSet) -> DaneOutcome {
    match ChainValidator::validate(chain, roots, None) {
        ChainValidation::Trusted { anchor } => {
            if record.matches(&anchor) || chain.iter().any(|cert| record.matches(cert)) {
                DaneOutcome::Verified
            } else {
                DaneOutcome::Mismatch(String::from(
                    "no certificate on the validated path matches the TLSA association",
                ))
            }
        }
        ChainValidation::SelfSignedUnknownRoot(root) => DaneOutcome::Mismatch(format!(
            "chain ends at untrusted root {}",
            root.subject()
        )),
        ChainValidation::Untrusted(reason) => DaneOutcome::Mismatch(reason),
    }
}
