//! Certificate chain validation against a root set.
//!
//! The chain is walked leaf first. Every link must name its successor as
//! issuer, carry a valid signature from it and be inside its validity
//! period. The walk stops at the first trusted certificate.

use tracing::debug;
use x509_parser::certificate::X509Certificate;

use crate::cert::Certificate;
use crate::trust_store::RootSet;

/// Outcome of validating a presented chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainValidation {
    /// The chain leads to `anchor`, a trusted root
    Trusted {
        /// The trusted certificate the chain ends at
        anchor: Certificate,
    },
    /// The chain is intact but ends at a self-issued certificate nobody trusts
    SelfSignedUnknownRoot(Certificate),
    /// A link is broken or the chain leads nowhere trusted
    Untrusted(String),
}

impl ChainValidation {
    /// Returns true for [`ChainValidation::Trusted`]
    pub const fn is_trusted(&self) -> bool {
        matches!(self, Self::Trusted { .. })
    }
}

/// Validates certificate chains.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainValidator;

impl ChainValidator {
    /// Validate `chain` (leaf first) against `roots` plus an optional extra root.
    pub fn validate(
        chain: &[Certificate],
        roots: &RootSet,
        extra_root: Option<&Certificate>,
    ) -> ChainValidation {
        let trusted = |cert: &Certificate| roots.contains(cert) || extra_root == Some(cert);

        let parsed = match chain
            .iter()
            .map(Certificate::parsed)
            .collect::<Result<Vec<X509Certificate<'_>>, _>>()
        {
            Ok(parsed) => parsed,
            Err(e) => return ChainValidation::Untrusted(e.to_string()),
        };
        if parsed.is_empty() {
            return ChainValidation::Untrusted(String::from("empty certificate chain"));
        }

        for (i, cert) in parsed.iter().enumerate() {
            if !cert.validity().is_valid() {
                return ChainValidation::Untrusted(format!(
                    "certificate {} is outside its validity period",
                    cert.subject()
                ));
            }

            if trusted(&chain[i]) {
                debug!(subject = %cert.subject(), depth = i, "chain reached trusted certificate");
                return ChainValidation::Trusted {
                    anchor: chain[i].clone(),
                };
            }

            if let Some(issuer) = parsed.get(i + 1) {
                if cert.issuer().as_raw() != issuer.subject().as_raw() {
                    return ChainValidation::Untrusted(format!(
                        "certificate {} is not issued by {}",
                        cert.subject(),
                        issuer.subject()
                    ));
                }
                if let Err(e) = cert.verify_signature(Some(issuer.public_key())) {
                    return ChainValidation::Untrusted(format!(
                        "signature on {} does not verify: {e}",
                        cert.subject()
                    ));
                }
                continue;
            }

            return terminal(&chain[i], cert, roots, extra_root);
        }

        ChainValidation::Untrusted(String::from("empty certificate chain"))
    }
}

/// Classify the last certificate of a chain that is not itself trusted.
fn terminal(
    last: &Certificate,
    cert: &X509Certificate<'_>,
    roots: &RootSet,
    extra_root: Option<&Certificate>,
) -> ChainValidation {
    let issuer_name = cert.issuer().as_raw();
    let extra = extra_root
        .filter(|root| root.subject_raw().is_ok_and(|subject| subject == issuer_name));

    for candidate in roots.by_subject(issuer_name).iter().chain(extra) {
        let Ok(root) = candidate.parsed() else {
            continue;
        };
        if root.validity().is_valid() && cert.verify_signature(Some(root.public_key())).is_ok() {
            return ChainValidation::Trusted {
                anchor: candidate.clone(),
            };
        }
    }

    if issuer_name == cert.subject().as_raw() {
        return match cert.verify_signature(None) {
            Ok(()) => ChainValidation::SelfSignedUnknownRoot(last.clone()),
            Err(e) => ChainValidation::Untrusted(format!(
                "self-signature on {} does not verify: {e}",
                cert.subject()
            )),
        };
    }

    ChainValidation::Untrusted(format!("no trusted issuer for {}", cert.subject()))
}
