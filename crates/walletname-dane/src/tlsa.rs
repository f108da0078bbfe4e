//! Certificate association matching for TLSA records (RFC 6698).
//!
//! Records arrive already decoded as hickory's [`TLSA`]; this module only
//! decides whether one is usable and whether a certificate satisfies it.

pub use hickory_proto::rr::rdata::tlsa::{CertUsage, Matching, Selector, TLSA};

use crate::cert::Certificate;
use crate::error::{DaneError, Result};
use crate::hash::{sha256, sha512};

/// Matching rules for a TLSA certificate association.
pub trait CertificateAssociation {
    /// Reject unassigned parameters and association data of the wrong length.
    fn check_usable(&self) -> Result<()>;

    /// Returns true if the association is the full DER certificate itself.
    fn is_full_certificate(&self) -> bool;

    /// The certificate carried by a full-certificate association
    fn certificate(&self) -> Option<Certificate>;

    /// Returns true if `cert` matches this association.
    fn matches(&self, cert: &Certificate) -> bool;
}

impl CertificateAssociation for TLSA {
    fn check_usable(&self) -> Result<()> {
        if !matches!(
            self.cert_usage(),
            CertUsage::PkixTa | CertUsage::PkixEe | CertUsage::DaneTa | CertUsage::DaneEe
        ) {
            return Err(DaneError::Tlsa(format!(
                "unknown certificate usage {}",
                u8::from(self.cert_usage())
            )));
        }
        if !matches!(self.selector(), Selector::Full | Selector::Spki) {
            return Err(DaneError::Tlsa(format!(
                "unknown selector {}",
                u8::from(self.selector())
            )));
        }

        let expected = match self.matching() {
            Matching::Raw => None,
            Matching::Sha256 => Some(32),
            Matching::Sha512 => Some(64),
            other => {
                return Err(DaneError::Tlsa(format!(
                    "unknown matching type {}",
                    u8::from(other)
                )))
            }
        };
        let data = self.cert_data();
        if data.is_empty() || expected.is_some_and(|len| len != data.len()) {
            return Err(DaneError::Tlsa(format!(
                "{} byte association for matching type {}",
                data.len(),
                u8::from(self.matching())
            )));
        }
        Ok(())
    }

    fn is_full_certificate(&self) -> bool {
        self.selector() == Selector::Full && self.matching() == Matching::Raw
    }

    fn certificate(&self) -> Option<Certificate> {
        if self.is_full_certificate() {
            Certificate::from_der(self.cert_data().to_vec()).ok()
        } else {
            None
        }
    }

    fn matches(&self, cert: &Certificate) -> bool {
        let selected = match self.selector() {
            Selector::Full => cert.der().to_vec(),
            Selector::Spki => match cert.spki() {
                Ok(spki) => spki,
                Err(_) => return false,
            },
            _ => return false,
        };

        let digest = match self.matching() {
            Matching::Raw => selected,
            Matching::Sha256 => sha256(&selected),
            Matching::Sha512 => sha512(&selected),
            _ => return false,
        };
        digest == self.cert_data()
    }
}

#[cfg(test)]
pub(crate) fn association(usage: u8, selector: u8, matching: u8, data: Vec<u8>) -> TLSA {
    TLSA::new(usage.into(), selector.into(), matching.into(), data)
}
