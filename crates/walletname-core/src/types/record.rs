//! Authenticated DNS record types.

use hickory_proto::rr::rdata::tlsa::TLSA;
use hickory_proto::rr::rdata::TXT;
use hickory_proto::rr::RData;
use serde::{Deserialize, Serialize};

/// DNS record types consumed by wallet name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Wallet name currency list and currency payloads
    Txt,
    /// DANE certificate association for indirection endpoints
    Tlsa,
}

impl RecordKind {
    /// IANA record type code
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Txt => 16,
            Self::Tlsa => 52,
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Txt => write!(f, "TXT"),
            Self::Tlsa => write!(f, "TLSA"),
        }
    }
}

/// One DNSSEC-secure answer record.
///
/// Only produced for responses carrying the authenticated-data flag with a
/// `NOERROR` response code whose signatures chain to the trust anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecord {
    /// Fully-qualified owner name
    pub name: String,
    /// Record type
    pub kind: RecordKind,
    /// Presentation text with quote characters stripped
    pub text: String,
    /// Typed record data
    pub data: RData,
}

impl ResolvedRecord {
    /// Build a TXT record from its character-strings.
    ///
    /// Multiple strings are joined with a single space.
    #[must_use]
    pub fn txt(name: impl Into<String>, strings: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind: RecordKind::Txt,
            text: strings.join(" ").replace('"', ""),
            data: RData::TXT(TXT::new(
                strings.iter().map(|s| (*s).to_string()).collect(),
            )),
        }
    }

    /// Build a TLSA record.
    #[must_use]
    pub fn tlsa(name: impl Into<String>, tlsa: TLSA) -> Self {
        Self {
            name: name.into(),
            kind: RecordKind::Tlsa,
            text: tlsa.to_string(),
            data: RData::TLSA(tlsa),
        }
    }

    /// The certificate association, if this is a TLSA record
    #[must_use]
    pub fn as_tlsa(&self) -> Option<&TLSA> {
        match &self.data {
            RData::TLSA(tlsa) => Some(tlsa),
            _ => None,
        }
    }
}
