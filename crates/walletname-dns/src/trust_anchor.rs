//! DNSSEC trust anchors in DS presentation format.
//!
//! ```text
//! . IN DS 20326 8 2 E06D44B80B8F1D39A95C0B0D7C65D08458E880409BBC683457104237C7F8EC8D
//! ```
//!
//! The anchor selects the key-signing keys of its zone that validation
//! starts from: a served DNSKEY is anchored when its key tag and algorithm
//! match and the DS digest covers it (RFC 4034 section 5.1.4).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use hickory_proto::dnssec::rdata::{DNSSECRData, DNSKEY, DS};
use hickory_proto::dnssec::{DigestType, PublicKey, TrustAnchors};
use hickory_proto::rr::{Name, RData, RecordType};
use hickory_proto::serialize::txt::RDataParser;
use thiserror::Error;
use walletname_core::{LookupError, ResolverConfig};

/// Why a trust anchor string is unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrustAnchorError {
    /// Not a DS record
    #[error("not a DS record: {0}")]
    NotDs(String),

    /// Owner name is not a valid DNS name
    #[error("invalid owner name {0}")]
    Owner(String),

    /// DS rdata did not parse
    #[error("invalid DS rdata {rdata}: {reason}")]
    Rdata {
        /// Offending text
        rdata: String,
        /// Parser detail
        reason: String,
    },

    /// Digest type is not SHA-1, SHA-256 or SHA-384
    #[error("unsupported digest type {0}")]
    UnsupportedDigest(u8),

    /// The anchor file could not be read
    #[error("cannot read {path}: {reason}")]
    Read {
        /// File path
        path: String,
        /// I/O detail
        reason: String,
    },
}

impl From<TrustAnchorError> for LookupError {
    fn from(e: TrustAnchorError) -> Self {
        Self::TrustAnchor(e.to_string())
    }
}

/// A DS record naming the key that anchors DNSSEC validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchor {
    owner: Name,
    ds: DS,
}

impl TrustAnchor {
    /// Zone the anchor belongs to (the root for the default anchor)
    pub const fn owner(&self) -> &Name {
        &self.owner
    }

    /// The DS record itself
    pub const fn ds(&self) -> &DS {
        &self.ds
    }

    /// Key tag of the anchored DNSKEY
    pub fn key_tag(&self) -> u16 {
        self.ds.key_tag()
    }

    /// Returns true if `dnskey` is the key this anchor names.
    pub fn covers(&self, dnskey: &DNSKEY) -> bool {
        dnskey.public_key().algorithm() == self.ds.algorithm()
            && dnskey
                .calculate_key_tag()
                .is_ok_and(|tag| tag == self.ds.key_tag())
            && self.ds.covers(&self.owner, dnskey).unwrap_or(false)
    }

    /// Public keys among `dnskeys` that validation may start from.
    pub fn anchored_keys<'a>(&self, dnskeys: impl IntoIterator<Item = &'a DNSKEY>) -> TrustAnchors {
        let mut anchors = TrustAnchors::empty();
        for dnskey in dnskeys.into_iter().filter(|k| self.covers(k)) {
            anchors.insert(dnskey.public_key());
        }
        anchors
    }
}

impl FromStr for TrustAnchor {
    type Err = TrustAnchorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        let ds_at = tokens
            .iter()
            .position(|t| t.eq_ignore_ascii_case("DS"))
            .filter(|at| *at > 0)
            .ok_or_else(|| TrustAnchorError::NotDs(s.trim().to_string()))?;

        let owner = Name::from_ascii(tokens[0])
            .map_err(|_| TrustAnchorError::Owner(tokens[0].to_string()))?;

        let rdata = tokens[ds_at + 1..].join(" ");
        let ds = match RData::try_from_str(RecordType::DS, &rdata) {
            Ok(RData::DNSSEC(DNSSECRData::DS(ds))) => ds,
            Ok(other) => return Err(TrustAnchorError::NotDs(other.to_string())),
            Err(e) => {
                return Err(TrustAnchorError::Rdata {
                    rdata,
                    reason: e.to_string(),
                })
            }
        };
        if let DigestType::Unknown(code) = ds.digest_type() {
            return Err(TrustAnchorError::UnsupportedDigest(code));
        }

        Ok(Self { owner, ds })
    }
}

impl fmt::Display for TrustAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} IN DS {}", self.owner, self.ds)
    }
}

/// Where the trust anchor is read from.
///
/// The anchor is loaded before every query, so a file-backed anchor picks
/// up rollovers without a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustAnchorSource {
    /// DS record text
    Inline(String),
    /// File whose first non-comment line is a DS record
    File(PathBuf),
}

impl TrustAnchorSource {
    /// Source configured by `config` (the file wins over the inline string).
    pub fn from_config(config: &ResolverConfig) -> Self {
        config.trust_anchor_file.as_ref().map_or_else(
            || Self::Inline(config.trust_anchor.clone()),
            |path| Self::File(path.clone()),
        )
    }

    /// Read and parse the anchor.
    pub fn load(&self) -> Result<TrustAnchor, TrustAnchorError> {
        match self {
            Self::Inline(text) => text.parse(),
            Self::File(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|e| TrustAnchorError::Read {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })?;
                let line = content
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty() && !l.starts_with(';') && !l.starts_with('#'))
                    .unwrap_or_default();
                line.parse()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use hickory_proto::dnssec::{Algorithm, PublicKeyBuf};
    use std::io::Write;
    use walletname_core::ROOT_TRUST_ANCHOR;

    /// Public key of the root zone KSK-2017.
    const ROOT_KSK: &str = "AwEAAaz/tAm8yTn4Mfeh5eyI96WSVexTBAvkMgJzkKTOiW1vkIbzxeF3+/4RgWOq7HrxRixHlFlExOLAJr5emLvN7SWXgnLh4+B5xQlNVz8Og8kvArMtNROxVQuCaSnIDdD5LKyWbRd2n9WGe2R8PzgCmr3EgVLrjyBxWezF0jLHwVN8efS3rCj/EWgvIWgb9tarpVUDK/b58Da+sqqls3eNbuv7pr+eoZG+SrDK6nWeL3c6H5Apxz7LjVc1uTIdsIXxuOLYA4/ilBmSVIzuDWfdRUfhHdY6+cn8HFRm+2hM8AnXGXws9555KrUB5qihylGa8subX2Nn6UwNR1AkUTV74bU=";

    fn root_ksk(zone_key: bool) -> DNSKEY {
        let key = base64::engine::general_purpose::STANDARD
            .decode(ROOT_KSK)
            .unwrap();
        DNSKEY::new(
            zone_key,
            true,
            false,
            PublicKeyBuf::new(key, Algorithm::RSASHA256),
        )
    }

    #[test]
    fn parses_default_anchor() {
        let anchor: TrustAnchor = ROOT_TRUST_ANCHOR.parse().unwrap();
        assert!(anchor.owner().is_root());
        assert_eq!(anchor.key_tag(), 20326);
        assert_eq!(anchor.ds().algorithm(), Algorithm::RSASHA256);
        assert_eq!(anchor.ds().digest_type(), DigestType::SHA256);
        assert_eq!(anchor.to_string(), ROOT_TRUST_ANCHOR);
    }

    #[test]
    fn anchor_covers_root_ksk() {
        let anchor: TrustAnchor = ROOT_TRUST_ANCHOR.parse().unwrap();
        assert_eq!(root_ksk(true).calculate_key_tag().unwrap(), 20326);
        assert!(anchor.covers(&root_ksk(true)));
        assert_eq!(anchor.anchored_keys([&root_ksk(true)]).len(), 1);
    }

    #[test]
    fn sha1_anchor_covers_root_ksk() {
        let anchor: TrustAnchor = ". 172800 IN DS 20326 8 1 AE1EA5B974D4C858B740BD03E3CED7EBFCBD1724"
            .parse()
            .unwrap();
        assert!(anchor.covers(&root_ksk(true)));
    }

    #[test]
    fn anchor_rejects_other_keys() {
        let anchor: TrustAnchor = ROOT_TRUST_ANCHOR.parse().unwrap();
        let other = DNSKEY::new(
            true,
            false,
            false,
            PublicKeyBuf::new((1..=64u8).collect(), Algorithm::RSASHA256),
        );
        assert!(!anchor.covers(&other));

        // Same key without the zone-key flag hashes differently.
        assert!(!anchor.covers(&root_ksk(false)));
        assert!(anchor.anchored_keys([&other, &root_ksk(false)]).is_empty());
    }

    #[test]
    fn rejects_malformed_anchors() {
        assert!(matches!(
            "example.com. IN A 192.0.2.1".parse::<TrustAnchor>(),
            Err(TrustAnchorError::NotDs(_))
        ));
        assert!(matches!(
            "DS 1 8 2 AB".parse::<TrustAnchor>(),
            Err(TrustAnchorError::NotDs(_))
        ));
        assert!(matches!(
            ". IN DS x 8 2 AB".parse::<TrustAnchor>(),
            Err(TrustAnchorError::Rdata { .. })
        ));
        assert!(matches!(
            ". IN DS 1 8 3 AB".parse::<TrustAnchor>(),
            Err(TrustAnchorError::UnsupportedDigest(3))
        ));
        assert!(matches!(
            ". IN DS 1 8 2 XYZ".parse::<TrustAnchor>(),
            Err(TrustAnchorError::Rdata { .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "; root anchor").unwrap();
        writeln!(file, "{ROOT_TRUST_ANCHOR}").unwrap();
        let anchor = TrustAnchorSource::File(file.path().to_path_buf())
            .load()
            .unwrap();
        assert_eq!(anchor.key_tag(), 20326);
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let err = TrustAnchorSource::File("/nonexistent/root.key".into())
            .load()
            .unwrap_err();
        let lookup = LookupError::from(err);
        assert!(matches!(lookup, LookupError::TrustAnchor(_)));
        assert!(!lookup.is_retryable());
    }
}
