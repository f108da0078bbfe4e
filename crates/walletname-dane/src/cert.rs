//! Owned DER certificates.

use std::fmt;

use x509_parser::certificate::X509Certificate;

use crate::error::{DaneError, Result};
use crate::hash::sha256_hex;

/// A DER-encoded X.509 certificate that is known to parse.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Certificate {
    der: Vec<u8>,
}

impl Certificate {
    /// Wrap DER bytes, rejecting anything that is not a certificate.
    pub fn from_der(der: impl Into<Vec<u8>>) -> Result<Self> {
        let der = der.into();
        parse(&der)?;
        Ok(Self { der })
    }

    /// Every `CERTIFICATE` block of a PEM document.
    pub fn from_pem(content: &[u8]) -> Result<Vec<Self>> {
        let blocks = pem::parse_many(content).map_err(|e| DaneError::Certificate(e.to_string()))?;
        blocks
            .into_iter()
            .filter(|p| p.tag() == "CERTIFICATE")
            .map(|p| Self::from_der(p.into_contents()))
            .collect()
    }

    /// DER encoding
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Parsed view borrowing the DER bytes.
    pub fn parsed(&self) -> Result<X509Certificate<'_>> {
        parse(&self.der)
    }

    /// Lowercase hex SHA-256 of the DER encoding
    pub fn fingerprint(&self) -> String {
        sha256_hex(&self.der)
    }

    /// Raw DER of the subject name
    pub fn subject_raw(&self) -> Result<Vec<u8>> {
        Ok(self.parsed()?.subject().as_raw().to_vec())
    }

    /// DER `SubjectPublicKeyInfo`
    pub fn spki(&self) -> Result<Vec<u8>> {
        Ok(self.parsed()?.public_key().raw.to_vec())
    }

    /// Subject distinguished name, for logs and error messages
    pub fn subject(&self) -> String {
        self.parsed()
            .map_or_else(|_| String::from("<unparseable>"), |c| c.subject().to_string())
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

fn parse(der: &[u8]) -> Result<X509Certificate<'_>> {
    let (_, cert) = x509_parser::parse_x509_certificate(der)
        .map_err(|e| DaneError::Certificate(e.to_string()))?;
    Ok(cert)
}
