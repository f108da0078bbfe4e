use thiserror::Error;
use walletname_core::{LookupError, WalletNameError};

/// Result type alias for DANE operations
pub type Result<T> = std::result::Result<T, DaneError>;

/// Errors that can occur while validating an endpoint with DANE
#[derive(Error, Debug)]
pub enum DaneError {
    /// The TLSA lookup failed (including an absent TLSA record)
    #[error("TLSA lookup failed: {0}")]
    Lookup(#[from] LookupError),

    /// The endpoint URL has no host or port
    #[error("invalid endpoint URL {0}")]
    InvalidUrl(String),

    /// TLSA record data is malformed
    #[error("invalid TLSA record: {0}")]
    Tlsa(String),

    /// A certificate could not be parsed
    #[error("certificate parse failed: {0}")]
    Certificate(String),

    /// A CA bundle or certificate directory could not be read
    #[error("cannot read {path}: {reason}")]
    Read {
        /// File or directory path
        path: String,
        /// I/O detail
        reason: String,
    },

    /// A CA bundle is not valid PEM
    #[error("PEM decode failed for {path}: {reason}")]
    PemDecode {
        /// Bundle path
        path: String,
        /// Decoder detail
        reason: String,
    },

    /// TLS connection to the endpoint failed
    #[error("TLS handshake with {host}:{port} failed: {reason}")]
    Handshake {
        /// Endpoint host
        host: String,
        /// Endpoint port
        port: u16,
        /// Transport detail
        reason: String,
    },
}

impl DaneError {
    pub(crate) fn handshake(host: &str, port: u16, reason: impl ToString) -> Self {
        Self::Handshake {
            host: host.to_string(),
            port,
            reason: reason.to_string(),
        }
    }
}

impl DaneError {
    pub(crate) fn read(path: &std::path::Path, e: &std::io::Error) -> Self {
        Self::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    }
}

impl From<DaneError> for WalletNameError {
    fn from(e: DaneError) -> Self {
        match e {
            DaneError::Handshake { host, port, reason } => Self::Endpoint {
                url: format!("https://{host}:{port}"),
                reason,
            },
            other => Self::EndpointValidation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walletname_core::ErrorKind;

    #[test]
    fn missing_tlsa_is_a_validation_failure() {
        let err = WalletNameError::from(DaneError::from(LookupError::NoAnswer));
        assert_eq!(err.kind(), ErrorKind::EndpointValidation);
        assert!(err.to_string().starts_with("TLSA validation failed"));
    }

    #[test]
    fn handshake_failure_is_transport() {
        let err = WalletNameError::from(DaneError::handshake("example.com", 443, "reset"));
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
