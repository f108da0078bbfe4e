use std::net::SocketAddr;

use thiserror::Error;

/// Result type alias for wallet name operations
pub type Result<T> = std::result::Result<T, WalletNameError>;

/// Failure of a single DNSSEC lookup against one DNS server
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The configured trust anchor could not be loaded or parsed
    #[error("trust anchor load failed: {0}")]
    TrustAnchor(String),

    /// No DNS server is configured or discoverable
    #[error("no DNS servers available")]
    NoServers,

    /// The query name is not a valid DNS name
    #[error("invalid DNS name {name}: {reason}")]
    InvalidName {
        /// The offending name
        name: String,
        /// Parser detail
        reason: String,
    },

    /// The DNS server could not be reached
    #[error("DNS server {server} unreachable: {reason}")]
    Unreachable {
        /// Server that failed
        server: SocketAddr,
        /// Transport detail
        reason: String,
    },

    /// The validator explained why the answer was rejected
    #[error("{0}")]
    ValidationFailed(String),

    /// The answer was not authenticated and no explanation was attached
    #[error("DNSSEC lookup failure: unauthenticated answer ({rcode})")]
    Unauthenticated {
        /// Response code reported by the server
        rcode: String,
    },

    /// Authenticated, successful response without a record of the requested type
    #[error("no query answer received")]
    NoAnswer,

    /// Signatures on the answer do not chain to the trust anchor
    #[error("DNSSEC validation failed: {0}")]
    Bogus(String),

    /// The server's root DNSKEY set is not covered by the configured trust anchor
    #[error("root DNSKEY set at {server} is not covered by the trust anchor")]
    AnchorMismatch {
        /// Server that served the root keys
        server: SocketAddr,
    },

    /// The response could not be decoded
    #[error("malformed DNS response: {0}")]
    Malformed(String),
}

impl LookupError {
    /// Returns true if another DNS server may produce a different outcome.
    ///
    /// Configuration problems are the same on every server and are never retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::TrustAnchor(_) | Self::NoServers | Self::InvalidName { .. }
        )
    }
}

/// Broad failure category, used by callers to decide how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Trust anchor or server configuration is unusable
    Configuration,
    /// DNSSEC lookup failed on every server tried
    Dnssec,
    /// The wallet name does not publish the requested data
    Content,
    /// TLSA/DANE verification of the indirection endpoint failed
    EndpointValidation,
    /// The indirection endpoint could not be fetched
    Transport,
    /// The final payload is not a recognisable address or payment request
    Format,
}

/// Errors that can occur while resolving a wallet name
#[derive(Error, Debug)]
pub enum WalletNameError {
    /// Empty wallet name label
    #[error("label must be non-empty")]
    EmptyLabel,

    /// Invalid or unusable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// DNSSEC lookup failed (after server failover was exhausted)
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// `_wallet.<label>.` is empty or absent
    #[error("no currency list")]
    NoCurrencyList,

    /// Requested currency is not published for the label
    #[error("currency not available")]
    CurrencyNotAvailable {
        /// Lower-cased currency code
        currency: String,
    },

    /// TLSA/DANE verification of the endpoint failed
    #[error("TLSA validation failed: {0}")]
    EndpointValidation(String),

    /// Indirection URL could not be fetched
    #[error("endpoint fetch failed for {url}: {reason}")]
    Endpoint {
        /// The indirection URL
        url: String,
        /// Transport detail
        reason: String,
    },

    /// Direct payload is not a valid address or URI
    #[error("address construction failed for {payload}: {detail}")]
    AddressConstruction {
        /// Payload that could not be interpreted
        payload: String,
        /// Parser detail from the last attempt
        detail: String,
    },

    /// Endpoint body is neither a URI nor a payment request
    #[error("unable to create address URI from endpoint response: {detail}")]
    UnrecognizedResponse {
        /// Parser detail
        detail: String,
    },
}

impl WalletNameError {
    /// Returns the failure category
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyLabel | Self::Config(_) => ErrorKind::Configuration,
            Self::Lookup(e) if !e.is_retryable() => ErrorKind::Configuration,
            Self::Lookup(_) => ErrorKind::Dnssec,
            Self::NoCurrencyList | Self::CurrencyNotAvailable { .. } => ErrorKind::Content,
            Self::EndpointValidation(_) => ErrorKind::EndpointValidation,
            Self::Endpoint { .. } => ErrorKind::Transport,
            Self::AddressConstruction { .. } | Self::UnrecognizedResponse { .. } => {
                ErrorKind::Format
            }
        }
    }

    /// Returns true if the error may be cured by switching DNS servers
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Lookup(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_lookups_are_not_retryable() {
        assert!(!LookupError::TrustAnchor("bad".into()).is_retryable());
        assert!(!LookupError::NoServers.is_retryable());
        assert!(LookupError::NoAnswer.is_retryable());
        assert!(LookupError::ValidationFailed("bogus".into()).is_retryable());
        assert!(LookupError::Bogus("unsigned TXT".into()).is_retryable());
    }

    #[test]
    fn error_kinds() {
        assert_eq!(
            WalletNameError::from(LookupError::NoAnswer).kind(),
            ErrorKind::Dnssec
        );
        assert_eq!(
            WalletNameError::from(LookupError::NoServers).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            WalletNameError::CurrencyNotAvailable {
                currency: "btc".into()
            }
            .kind(),
            ErrorKind::Content
        );
        assert!(!WalletNameError::NoCurrencyList.is_retryable());
    }

    #[test]
    fn validation_reason_is_surfaced_verbatim() {
        let err = WalletNameError::from(LookupError::ValidationFailed(
            "validation failure <_wallet.a.b. TXT IN>: no signatures".into(),
        ));
        assert_eq!(
            err.to_string(),
            "validation failure <_wallet.a.b. TXT IN>: no signatures"
        );
    }
}
