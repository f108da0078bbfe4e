//! The final payment target of a resolution.

use std::fmt;

use crate::codec::{PaymentRequestPayload, PaymentUri};

/// Where funds should be sent for a resolved wallet name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentTarget {
    /// A currency URI (possibly reconstructed from a bare address)
    Uri(PaymentUri),
    /// A serialized payment request served by the indirection endpoint
    PaymentRequest(PaymentRequestPayload),
}

impl PaymentTarget {
    /// The URI, if this target is one
    pub const fn as_uri(&self) -> Option<&PaymentUri> {
        match self {
            Self::Uri(uri) => Some(uri),
            Self::PaymentRequest(_) => None,
        }
    }

    /// The address carried by a URI target
    pub fn address(&self) -> Option<&str> {
        self.as_uri().map(PaymentUri::address)
    }

    /// Returns true for payment-request targets
    pub const fn is_payment_request(&self) -> bool {
        matches!(self, Self::PaymentRequest(_))
    }
}

impl fmt::Display for PaymentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uri(uri) => write!(f, "{uri}"),
            Self::PaymentRequest(request) => {
                write!(f, "payment request ({} bytes)", request.as_bytes().len())
            }
        }
    }
}
