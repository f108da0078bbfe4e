//! Payload formats a wallet name can resolve to

pub mod payment_request;
pub mod uri;

pub use payment_request::{PaymentRequestError, PaymentRequestPayload};
pub use uri::{scheme_for_currency, PaymentUri, UriError};
