//! Data model shared by the resolver crates

mod payload;
mod query;
mod record;
mod servers;
mod target;

pub use payload::DecodedPayload;
pub use query::WalletNameQuery;
pub use record::{RecordKind, ResolvedRecord};
pub use servers::{DnsServerList, DNS_PORT};
pub use target::PaymentTarget;
