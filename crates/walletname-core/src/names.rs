//! DNS names used by wallet name resolution and DANE.
//!
//! Currency list: `_wallet.<label>.`
//! Currency payload: `_<currency>._wallet.<label>.`
//! Endpoint TLSA: `_<port>._tcp.<host>.`

/// Label prefix of the wallet-name record set.
pub const WALLET_PREFIX: &str = "_wallet";

/// Append the root dot if missing.
#[must_use]
pub fn ensure_dot(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// Name of the TXT record listing the currencies published for `label`.
///
/// Example: `"a.b"` -> `"_wallet.a.b."`
#[must_use]
pub fn wallet_list_name(label: &str) -> String {
    ensure_dot(&format!("{WALLET_PREFIX}.{label}"))
}

/// Name of the TXT record carrying the `currency` payload for `label`.
///
/// Example: `("a.b", "btc")` -> `"_btc._wallet.a.b."`
#[must_use]
pub fn currency_record_name(label: &str, currency: &str) -> String {
    ensure_dot(&format!("_{currency}.{WALLET_PREFIX}.{label}"))
}

/// Name of the TLSA record set pinning `host:port`.
#[must_use]
pub fn tlsa_name(host: &str, port: u16) -> String {
    ensure_dot(&format!("_{port}._tcp.{}", host.trim_end_matches('.')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_names() {
        assert_eq!(wallet_list_name("a.b"), "_wallet.a.b.");
        assert_eq!(wallet_list_name("a.b."), "_wallet.a.b.");
        assert_eq!(currency_record_name("a.b", "btc"), "_btc._wallet.a.b.");
    }

    #[test]
    fn tlsa_name_format() {
        assert_eq!(tlsa_name("example.com", 443), "_443._tcp.example.com.");
        assert_eq!(tlsa_name("example.com.", 8443), "_8443._tcp.example.com.");
    }
}
