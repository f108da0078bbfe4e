//! Ordered DNS server list with primary/backup semantics.

use std::net::{IpAddr, SocketAddr};

use tracing::warn;
use url::{Host, Url};

/// Default DNS port.
pub const DNS_PORT: u16 = 53;

/// Ordered candidate DNS servers.
///
/// Index 0 is the primary; the remaining entries are backups, consulted only
/// after a DNSSEC validation failure on an earlier server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsServerList {
    servers: Vec<SocketAddr>,
}

impl DnsServerList {
    /// Create a list from explicit addresses, dropping duplicates but keeping order.
    #[must_use]
    pub fn new(servers: impl IntoIterator<Item = SocketAddr>) -> Self {
        let mut list = Vec::new();
        for addr in servers {
            if !list.contains(&addr) {
                list.push(addr);
            }
        }
        Self { servers: list }
    }

    /// Parse a space-separated provider URL list such as
    /// `dns://8.8.8.8 dns://8.8.4.4:5353`.
    ///
    /// Unparseable entries and host names are skipped.
    #[must_use]
    pub fn from_provider_url(provider: &str) -> Self {
        let servers = provider
            .split(' ')
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| match parse_provider_entry(entry) {
                Some(addr) => Some(addr),
                None => {
                    warn!(entry, "skipping unusable DNS provider entry");
                    None
                }
            });
        Self::new(servers)
    }

    /// The primary server, if any
    #[must_use]
    pub fn primary(&self) -> Option<SocketAddr> {
        self.servers.first().copied()
    }

    /// Backup servers, in failover order
    #[must_use]
    pub fn backups(&self) -> &[SocketAddr] {
        self.servers.get(1..).unwrap_or_default()
    }

    /// Address of backup server `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range; callers must bound failover by
    /// [`backups`](Self::backups).
    #[must_use]
    pub fn select_backup(&self, index: usize) -> SocketAddr {
        let backups = self.backups();
        assert!(
            index < backups.len(),
            "backup DNS server index {index} out of range ({} configured)",
            backups.len()
        );
        backups[index]
    }

    /// All servers, primary first
    #[must_use]
    pub fn as_slice(&self) -> &[SocketAddr] {
        &self.servers
    }

    /// Number of servers
    #[must_use]
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// True if no server is known
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

fn parse_provider_entry(entry: &str) -> Option<SocketAddr> {
    let url = Url::parse(entry).ok()?;
    if url.scheme() != "dns" {
        return None;
    }
    let ip = match url.host()? {
        Host::Ipv4(v4) => IpAddr::V4(v4),
        Host::Ipv6(v6) => IpAddr::V6(v6),
        Host::Domain(domain) => domain.parse().ok()?,
    };
    Some(SocketAddr::new(ip, url.port().unwrap_or(DNS_PORT)))
}
