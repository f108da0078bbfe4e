//! System DNS server discovery.

use hickory_resolver::system_conf::read_system_conf;
use tracing::debug;
use walletname_core::{DnsServerList, LookupError, ResolverConfig};

/// Resolvers configured for this host (e.g. `/etc/resolv.conf`), in order.
pub fn system_servers() -> Result<DnsServerList, LookupError> {
    let (config, _opts) = read_system_conf().map_err(|e| {
        debug!(error = %e, "system resolver configuration unavailable");
        LookupError::NoServers
    })?;

    let servers = DnsServerList::new(config.name_servers().iter().map(|ns| ns.socket_addr));
    debug!(count = servers.len(), "discovered system DNS servers");
    Ok(servers)
}

/// Servers named in `config`, or the system resolvers when none are given.
pub fn configured_servers(config: &ResolverConfig) -> Result<DnsServerList, LookupError> {
    let servers = if config.dns_servers.is_empty() {
        system_servers()?
    } else {
        DnsServerList::new(config.dns_servers.iter().copied())
    };

    if servers.is_empty() {
        return Err(LookupError::NoServers);
    }
    Ok(servers)
}
