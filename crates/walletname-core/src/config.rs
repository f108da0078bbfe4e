//! Resolver configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WalletNameError};

/// DS record of the root zone KSK-2017.
pub const ROOT_TRUST_ANCHOR: &str =
    ". IN DS 20326 8 2 E06D44B80B8F1D39A95C0B0D7C65D08458E880409BBC683457104237C7F8EC8D";

/// Configuration for a wallet name resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// DNS servers in order of preference (empty: use the system resolvers).
    pub dns_servers: Vec<SocketAddr>,

    /// Root trust anchor as a DS record in presentation format.
    pub trust_anchor: String,

    /// File holding the trust anchor; overrides `trust_anchor` and is re-read for every query.
    pub trust_anchor_file: Option<PathBuf>,

    /// Per-query DNS timeout (seconds).
    pub query_timeout_secs: u64,

    /// PEM bundles loaded into the default trust store (empty: system locations).
    pub ca_bundle_paths: Vec<PathBuf>,

    /// Keep DANE-asserted self-signed roots in the trust store after the fetch.
    pub persist_dane_roots: bool,

    /// Timeout for the indirection endpoint fetch (seconds).
    pub fetch_timeout_secs: u64,

    /// Refuse plain-HTTP indirection URLs.
    pub https_only: bool,

    /// User-Agent for endpoint fetches.
    pub user_agent: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            dns_servers: Vec::new(),
            trust_anchor: String::from(ROOT_TRUST_ANCHOR),
            trust_anchor_file: None,
            query_timeout_secs: default_query_timeout(),
            ca_bundle_paths: Vec::new(),
            persist_dane_roots: false,
            fetch_timeout_secs: default_fetch_timeout(),
            https_only: true,
            user_agent: None,
        }
    }
}

impl ResolverConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| WalletNameError::Config(format!("{}: {e}", path.display())))?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| WalletNameError::Config(e.to_string()))
    }

    /// DNS query timeout
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Endpoint fetch timeout
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

const fn default_query_timeout() -> u64 {
    5
}

const fn default_fetch_timeout() -> u64 {
    30
}
