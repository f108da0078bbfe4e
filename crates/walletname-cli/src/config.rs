//! Configuration file discovery.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Result;
use directories::ProjectDirs;
use walletname::ResolverConfig;

/// Default configuration file path.
pub fn default_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("org", "walletname", "walletname")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(dirs.config_dir().join("config.toml"))
}

/// Load the resolver configuration, applying command-line overrides.
///
/// A missing file yields the defaults.
pub fn load(path: Option<&Path>, dns_servers: &[SocketAddr]) -> Result<ResolverConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_path()?,
    };

    let mut config = ResolverConfig::load(&path)?;
    if !dns_servers.is_empty() {
        config.dns_servers = dns_servers.to_vec();
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_servers_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "dns_servers = [\"9.9.9.9:53\"]\nhttps_only = false\n").unwrap();

        let config = load(Some(&path), &[]).unwrap();
        assert_eq!(config.dns_servers, vec!["9.9.9.9:53".parse().unwrap()]);
        assert!(!config.https_only);

        let override_with = ["1.1.1.1:53".parse().unwrap()];
        let config = load(Some(&path), &override_with).unwrap();
        assert_eq!(config.dns_servers, override_with.to_vec());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(Some(&dir.path().join("absent.toml")), &[]).unwrap();
        assert_eq!(config, ResolverConfig::default());
    }
}
