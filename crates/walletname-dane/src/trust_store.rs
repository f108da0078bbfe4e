//! Process-wide set of trusted root certificates.
//!
//! The default roots are read from the system CA bundles once, on first
//! use. Reads take a lock-free snapshot; additions publish a new snapshot.
//! Roots are never removed.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::cert::Certificate;
use crate::error::{DaneError, Result};

/// Known root CA store locations across Linux distributions.
const CA_STORE_PATHS: &[&str] = &[
    // Arch / Fedora / RHEL bundle
    "/etc/ssl/certs/ca-certificates.crt",
    // Debian / Ubuntu bundle
    "/etc/ssl/certs/ca-bundle.crt",
    // SUSE
    "/etc/ssl/ca-bundle.pem",
    // Alpine / macOS
    "/etc/ssl/cert.pem",
    // p11-kit trust anchors
    "/etc/ca-certificates/extracted/tls-ca-bundle.pem",
    // Fedora / RHEL individual certs
    "/etc/pki/tls/certs",
];

/// Immutable view of the trusted roots.
#[derive(Debug, Clone, Default)]
pub struct RootSet {
    by_subject: HashMap<Vec<u8>, Vec<Certificate>>,
    fingerprints: HashSet<String>,
    elevated: Vec<Certificate>,
}

impl RootSet {
    /// Add a root; returns false if it was already present.
    fn insert(&mut self, cert: Certificate) -> bool {
        let Ok(subject) = cert.subject_raw() else {
            return false;
        };
        if !self.fingerprints.insert(cert.fingerprint()) {
            return false;
        }
        self.by_subject.entry(subject).or_default().push(cert);
        true
    }

    /// Returns true if this exact certificate is trusted
    pub fn contains(&self, cert: &Certificate) -> bool {
        self.fingerprints.contains(&cert.fingerprint())
    }

    /// Trusted roots whose subject is `subject_raw`
    pub fn by_subject(&self, subject_raw: &[u8]) -> &[Certificate] {
        self.by_subject.get(subject_raw).map_or(&[], Vec::as_slice)
    }

    /// Roots added at runtime through [`TrustStore::add_trusted`], oldest first
    pub fn elevated(&self) -> &[Certificate] {
        &self.elevated
    }

    /// Every trusted root
    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        self.by_subject.values().flatten()
    }

    /// Number of trusted roots
    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    /// Returns true if no root is trusted
    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

struct Inner {
    sources: Vec<PathBuf>,
    defaults: OnceCell<()>,
    roots: ArcSwap<RootSet>,
}

/// Shared handle to the trusted root set. Clones share the same store.
#[derive(Clone)]
pub struct TrustStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for TrustStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustStore")
            .field("sources", &self.inner.sources)
            .field("loaded", &self.inner.defaults.initialized())
            .field("roots", &self.inner.roots.load().len())
            .finish()
    }
}

impl TrustStore {
    /// Store whose defaults are read from `bundle_paths` (empty: system locations) on first use.
    pub fn new(bundle_paths: Vec<PathBuf>) -> Self {
        let sources = if bundle_paths.is_empty() {
            CA_STORE_PATHS.iter().map(PathBuf::from).collect()
        } else {
            bundle_paths
        };
        Self {
            inner: Arc::new(Inner {
                sources,
                defaults: OnceCell::new(),
                roots: ArcSwap::from_pointee(RootSet::default()),
            }),
        }
    }

    /// Store holding exactly `certs` as its defaults.
    pub fn from_certificates(certs: impl IntoIterator<Item = Certificate>) -> Self {
        let mut set = RootSet::default();
        for cert in certs {
            set.insert(cert);
        }
        Self {
            inner: Arc::new(Inner {
                sources: Vec::new(),
                defaults: OnceCell::new_with(Some(())),
                roots: ArcSwap::from_pointee(set),
            }),
        }
    }

    /// Current roots, loading the defaults first if needed.
    pub async fn snapshot(&self) -> Arc<RootSet> {
        self.ensure_defaults().await;
        self.inner.roots.load_full()
    }

    /// Trust `cert` for the rest of the process; returns false if it was already trusted.
    pub async fn add_trusted(&self, cert: Certificate) -> bool {
        self.ensure_defaults().await;
        if self.inner.roots.load().contains(&cert) {
            return false;
        }

        let subject = cert.subject();
        self.inner.roots.rcu(|current| {
            let mut next = RootSet::clone(current);
            if next.insert(cert.clone()) {
                next.elevated.push(cert.clone());
            }
            next
        });
        info!(subject = %subject, "added trusted root");
        true
    }

    async fn ensure_defaults(&self) {
        self.inner
            .defaults
            .get_or_init(|| async {
                let certs = load_bundles(&self.inner.sources).await;
                let count = certs.len();
                self.inner.roots.rcu(|current| {
                    let mut next = RootSet::clone(current);
                    for cert in &certs {
                        next.insert(cert.clone());
                    }
                    next
                });
                info!(roots = count, "loaded default trust store");
            })
            .await;
    }
}

/// Read every certificate from bundle files and certificate directories.
///
/// Unreadable sources are logged and skipped.
async fn load_bundles(sources: &[PathBuf]) -> Vec<Certificate> {
    let mut certs = Vec::new();

    for path in sources {
        if !path.exists() {
            debug!(path = %path.display(), "CA store path not found, skipping");
            continue;
        }

        if path.is_file() {
            match parse_pem_bundle(path).await {
                Ok(found) => certs.extend(found),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to parse CA bundle"),
            }
        } else if path.is_dir() {
            match parse_cert_directory(path).await {
                Ok(found) => certs.extend(found),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to scan cert directory"),
            }
        }
    }

    certs
}

/// Parse a PEM bundle, skipping certificates that do not parse.
async fn parse_pem_bundle(path: &Path) -> Result<Vec<Certificate>> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|e| DaneError::read(path, &e))?;
    let blocks = pem::parse_many(&content).map_err(|e| DaneError::PemDecode {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut certs = Vec::new();
    for block in blocks {
        if block.tag() != "CERTIFICATE" {
            continue;
        }
        match Certificate::from_der(block.into_contents()) {
            Ok(cert) => certs.push(cert),
            Err(e) => debug!(path = %path.display(), error = %e, "skipping cert in bundle"),
        }
    }
    Ok(certs)
}

/// Parse all .pem / .crt / .cer files in a directory.
async fn parse_cert_directory(dir: &Path) -> Result<Vec<Certificate>> {
    let mut certs = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| DaneError::read(dir, &e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DaneError::read(dir, &e))?
    {
        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !matches!(ext, "pem" | "crt" | "cer") {
            continue;
        }
        match parse_pem_bundle(&path).await {
            Ok(found) => certs.extend(found),
            Err(e) => debug!(path = %path.display(), error = %e, "skipping cert file"),
        }
    }

    Ok(certs)
}
