//! Wallet name resolution with DNS server failover.
//!
//! A resolve issues two authenticated TXT lookups: the currency list at
//! `_wallet.<label>.` and the currency payload at
//! `_<currency>._wallet.<label>.`. A retryable lookup failure on either
//! restarts both on the next backup server; the failover cursor lives only
//! for the duration of one call.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{debug, info, warn};
use walletname_core::{
    names, scheme_for_currency, DecodedPayload, DnssecLookup, LookupError, PaymentTarget,
    PaymentUri, RecordKind, ResolverConfig, Result, WalletNameError, WalletNameQuery,
};
use walletname_dane::{TlsCertificateFetcher, TlsaValidator, TrustStore};
use walletname_dns::DnssecResolver;

use crate::endpoint::{EndpointRequest, EndpointResolver, HttpsEndpointResolver};

/// A successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The normalized query that was resolved
    pub query: WalletNameQuery,
    /// Where to send funds
    pub target: PaymentTarget,
    /// DNS server that produced the authenticated answers
    pub dns_server: SocketAddr,
    /// Number of backup servers switched to before succeeding
    pub failovers: usize,
}

/// Resolves wallet names to payment targets.
///
/// Safe to share between tasks; calls keep no state on the resolver.
#[derive(Clone)]
pub struct WalletNameResolver {
    lookup: Arc<dyn DnssecLookup>,
    endpoint: Arc<dyn EndpointResolver>,
}

impl std::fmt::Debug for WalletNameResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletNameResolver")
            .field("servers", self.lookup.servers())
            .finish_non_exhaustive()
    }
}

impl WalletNameResolver {
    /// Build a resolver from configuration with the default collaborators.
    pub fn new(config: ResolverConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Create a builder for custom collaborators
    #[must_use]
    pub fn builder(config: ResolverConfig) -> WalletNameResolverBuilder {
        WalletNameResolverBuilder::new(config)
    }

    /// Resolve `label` for `currency`; both are matched case-insensitively.
    pub async fn resolve(
        &self,
        label: &str,
        currency: &str,
        verify_endpoint: bool,
    ) -> Result<Resolution> {
        let query = WalletNameQuery::new(label, currency, verify_endpoint)?;
        self.resolve_query(&query).await
    }

    /// Resolve an already normalized query.
    pub async fn resolve_query(&self, query: &WalletNameQuery) -> Result<Resolution> {
        let servers = self.lookup.servers();
        let mut active = servers.primary().ok_or(LookupError::NoServers)?;
        let mut cursor = 0;

        let payload = loop {
            match self.lookup_payload(query, active).await {
                Ok(payload) => break payload,
                Err(e) if e.is_retryable() && cursor < servers.backups().len() => {
                    let backup = servers.select_backup(cursor);
                    cursor += 1;
                    warn!(
                        label = query.label(),
                        server = %active,
                        backup = %backup,
                        error = %e,
                        "DNSSEC lookup failed, switching to backup DNS server"
                    );
                    active = backup;
                }
                Err(e) => return Err(e),
            }
        };

        let target = self.interpret(query, active, payload).await?;
        info!(
            label = query.label(),
            currency = query.currency(),
            server = %active,
            failovers = cursor,
            "resolved wallet name"
        );

        Ok(Resolution {
            query: query.clone(),
            target,
            dns_server: active,
            failovers: cursor,
        })
    }

    /// Both TXT lookups against one server.
    async fn lookup_payload(
        &self,
        query: &WalletNameQuery,
        server: SocketAddr,
    ) -> Result<DecodedPayload> {
        let list = self
            .txt(server, &names::wallet_list_name(query.label()))
            .await?;
        if list.is_empty() {
            return Err(WalletNameError::NoCurrencyList);
        }

        if !list.split_whitespace().any(|code| code == query.currency()) {
            return Err(WalletNameError::CurrencyNotAvailable {
                currency: query.currency().to_string(),
            });
        }

        let raw = self
            .txt(
                server,
                &names::currency_record_name(query.label(), query.currency()),
            )
            .await?;
        if raw.is_empty() {
            return Err(WalletNameError::CurrencyNotAvailable {
                currency: query.currency().to_string(),
            });
        }

        Ok(DecodedPayload::decode(&raw))
    }

    /// Text of the first authenticated TXT record at `name`, empty if there is none.
    async fn txt(&self, server: SocketAddr, name: &str) -> Result<String> {
        debug!(name, server = %server, "TXT lookup");
        let records = self.lookup.lookup(server, name, RecordKind::Txt).await?;
        Ok(records
            .into_iter()
            .next()
            .map(|record| record.text.trim().to_string())
            .unwrap_or_default())
    }

    async fn interpret(
        &self,
        query: &WalletNameQuery,
        server: SocketAddr,
        payload: DecodedPayload,
    ) -> Result<PaymentTarget> {
        match payload {
            DecodedPayload::IndirectionUrl(url) => {
                let request = EndpointRequest {
                    url,
                    currency: query.currency().to_string(),
                    verify: query.verify_endpoint(),
                    dns_server: server,
                };
                self.endpoint.resolve_endpoint(&request).await
            }
            DecodedPayload::DirectAddress(text) => {
                direct_target(query.currency(), &text).map(PaymentTarget::Uri)
            }
        }
    }
}

/// Interpret a direct payload, retrying once as `<scheme>:<payload>`.
fn direct_target(currency: &str, payload: &str) -> Result<PaymentUri> {
    if let Ok(uri) = PaymentUri::parse(payload) {
        return Ok(uri);
    }

    let prefixed = format!("{}:{payload}", scheme_for_currency(currency));
    PaymentUri::parse(&prefixed).map_err(|e| WalletNameError::AddressConstruction {
        payload: payload.to_string(),
        detail: e.to_string(),
    })
}

/// Builder for a [`WalletNameResolver`]
pub struct WalletNameResolverBuilder {
    config: ResolverConfig,
    lookup: Option<Arc<dyn DnssecLookup>>,
    endpoint: Option<Arc<dyn EndpointResolver>>,
    trust_store: Option<TrustStore>,
}

impl WalletNameResolverBuilder {
    /// Start from `config`
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            lookup: None,
            endpoint: None,
            trust_store: None,
        }
    }

    /// Use a custom DNSSEC lookup instead of querying the configured servers
    #[must_use]
    pub fn lookup(mut self, lookup: Arc<dyn DnssecLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Use a custom endpoint resolver for indirection URLs
    #[must_use]
    pub fn endpoint(mut self, endpoint: Arc<dyn EndpointResolver>) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Share an existing trust store with the TLSA validator
    #[must_use]
    pub fn trust_store(mut self, store: TrustStore) -> Self {
        self.trust_store = Some(store);
        self
    }

    /// Build the resolver.
    ///
    /// Fails if the trust anchor cannot be loaded, no DNS server is known,
    /// or the HTTP client cannot be created.
    pub fn build(self) -> Result<WalletNameResolver> {
        let lookup: Arc<dyn DnssecLookup> = match self.lookup {
            Some(lookup) => lookup,
            None => Arc::new(DnssecResolver::new(&self.config)?),
        };

        let endpoint: Arc<dyn EndpointResolver> = match self.endpoint {
            Some(endpoint) => endpoint,
            None => {
                let store = self
                    .trust_store
                    .unwrap_or_else(|| TrustStore::new(self.config.ca_bundle_paths.clone()));
                let fetcher = TlsCertificateFetcher::new(self.config.fetch_timeout())?;
                let validator = TlsaValidator::new(Arc::clone(&lookup), Arc::new(fetcher), store);
                Arc::new(HttpsEndpointResolver::new(validator, &self.config)?)
            }
        };

        Ok(WalletNameResolver { lookup, endpoint })
    }
}
