//! Resolution of indirection URLs into payment targets.
//!
//! When verification is requested the endpoint's certificate is checked
//! against its DNSSEC-authenticated TLSA records before anything is fetched.
//! A root that only DANE vouches for is trusted by the client used for that
//! single fetch, unless the resolver is configured to keep such roots.
//!
//! Every fetch trusts exactly the roots of the shared [`TrustStore`]
//! snapshot, the same set the chain validator consults.
//!
//! [`TrustStore`]: walletname_dane::TrustStore

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::{debug, info, warn};
use url::Url;
use walletname_core::{
    PaymentRequestPayload, PaymentTarget, PaymentUri, ResolverConfig, Result, WalletNameError,
};
use walletname_dane::{Certificate, DaneOutcome, TlsaValidator};

/// An indirection URL published for a wallet name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRequest {
    /// Decoded indirection URL
    pub url: Url,
    /// Lower-cased currency code the URL was published for
    pub currency: String,
    /// Require TLSA validation before fetching
    pub verify: bool,
    /// DNS server that answered the wallet name lookups; TLSA records are read from it
    pub dns_server: SocketAddr,
}

/// Turns an indirection URL into a payment target.
#[async_trait]
pub trait EndpointResolver: Send + Sync {
    /// Fetch and interpret the endpoint named by `request`.
    async fn resolve_endpoint(&self, request: &EndpointRequest) -> Result<PaymentTarget>;
}

#[derive(Debug, Clone)]
struct FetchSettings {
    timeout: Duration,
    user_agent: String,
    https_only: bool,
}

impl FetchSettings {
    /// Client trusting exactly `roots`.
    fn client<'a>(&self, roots: impl IntoIterator<Item = &'a Certificate>) -> Result<HttpClient> {
        let mut builder = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .https_only(self.https_only)
            .tls_built_in_root_certs(false);

        let mut trusted = 0_usize;
        for root in roots {
            match reqwest::Certificate::from_der(root.der()) {
                Ok(cert) => {
                    builder = builder.add_root_certificate(cert);
                    trusted += 1;
                }
                Err(e) => warn!(root = %root.subject(), error = %e, "skipping unusable root"),
            }
        }
        debug!(roots = trusted, "HTTP client built");

        builder
            .build()
            .map_err(|e| WalletNameError::Config(format!("HTTP client: {e}")))
    }
}

/// Fetches indirection URLs over HTTPS with optional TLSA validation.
#[derive(Debug, Clone)]
pub struct HttpsEndpointResolver {
    validator: TlsaValidator,
    settings: FetchSettings,
    persist_dane_roots: bool,
}

impl HttpsEndpointResolver {
    /// Create an endpoint resolver using the fetch settings of `config`.
    pub fn new(validator: TlsaValidator, config: &ResolverConfig) -> Result<Self> {
        let settings = FetchSettings {
            timeout: config.fetch_timeout(),
            user_agent: config
                .user_agent
                .clone()
                .unwrap_or_else(|| format!("walletname-rust/{}", env!("CARGO_PKG_VERSION"))),
            https_only: config.https_only,
        };

        // Surface unusable client settings at construction.
        settings.client([])?;

        Ok(Self {
            validator,
            settings,
            persist_dane_roots: config.persist_dane_roots,
        })
    }

    /// The TLSA validator consulted for verified fetches
    pub const fn validator(&self) -> &TlsaValidator {
        &self.validator
    }

    /// Client for one fetch: the trust store roots plus any root DANE asked us to trust.
    async fn client_for(&self, request: &EndpointRequest) -> Result<HttpClient> {
        let store = self.validator.trust_store();
        if !request.verify {
            debug!(url = %request.url, "TLSA validation not requested");
            return self.settings.client(store.snapshot().await.iter());
        }

        let outcome = self
            .validator
            .validate(&request.url, request.dns_server)
            .await?;

        let mut dane_root = None;
        match outcome {
            DaneOutcome::Verified => {}
            DaneOutcome::SelfSignedRoot(root) => {
                info!(url = %request.url, root = %root.subject(), "trusting DANE-asserted root");
                if self.persist_dane_roots {
                    store.add_trusted(root.clone()).await;
                }
                dane_root = Some(root);
            }
            DaneOutcome::Mismatch(reason) => {
                return Err(WalletNameError::EndpointValidation(reason));
            }
        }

        let roots = store.snapshot().await;
        let scoped = dane_root.iter().filter(|root| !roots.contains(root));
        self.settings.client(roots.iter().chain(scoped))
    }
}

#[async_trait]
impl EndpointResolver for HttpsEndpointResolver {
    async fn resolve_endpoint(&self, request: &EndpointRequest) -> Result<PaymentTarget> {
        if self.settings.https_only && request.url.scheme() != "https" {
            return Err(WalletNameError::Endpoint {
                url: request.url.to_string(),
                reason: String::from("plain HTTP endpoints are disabled"),
            });
        }

        let client = self.client_for(request).await?;
        let body = fetch(&client, &request.url).await?;
        let target = classify_response(&body)?;

        info!(
            url = %request.url,
            currency = %request.currency,
            payment_request = target.is_payment_request(),
            "resolved wallet name endpoint"
        );
        Ok(target)
    }
}

async fn fetch(client: &HttpClient, url: &Url) -> Result<Vec<u8>> {
    let failed = |e: reqwest::Error| WalletNameError::Endpoint {
        url: url.to_string(),
        reason: e.to_string(),
    };

    debug!(url = %url, "GET request");
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(failed)?
        .error_for_status()
        .map_err(failed)?;
    let body = response.bytes().await.map_err(failed)?;
    Ok(body.to_vec())
}

/// Interpret an endpoint body: a currency URI, else a serialized payment request.
pub fn classify_response(body: &[u8]) -> Result<PaymentTarget> {
    let text = String::from_utf8_lossy(body);
    let uri_error = match PaymentUri::parse(text.trim()) {
        Ok(uri) => return Ok(PaymentTarget::Uri(uri)),
        Err(e) => e,
    };

    match PaymentRequestPayload::recognize(body) {
        Ok(request) => Ok(PaymentTarget::PaymentRequest(request)),
        Err(e) => {
            debug!(error = %e, "endpoint body is not a payment request");
            Err(WalletNameError::UnrecognizedResponse {
                detail: uri_error.to_string(),
            })
        }
    }
}
