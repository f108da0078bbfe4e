//! Retrieval of the certificate chain an endpoint presents.
//!
//! The handshake accepts any chain so it can be judged against TLSA data
//! afterwards. Handshake signatures are still verified, so the peer must
//! hold the private key of the leaf it presents.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

use crate::cert::Certificate;
use crate::error::{DaneError, Result};

/// Fetches the certificate chain presented by `host:port`.
#[async_trait]
pub trait CertificateFetcher: Send + Sync {
    /// Presented chain, leaf first.
    async fn fetch_chain(&self, host: &str, port: u16) -> Result<Vec<Certificate>>;
}

/// Captures the peer chain during a TLS handshake.
#[derive(Debug)]
struct CaptureVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for CaptureVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// TLS fetcher backed by tokio-rustls.
#[derive(Clone)]
pub struct TlsCertificateFetcher {
    connector: TlsConnector,
    timeout: Duration,
}

impl std::fmt::Debug for TlsCertificateFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsCertificateFetcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl TlsCertificateFetcher {
    /// Create a fetcher with a connect-and-handshake timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()
            .map_err(|e| DaneError::handshake("-", 0, e))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(CaptureVerifier { provider }))
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            timeout,
        })
    }
}

#[async_trait]
impl CertificateFetcher for TlsCertificateFetcher {
    async fn fetch_chain(&self, host: &str, port: u16) -> Result<Vec<Certificate>> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| DaneError::handshake(host, port, e))?;

        let handshake = async {
            let tcp = TcpStream::connect((host, port)).await?;
            self.connector.connect(server_name, tcp).await
        };
        let tls = tokio::time::timeout(self.timeout, handshake)
            .await
            .map_err(|_| DaneError::handshake(host, port, "timed out"))?
            .map_err(|e| DaneError::handshake(host, port, e))?;

        let (_, session) = tls.get_ref();
        let chain = session
            .peer_certificates()
            .ok_or_else(|| DaneError::handshake(host, port, "no certificate presented"))?
            .iter()
            .map(|der| Certificate::from_der(der.as_ref().to_vec()))
            .collect::<Result<Vec<_>>>()?;

        debug!(host, port, certificates = chain.len(), "captured presented chain");
        Ok(chain)
    }
}
