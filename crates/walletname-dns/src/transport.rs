//! DNS message transport to a single server.
//!
//! Queries go out over hickory's UDP client stream; truncated answers are
//! repeated over TCP. [`ServerHandle`] adapts a transport to hickory's
//! [`DnsHandle`] so the DNSSEC validator can issue its DNSKEY and DS
//! sub-queries against the same server.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use hickory_proto::op::Query;
use hickory_proto::runtime::{TokioRuntimeProvider, TokioTime};
use hickory_proto::rr::{Name, RecordType};
use hickory_proto::tcp::TcpClientStream;
use hickory_proto::udp::UdpClientStream;
use hickory_proto::xfer::{
    DnsExchange, DnsHandle, DnsMultiplexer, DnsRequest, DnsRequestSender, DnsResponse,
    DnsResponseStream, FirstAnswer,
};
use hickory_proto::{ProtoError, ProtoErrorKind};
use tracing::debug;

/// Sends one DNS request to a server and returns its response.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    /// Exchange `request` with `server`.
    async fn send(&self, server: SocketAddr, request: DnsRequest)
        -> Result<DnsResponse, ProtoError>;
}

/// Returns true if `e` means the server could not be reached at all.
pub fn is_unreachable(e: &ProtoError) -> bool {
    matches!(
        e.kind(),
        ProtoErrorKind::Timeout
            | ProtoErrorKind::Io(_)
            | ProtoErrorKind::NoConnections
            | ProtoErrorKind::Busy
    )
}

/// UDP transport with TCP fallback for truncated answers.
#[derive(Debug, Clone)]
pub struct HickoryTransport {
    timeout: Duration,
}

impl HickoryTransport {
    /// Create a transport with a per-attempt timeout.
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn udp(
        &self,
        server: SocketAddr,
        request: DnsRequest,
    ) -> Result<DnsResponse, ProtoError> {
        let mut stream = UdpClientStream::builder(server, TokioRuntimeProvider::new())
            .with_timeout(Some(self.timeout))
            .build()
            .await?;
        stream.send_message(request).first_answer().await
    }

    async fn tcp(
        &self,
        server: SocketAddr,
        request: DnsRequest,
    ) -> Result<DnsResponse, ProtoError> {
        let (connect, sender) =
            TcpClientStream::new(server, None, Some(self.timeout), TokioRuntimeProvider::new());
        let multiplexer = DnsMultiplexer::with_timeout(connect, sender, self.timeout, None);
        let (exchange, background) =
            DnsExchange::connect::<_, _, TokioTime>(multiplexer).await?;
        tokio::spawn(background);
        exchange.send(request).first_answer().await
    }
}

#[async_trait]
impl DnsTransport for HickoryTransport {
    async fn send(
        &self,
        server: SocketAddr,
        request: DnsRequest,
    ) -> Result<DnsResponse, ProtoError> {
        let response = self.udp(server, request.clone()).await?;
        if response.truncated() {
            debug!(server = %server, "truncated UDP answer, retrying over TCP");
            return self.tcp(server, request).await;
        }
        Ok(response)
    }
}

type SeenKey = (Name, RecordType);

/// [`DnsHandle`] bound to one server for the duration of one lookup.
///
/// Each question goes on the wire once; repeats within the lookup are
/// answered from the responses already received.
#[derive(Clone)]
pub struct ServerHandle {
    transport: Arc<dyn DnsTransport>,
    server: SocketAddr,
    seen: Arc<Mutex<HashMap<SeenKey, DnsResponse>>>,
}

impl ServerHandle {
    /// Handle sending to `server` over `transport`.
    pub fn new(transport: Arc<dyn DnsTransport>, server: SocketAddr) -> Self {
        Self {
            transport,
            server,
            seen: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Server this handle talks to
    pub const fn server(&self) -> SocketAddr {
        self.server
    }

    /// Send `request`, or replay the response to an identical question.
    pub async fn exchange(&self, request: DnsRequest) -> Result<DnsResponse, ProtoError> {
        let key = request.queries().first().map(seen_key);
        if let Some(hit) = key.as_ref().and_then(|k| self.lookup_seen(k)) {
            return Ok(hit);
        }

        let response = self.transport.send(self.server, request).await?;
        if let Some(key) = key {
            self.seen
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key, response.clone());
        }
        Ok(response)
    }

    fn lookup_seen(&self, key: &SeenKey) -> Option<DnsResponse> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl std::fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandle")
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

fn seen_key(query: &Query) -> SeenKey {
    (query.name().to_lowercase(), query.query_type())
}

impl DnsHandle for ServerHandle {
    type Response = DnsResponseStream;

    fn send<R: Into<DnsRequest> + Unpin + Send + 'static>(&self, request: R) -> Self::Response {
        let handle = self.clone();
        let request = request.into();
        DnsResponseStream::from(Box::pin(async move { handle.exchange(request).await }))
    }
}
