//! DNSSEC-validating resolver.
//!
//! An answer is trusted only when the upstream server sets the AD flag,
//! reports NOERROR, and every answer record validates to `Secure` along a
//! signature chain that starts at the configured trust anchor. Rejected
//! answers may carry an explanation as a TXT record owned by the root name
//! in the private validation-reason class.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use hickory_proto::dnssec::{DnssecDnsHandle, TrustAnchors};
use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use hickory_proto::xfer::{DnsHandle, DnsRequest, DnsRequestOptions, FirstAnswer};
use hickory_proto::ProtoError;
use tracing::{debug, warn};
use walletname_core::{
    DnsServerList, DnssecLookup, LookupError, RecordKind, ResolvedRecord, ResolverConfig,
};

use crate::system::configured_servers;
use crate::transport::{is_unreachable, DnsTransport, HickoryTransport, ServerHandle};
use crate::trust_anchor::{TrustAnchor, TrustAnchorSource};

/// DNS class carrying validator explanations in the additional section.
pub const VALIDATION_REASON_CLASS: u16 = 65280;

/// Advertised EDNS payload size.
const MAX_PAYLOAD: u16 = 4096;

/// DNSSEC-validating lookups against an explicit server list.
#[derive(Clone)]
pub struct DnssecResolver {
    servers: DnsServerList,
    anchor: TrustAnchorSource,
    transport: Arc<dyn DnsTransport>,
}

impl std::fmt::Debug for DnssecResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnssecResolver")
            .field("servers", &self.servers)
            .field("anchor", &self.anchor)
            .finish_non_exhaustive()
    }
}

impl DnssecResolver {
    /// Build a resolver from configuration, discovering system servers if none are listed.
    pub fn new(config: &ResolverConfig) -> Result<Self, LookupError> {
        let servers = configured_servers(config)?;
        let anchor = TrustAnchorSource::from_config(config);
        // Fail early on an unusable anchor; it is re-read before each query.
        anchor.load()?;

        Ok(Self {
            servers,
            anchor,
            transport: Arc::new(HickoryTransport::new(config.query_timeout())),
        })
    }

    /// Build a resolver over a custom transport.
    pub fn with_transport(
        servers: DnsServerList,
        anchor: TrustAnchorSource,
        transport: impl DnsTransport + 'static,
    ) -> Self {
        Self {
            servers,
            anchor,
            transport: Arc::new(transport),
        }
    }

    /// First secure record of `kind` for `name`.
    pub async fn resolve(
        &self,
        server: SocketAddr,
        name: &str,
        kind: RecordKind,
    ) -> Result<ResolvedRecord, LookupError> {
        self.resolve_all(server, name, kind)
            .await?
            .into_iter()
            .next()
            .ok_or(LookupError::NoAnswer)
    }

    /// Every secure record of `kind` for `name`, in answer order.
    pub async fn resolve_all(
        &self,
        server: SocketAddr,
        name: &str,
        kind: RecordKind,
    ) -> Result<Vec<ResolvedRecord>, LookupError> {
        let anchor = self.anchor.load().map_err(|e| {
            warn!(error = %e, "trust anchor unusable");
            LookupError::from(e)
        })?;

        let query = Query::query(parse_name(name)?, record_type(kind));
        let handle = ServerHandle::new(Arc::clone(&self.transport), server);

        debug!(name = %query.name(), kind = %kind, server = %server, "DNSSEC query");
        let response = handle
            .exchange(dnssec_request(query.clone()))
            .await
            .map_err(|e| transport_error(server, &e))?;
        check_authenticated(&response, query.query_type())?;

        let trusted = anchored_keys(&handle, &anchor).await?;
        let validated = DnssecDnsHandle::with_trust_anchor(handle, Arc::new(trusted))
            .lookup(query.clone(), DnsRequestOptions::default())
            .first_answer()
            .await
            .map_err(|e| {
                warn!(server = %server, name = %query.name(), error = %e, "DNSSEC validation failed");
                LookupError::Bogus(e.to_string())
            })?;

        secure_answers(&validated, query.query_type())?
            .into_iter()
            .map(|record| to_resolved(record, kind))
            .collect()
    }
}

#[async_trait]
impl DnssecLookup for DnssecResolver {
    fn servers(&self) -> &DnsServerList {
        &self.servers
    }

    async fn lookup(
        &self,
        server: SocketAddr,
        name: &str,
        kind: RecordKind,
    ) -> Result<Vec<ResolvedRecord>, LookupError> {
        self.resolve_all(server, name, kind).await
    }
}

/// Keys in the server's DNSKEY set for the anchor zone that the anchor covers.
async fn anchored_keys(
    handle: &ServerHandle,
    anchor: &TrustAnchor,
) -> Result<TrustAnchors, LookupError> {
    let server = handle.server();
    let response = handle
        .exchange(dnssec_request(Query::query(
            anchor.owner().clone(),
            RecordType::DNSKEY,
        )))
        .await
        .map_err(|e| transport_error(server, &e))?;

    let trusted = anchor.anchored_keys(
        response
            .answers()
            .iter()
            .filter_map(|r| r.data().as_dnssec()?.as_dnskey()),
    );
    if trusted.is_empty() {
        warn!(server = %server, key_tag = anchor.key_tag(), "anchor key missing from DNSKEY set");
        return Err(LookupError::AnchorMismatch { server });
    }
    debug!(server = %server, keys = trusted.len(), "anchored DNSKEYs");
    Ok(trusted)
}

fn parse_name(name: &str) -> Result<Name, LookupError> {
    let fqdn = walletname_core::names::ensure_dot(name);
    Name::from_ascii(&fqdn).map_err(|e| LookupError::InvalidName {
        name: fqdn,
        reason: e.to_string(),
    })
}

const fn record_type(kind: RecordKind) -> RecordType {
    match kind {
        RecordKind::Txt => RecordType::TXT,
        RecordKind::Tlsa => RecordType::TLSA,
    }
}

/// Recursive query with the AD and DO bits set.
fn dnssec_request(query: Query) -> DnsRequest {
    let mut message = Message::new();
    message
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .set_authentic_data(true);
    message.add_query(query);

    let mut edns = Edns::new();
    edns.set_max_payload(MAX_PAYLOAD);
    edns.enable_dnssec();
    message.set_edns(edns);
    DnsRequest::new(message, DnsRequestOptions::default())
}

fn transport_error(server: SocketAddr, e: &ProtoError) -> LookupError {
    if is_unreachable(e) {
        warn!(server = %server, error = %e, "DNS server unreachable");
        LookupError::Unreachable {
            server,
            reason: e.to_string(),
        }
    } else {
        LookupError::Malformed(e.to_string())
    }
}

/// Accept only authenticated NOERROR responses that answer the question.
fn check_authenticated(response: &Message, record_type: RecordType) -> Result<(), LookupError> {
    let rcode = response.response_code();
    if !response.header().authentic_data() || rcode != ResponseCode::NoError {
        return Err(validation_reason(response).map_or_else(
            || LookupError::Unauthenticated {
                rcode: rcode.to_string(),
            },
            LookupError::ValidationFailed,
        ));
    }

    if response
        .answers()
        .iter()
        .any(|r| r.record_type() == record_type)
    {
        Ok(())
    } else {
        Err(LookupError::NoAnswer)
    }
}

/// Answers of `record_type` after validation; all of them must be secure.
fn secure_answers(validated: &Message, record_type: RecordType) -> Result<Vec<&Record>, LookupError> {
    let answers: Vec<&Record> = validated
        .answers()
        .iter()
        .filter(|r| r.record_type() == record_type)
        .collect();
    if answers.is_empty() {
        return Err(LookupError::Bogus(format!(
            "no {record_type} answer survived validation"
        )));
    }

    if let Some(record) = answers.iter().find(|r| !r.proof().is_secure()) {
        warn!(name = %record.name(), proof = %record.proof(), "answer is not DNSSEC-secure");
        return Err(LookupError::Bogus(format!(
            "{} {record_type} is {}",
            record.name(),
            record.proof()
        )));
    }
    Ok(answers)
}

/// Explanation attached by the validator to a rejected answer.
fn validation_reason(response: &Message) -> Option<String> {
    response
        .additionals()
        .iter()
        .filter(|r| r.name().is_root() && u16::from(r.dns_class()) == VALIDATION_REASON_CLASS)
        .find_map(|r| match r.data() {
            RData::TXT(txt) => txt
                .txt_data()
                .first()
                .map(|s| String::from_utf8_lossy(s).into_owned()),
            _ => None,
        })
}

fn to_resolved(record: &Record, kind: RecordKind) -> Result<ResolvedRecord, LookupError> {
    let text = match record.data() {
        RData::TXT(txt) => txt
            .txt_data()
            .iter()
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .collect::<Vec<_>>()
            .join(" "),
        RData::TLSA(tlsa) => tlsa.to_string(),
        other => {
            return Err(LookupError::Malformed(format!(
                "unexpected {} answer",
                other.record_type()
            )))
        }
    };

    Ok(ResolvedRecord {
        name: record.name().to_string(),
        kind,
        text: text.replace('"', ""),
        data: record.data().clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::{SystemTime, UNIX_EPOCH};

    use hickory_proto::dnssec::crypto::EcdsaSigningKey;
    use hickory_proto::dnssec::rdata::{DNSSECRData, DNSKEY, RRSIG};
    use hickory_proto::dnssec::{Algorithm, DigestType, SigningKey, TBS};
    use hickory_proto::rr::rdata::tlsa::{CertUsage, Matching, Selector, TLSA};
    use hickory_proto::rr::rdata::TXT;
    use hickory_proto::rr::DNSClass;
    use hickory_proto::xfer::DnsResponse;
    use hickory_proto::ProtoErrorKind;

    /// A signing key for the root zone, standing in for the real KSK.
    struct TestZone {
        key: EcdsaSigningKey,
        dnskey: DNSKEY,
    }

    impl TestZone {
        fn new() -> Self {
            let pkcs8 = EcdsaSigningKey::generate_pkcs8(Algorithm::ECDSAP256SHA256).unwrap();
            let key = EcdsaSigningKey::from_pkcs8(&pkcs8, Algorithm::ECDSAP256SHA256).unwrap();
            let dnskey = DNSKEY::new(true, true, false, key.to_public_key().unwrap());
            Self { key, dnskey }
        }

        fn key_tag(&self) -> u16 {
            self.dnskey.calculate_key_tag().unwrap()
        }

        fn anchor(&self) -> TrustAnchorSource {
            let digest = self
                .dnskey
                .to_digest(&Name::root(), DigestType::SHA256)
                .unwrap();
            TrustAnchorSource::Inline(format!(
                ". IN DS {} 13 2 {}",
                self.key_tag(),
                hex::encode_upper(digest.as_ref())
            ))
        }

        /// RRSIG over `rrset`, signed by this zone's key.
        fn sign(&self, rrset: &[Record]) -> Record {
            let first = &rrset[0];
            let now = u32::try_from(
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap()
                    .as_secs(),
            )
            .unwrap();
            let rrsig = |sig| {
                RRSIG::new(
                    first.record_type(),
                    Algorithm::ECDSAP256SHA256,
                    first.name().num_labels(),
                    first.ttl(),
                    now + 3600,
                    now - 60,
                    self.key_tag(),
                    Name::root(),
                    sig,
                )
            };
            let unsigned = rrsig(Vec::new());
            let tbs = TBS::from_sig(first.name(), DNSClass::IN, &unsigned, rrset.iter()).unwrap();
            let signature = self.key.sign(&tbs).unwrap();
            Record::from_rdata(
                first.name().clone(),
                first.ttl(),
                RData::DNSSEC(DNSSECRData::RRSIG(rrsig(signature))),
            )
        }

        /// Signed root DNSKEY answer.
        fn keys(&self) -> Message {
            let dnskey = Record::from_rdata(
                Name::root(),
                172_800,
                RData::DNSSEC(DNSSECRData::DNSKEY(self.dnskey.clone())),
            );
            let signature = self.sign(std::slice::from_ref(&dnskey));
            let mut message = response(true, ResponseCode::NoError);
            message.add_answer(dnskey);
            message.add_answer(signature);
            message
        }

        /// Signed answer holding `rrset`.
        fn answer(&self, rrset: Vec<Record>) -> Message {
            let signature = self.sign(&rrset);
            let mut message = response(true, ResponseCode::NoError);
            message.add_answers(rrset);
            message.add_answer(signature);
            message
        }
    }

    /// Serves scripted answers by question and records what was asked.
    #[derive(Default)]
    struct ZoneTransport {
        replies: Mutex<HashMap<(Name, RecordType), Message>>,
        asked: Mutex<Vec<(RecordType, String)>>,
        down: bool,
    }

    impl ZoneTransport {
        fn serve(&self, name: &str, record_type: RecordType, reply: Message) {
            self.replies
                .lock()
                .unwrap()
                .insert((Name::from_ascii(name).unwrap(), record_type), reply);
        }

        fn asked(&self) -> Vec<(RecordType, String)> {
            self.asked.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DnsTransport for Arc<ZoneTransport> {
        async fn send(
            &self,
            _server: SocketAddr,
            request: DnsRequest,
        ) -> Result<DnsResponse, ProtoError> {
            let query = request.queries()[0].clone();
            self.asked
                .lock()
                .unwrap()
                .push((query.query_type(), query.name().to_string()));
            if self.down {
                return Err(ProtoErrorKind::Timeout.into());
            }
            assert!(request.header().authentic_data());
            assert!(request
                .extensions()
                .as_ref()
                .is_some_and(|edns| edns.flags().dnssec_ok));

            let mut reply = self
                .replies
                .lock()
                .unwrap()
                .get(&(query.name().clone(), query.query_type()))
                .cloned()
                .unwrap_or_else(|| response(false, ResponseCode::NXDomain));
            reply.set_id(request.id());
            reply.add_query(query);
            DnsResponse::from_message(reply)
        }
    }

    fn server() -> SocketAddr {
        "192.0.2.53:53".parse().unwrap()
    }

    fn response(ad: bool, rcode: ResponseCode) -> Message {
        let mut message = Message::new();
        message.set_message_type(MessageType::Response);
        message.set_authentic_data(ad);
        message.set_response_code(rcode);
        message
    }

    fn txt(name: &str, strings: &[&str]) -> Record {
        Record::from_rdata(
            Name::from_ascii(name).unwrap(),
            300,
            RData::TXT(TXT::new(strings.iter().map(|s| (*s).to_string()).collect())),
        )
    }

    fn unsigned(rrset: Vec<Record>) -> Message {
        let mut message = response(true, ResponseCode::NoError);
        message.add_answers(rrset);
        message
    }

    fn resolver(transport: &Arc<ZoneTransport>, anchor: TrustAnchorSource) -> DnssecResolver {
        DnssecResolver::with_transport(
            DnsServerList::new([server()]),
            anchor,
            Arc::clone(transport),
        )
    }

    fn signed_zone() -> (TestZone, Arc<ZoneTransport>) {
        let zone = TestZone::new();
        let transport = Arc::new(ZoneTransport::default());
        transport.serve(".", RecordType::DNSKEY, zone.keys());
        (zone, transport)
    }

    #[tokio::test]
    async fn signed_txt_is_returned_without_quotes() {
        let (zone, transport) = signed_zone();
        transport.serve(
            "_wallet.a.b.",
            RecordType::TXT,
            zone.answer(vec![txt("_wallet.a.b.", &["\"btc ltc\""])]),
        );

        let record = resolver(&transport, zone.anchor())
            .resolve(server(), "_wallet.a.b", RecordKind::Txt)
            .await
            .unwrap();
        assert_eq!(record.text, "btc ltc");
        assert_eq!(record.name, "_wallet.a.b.");

        // One wire query per question; the validator reuses both answers.
        assert_eq!(
            transport.asked(),
            vec![
                (RecordType::TXT, "_wallet.a.b.".to_string()),
                (RecordType::DNSKEY, ".".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn multi_string_txt_is_joined() {
        let (zone, transport) = signed_zone();
        transport.serve(
            "_btc._wallet.a.b.",
            RecordType::TXT,
            zone.answer(vec![txt("_btc._wallet.a.b.", &["aHR0cHM6", "Ly9leGFt"])]),
        );

        let record = resolver(&transport, zone.anchor())
            .resolve(server(), "_btc._wallet.a.b.", RecordKind::Txt)
            .await
            .unwrap();
        assert_eq!(record.text, "aHR0cHM6 Ly9leGFt");
    }

    #[tokio::test]
    async fn signed_tlsa_is_typed() {
        let (zone, transport) = signed_zone();
        let tlsa = TLSA::new(CertUsage::DaneEe, Selector::Spki, Matching::Sha256, vec![0xab; 32]);
        transport.serve(
            "_443._tcp.pay.a.b.",
            RecordType::TLSA,
            zone.answer(vec![Record::from_rdata(
                Name::from_ascii("_443._tcp.pay.a.b.").unwrap(),
                300,
                RData::TLSA(tlsa.clone()),
            )]),
        );

        let records = resolver(&transport, zone.anchor())
            .resolve_all(server(), "_443._tcp.pay.a.b.", RecordKind::Tlsa)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_tlsa(), Some(&tlsa));
    }

    #[tokio::test]
    async fn forged_answer_with_ad_flag_is_rejected() {
        let (zone, transport) = signed_zone();
        transport.serve(
            "_btc._wallet.a.b.",
            RecordType::TXT,
            unsigned(vec![txt("_btc._wallet.a.b.", &["1AttackerAddress"])]),
        );

        let err = resolver(&transport, zone.anchor())
            .resolve(server(), "_btc._wallet.a.b.", RecordKind::Txt)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Bogus(_)), "{err:?}");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn signature_from_unanchored_key_is_rejected() {
        let (zone, transport) = signed_zone();
        let attacker = TestZone::new();
        transport.serve(
            "_btc._wallet.a.b.",
            RecordType::TXT,
            attacker.answer(vec![txt("_btc._wallet.a.b.", &["1AttackerAddress"])]),
        );

        let err = resolver(&transport, zone.anchor())
            .resolve(server(), "_btc._wallet.a.b.", RecordKind::Txt)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Bogus(_)), "{err:?}");
    }

    #[tokio::test]
    async fn unauthenticated_answer_is_rejected() {
        let (zone, transport) = signed_zone();
        let mut reply = zone.answer(vec![txt("_wallet.a.b.", &["btc"])]);
        reply.set_authentic_data(false);
        transport.serve("_wallet.a.b.", RecordType::TXT, reply);

        let err = resolver(&transport, zone.anchor())
            .resolve(server(), "_wallet.a.b.", RecordKind::Txt)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Unauthenticated { .. }));
        assert!(err.is_retryable());
        assert_eq!(transport.asked().len(), 1);
    }

    #[tokio::test]
    async fn authenticated_error_rcode_is_rejected() {
        let (zone, transport) = signed_zone();
        transport.serve(
            "_wallet.a.b.",
            RecordType::TXT,
            response(true, ResponseCode::NXDomain),
        );

        let err = resolver(&transport, zone.anchor())
            .resolve(server(), "_wallet.a.b.", RecordKind::Txt)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn validation_reason_is_surfaced() {
        let (zone, transport) = signed_zone();
        let mut reply = response(false, ResponseCode::ServFail);
        let mut reason = Record::from_rdata(
            Name::root(),
            0,
            RData::TXT(TXT::new(vec![
                "validation failure <_wallet.a.b. TXT IN>: no signatures".to_string(),
            ])),
        );
        reason.set_dns_class(DNSClass::Unknown(VALIDATION_REASON_CLASS));
        reply.add_additional(reason);
        transport.serve("_wallet.a.b.", RecordType::TXT, reply);

        let err = resolver(&transport, zone.anchor())
            .resolve(server(), "_wallet.a.b.", RecordKind::Txt)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LookupError::ValidationFailed(
                "validation failure <_wallet.a.b. TXT IN>: no signatures".to_string()
            )
        );
    }

    #[tokio::test]
    async fn missing_answer_is_a_failure() {
        let (zone, transport) = signed_zone();
        transport.serve(
            "_wallet.a.b.",
            RecordType::TXT,
            response(true, ResponseCode::NoError),
        );

        let err = resolver(&transport, zone.anchor())
            .resolve(server(), "_wallet.a.b.", RecordKind::Txt)
            .await
            .unwrap_err();
        assert_eq!(err, LookupError::NoAnswer);
        assert_eq!(err.to_string(), "no query answer received");
    }

    #[tokio::test]
    async fn transport_failure_names_the_server() {
        let zone = TestZone::new();
        let transport = Arc::new(ZoneTransport {
            down: true,
            ..ZoneTransport::default()
        });

        let err = resolver(&transport, zone.anchor())
            .resolve(server(), "_wallet.a.b.", RecordKind::Txt)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Unreachable { server: s, .. } if s == server()));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn foreign_root_keys_are_rejected() {
        let (zone, transport) = signed_zone();
        transport.serve(
            "_wallet.a.b.",
            RecordType::TXT,
            zone.answer(vec![txt("_wallet.a.b.", &["btc"])]),
        );

        let err = resolver(&transport, TestZone::new().anchor())
            .resolve(server(), "_wallet.a.b.", RecordKind::Txt)
            .await
            .unwrap_err();
        assert_eq!(err, LookupError::AnchorMismatch { server: server() });
        assert!(err.is_retryable());
        assert_eq!(transport.asked().len(), 2);
    }

    #[tokio::test]
    async fn bad_anchor_fails_before_any_query() {
        let (_zone, transport) = signed_zone();
        let err = resolver(&transport, TrustAnchorSource::Inline("not an anchor".into()))
            .resolve(server(), "_wallet.a.b.", RecordKind::Txt)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::TrustAnchor(_)));
        assert!(!err.is_retryable());
        assert!(transport.asked().is_empty());
    }

    #[tokio::test]
    async fn invalid_name_is_not_retryable() {
        let (zone, transport) = signed_zone();
        let long_label = format!("{}.b", "x".repeat(64));
        let err = resolver(&transport, zone.anchor())
            .resolve(server(), &long_label, RecordKind::Txt)
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::InvalidName { .. }));
        assert!(!err.is_retryable());
    }
}
