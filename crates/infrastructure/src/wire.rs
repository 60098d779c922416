//! Wire codec boundary ("Wire codec"): the only place that
//! touches `hickory_proto::op::Message`. Everywhere else in the workspace
//! carries wire bytes as `Arc<[u8]>` and the codec-agnostic
//! `ferrous_resolver_domain::RecordType`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use ferrous_resolver_domain::{RecordType, ResolverError};
use hickory_proto::op::{Edns, Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{Name, RData, Record};
use hickory_proto::serialize::binary::BinEncodable;

pub fn parse(bytes: &[u8]) -> Result<Message, ResolverError> {
    Message::from_vec(bytes).map_err(|e| ResolverError::MalformedMessage(e.to_string()))
}

pub fn to_bytes(msg: &Message) -> Result<Arc<[u8]>, ResolverError> {
    msg.to_bytes()
        .map(|v| Arc::from(v.into_boxed_slice()))
        .map_err(|e| ResolverError::MalformedMessage(e.to_string()))
}

pub fn to_domain_record_type(rt: hickory_proto::rr::RecordType) -> RecordType {
    RecordType::from_u16(u16::from(rt))
}

pub fn to_hickory_record_type(rt: RecordType) -> hickory_proto::rr::RecordType {
    hickory_proto::rr::RecordType::from(rt.as_u16())
}

/// `(name, record_type)` of the first (and, per scope, only) question.
pub fn question(msg: &Message) -> Option<(Name, RecordType)> {
    msg.queries()
        .first()
        .map(|q| (q.name().clone(), to_domain_record_type(q.query_type())))
}

pub fn question_name_lower(msg: &Message) -> Option<String> {
    question(msg).map(|(name, _)| name.to_utf8().to_ascii_lowercase())
}

pub fn is_truncated(msg: &Message) -> bool {
    msg.truncated()
}

pub fn checking_disabled(msg: &Message) -> bool {
    msg.checking_disabled()
}

pub fn is_nxdomain(msg: &Message) -> bool {
    msg.response_code() == ResponseCode::NXDomain
}

pub fn is_server_error(msg: &Message) -> bool {
    matches!(
        msg.response_code(),
        ResponseCode::ServFail | ResponseCode::Refused
    )
}

/// Minimum RR TTL across all sections, used to derive the cache TTL.
pub fn min_rr_ttl(msg: &Message) -> Option<u32> {
    msg.answers()
        .iter()
        .chain(msg.name_servers())
        .chain(msg.additionals())
        .map(|r| r.ttl())
        .min()
}

/// Subtracts `elapsed_secs` from every RR's TTL in place, floored at zero, so
/// a client reading a cached response sees a monotonically decreasing TTL
/// (cache invariant c).
pub fn age_ttls(msg: &mut Message, elapsed_secs: u32) {
    for rec in msg.answers_mut() {
        rec.set_ttl(rec.ttl().saturating_sub(elapsed_secs));
    }
    for rec in msg.name_servers_mut() {
        rec.set_ttl(rec.ttl().saturating_sub(elapsed_secs));
    }
}

/// Rewrites `response`'s ID and QR/flags fields to match `request` so a
/// cached wire message can be replayed verbatim to a new client.
pub fn rewrite_for_request(response: &mut Message, request: &Message) {
    response.set_id(request.id());
    response.set_message_type(MessageType::Response);
    response.set_op_code(OpCode::Query);
    response.set_recursion_desired(request.recursion_desired());
}

/// Strips the EDNS OPT pseudo-record before storing a response in the cache,
/// since per-client ECS/options don't apply to other clients replaying the
/// cached answer.
pub fn strip_edns(msg: &mut Message) {
    msg.set_edns(Edns::new());
    msg.unset_edns();
}

/// Reads an EDNS Client-Subnet option (RFC 7871), if present, as
/// `(address, source_prefix_len)`.
pub fn ecs_option(msg: &Message) -> Option<(IpAddr, u8)> {
    use hickory_proto::rr::rdata::opt::{ClientSubnet, EdnsOption};
    let edns = msg.extensions().as_ref()?;
    edns.option(hickory_proto::rr::rdata::opt::EdnsCode::Subnet)
        .and_then(|opt| match opt {
            EdnsOption::Subnet(ClientSubnet {
                address,
                source_prefix,
                ..
            }) => Some((*address, *source_prefix)),
            _ => None,
        })
}

/// Whether `mask` covers more than one client, i.e. is not a full host mask
/// (cache invariant b: ECS masks narrower than host are not cacheable).
pub fn ecs_is_multi_client(address: IpAddr, source_prefix: u8) -> bool {
    match address {
        IpAddr::V4(_) => source_prefix < 32,
        IpAddr::V6(_) => source_prefix < 128,
    }
}

/// Injects an EDNS Client-Subnet option using `client_ip` masked to
/// `v4_mask`/`v6_mask` (ECS "Forward").
pub fn inject_ecs(msg: &mut Message, client_ip: IpAddr, v4_mask: u8, v6_mask: u8) {
    use hickory_proto::rr::rdata::opt::{ClientSubnet, EdnsOption};
    let (masked, prefix) = match client_ip {
        IpAddr::V4(v4) => (IpAddr::V4(mask_v4(v4, v4_mask)), v4_mask),
        IpAddr::V6(v6) => (IpAddr::V6(mask_v6(v6, v6_mask)), v6_mask),
    };
    let edns = msg.extensions_mut().get_or_insert_with(Edns::new);
    edns.options_mut().insert(EdnsOption::Subnet(ClientSubnet {
        address: masked,
        source_prefix: prefix,
        scope_prefix: 0,
    }));
}

fn mask_v4(ip: Ipv4Addr, prefix: u8) -> Ipv4Addr {
    let bits = u32::from(ip);
    let mask = if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix as u32)
    };
    Ipv4Addr::from(bits & mask)
}

fn mask_v6(ip: Ipv6Addr, prefix: u8) -> Ipv6Addr {
    let bits = u128::from(ip);
    let mask = if prefix == 0 {
        0
    } else {
        u128::MAX << (128 - prefix as u32)
    };
    Ipv6Addr::from(bits & mask)
}

/// Attaches an Extended-DNS-Error (RFC 8914) EDNS option to `msg` (EDE).
pub fn attach_ede(msg: &mut Message, info_code: u16, extra_text: &str) {
    use hickory_proto::rr::rdata::opt::EdnsOption;
    let edns = msg.extensions_mut().get_or_insert_with(Edns::new);
    edns.options_mut().insert(EdnsOption::Unknown(
        15, // RFC 8914 EDNS0 option code for Extended DNS Error
        {
            let mut buf = Vec::with_capacity(2 + extra_text.len());
            buf.extend_from_slice(&info_code.to_be_bytes());
            buf.extend_from_slice(extra_text.as_bytes());
            buf
        },
    ));
}

/// Rewrites the leaf question name and every owner name in the answer
/// section that shares the old suffix, used by the rewriter stage to restore
/// the client's original names before a response leaves the chain (
/// rewriter property 7).
pub fn rename_question_and_answers(msg: &mut Message, from: &Name, to: &Name) {
    for q in msg.queries_mut() {
        if q.name() == from {
            *q.name_mut() = to.clone();
        }
    }
    for rec in msg.answers_mut() {
        if rec.name() == from {
            rec.set_name(to.clone());
        }
    }
}

pub fn build_response_shell(request: &Message, code: ResponseCode) -> Message {
    let mut msg = Message::new();
    msg.set_id(request.id());
    msg.set_message_type(MessageType::Response);
    msg.set_op_code(OpCode::Query);
    msg.set_recursion_desired(request.recursion_desired());
    msg.set_recursion_available(true);
    msg.set_response_code(code);
    for q in request.queries() {
        msg.add_query(q.clone());
    }
    msg
}

pub fn build_nxdomain(request: &Message) -> Message {
    build_response_shell(request, ResponseCode::NoError).tap_nxdomain()
}

trait TapNxDomain {
    fn tap_nxdomain(self) -> Self;
}

impl TapNxDomain for Message {
    fn tap_nxdomain(mut self) -> Self {
        self.set_response_code(ResponseCode::NXDomain);
        self
    }
}

pub fn build_servfail(request: &Message) -> Message {
    build_response_shell(request, ResponseCode::ServFail)
}

/// Synthesizes `A -> 0.0.0.0` / `AAAA -> ::` with `ttl_secs`, matching the
/// `ZEROIP` block handler.
pub fn build_a_record(request: &Message, name: &Name, ip: Ipv4Addr, ttl_secs: u32) -> Message {
    let mut msg = build_response_shell(request, ResponseCode::NoError);
    msg.add_answer(Record::from_rdata(name.clone(), ttl_secs, RData::A(A(ip))));
    msg
}

pub fn build_aaaa_record(request: &Message, name: &Name, ip: Ipv6Addr, ttl_secs: u32) -> Message {
    let mut msg = build_response_shell(request, ResponseCode::NoError);
    msg.add_answer(Record::from_rdata(
        name.clone(),
        ttl_secs,
        RData::AAAA(AAAA(ip)),
    ));
    msg
}

/// Empty NOERROR response, used by the ZEROIP handler for non-A/AAAA qtypes
/// and by the IPv6-disabling stage.
pub fn build_empty_noerror(request: &Message) -> Message {
    build_response_shell(request, ResponseCode::NoError)
}

/// Enforces the UDP response size limit — the EDNS UDP size if the request
/// carried an OPT record, else the plain 512-byte DNS limit: if the packed
/// message exceeds the limit, drops the answer/authority/additional sections
/// and sets the TC
/// bit, leaving the question (and EDNS OPT, to echo the client's buffer
/// size back) intact so the client knows to retry over TCP.
pub fn enforce_udp_size_limit(wire: &[u8]) -> Result<Arc<[u8]>, ResolverError> {
    const DEFAULT_MAX: usize = 512;

    if wire.len() <= DEFAULT_MAX {
        return Ok(Arc::from(wire.to_vec().into_boxed_slice()));
    }

    let mut msg = parse(wire)?;
    let max = msg
        .extensions()
        .as_ref()
        .map(|e| e.max_payload() as usize)
        .filter(|&m| m > 0)
        .unwrap_or(DEFAULT_MAX);

    if wire.len() <= max {
        return Ok(Arc::from(wire.to_vec().into_boxed_slice()));
    }

    msg.take_answers();
    msg.take_name_servers();
    msg.take_additionals();
    msg.set_truncated(true);
    to_bytes(&msg)
}

/// Enforces the TCP response size limit (§6: "64 KiB (TCP)"), which is fixed
/// regardless of EDNS buffer size since the 16-bit length-prefix framing is
/// the hard ceiling. DoH has no built-in size cap of its own, so an
/// oversized DoH upstream reply can still reach this path; rather than
/// truncating the packed bytes mid-record (which would ship an unparseable
/// message), this drops the answer/authority/additional sections and sets
/// the TC bit, the same well-formed-truncation shape as
/// [`enforce_udp_size_limit`].
pub fn enforce_tcp_size_limit(wire: &[u8]) -> Result<Arc<[u8]>, ResolverError> {
    const MAX_TCP_MESSAGE: usize = 65535;

    if wire.len() <= MAX_TCP_MESSAGE {
        return Ok(Arc::from(wire.to_vec().into_boxed_slice()));
    }

    let mut msg = parse(wire)?;
    msg.take_answers();
    msg.take_name_servers();
    msg.take_additionals();
    msg.set_truncated(true);
    to_bytes(&msg)
}

/// Collects the string form of every A/AAAA answer IP and CNAME target in
/// `msg`, IPv6 lower-cased (post-resolution check open question b).
pub fn answer_ips_and_cnames(msg: &Message) -> (Vec<String>, Vec<String>) {
    let mut ips = Vec::new();
    let mut cnames = Vec::new();
    for rec in msg.answers() {
        match rec.data() {
            RData::A(a) => ips.push(a.0.to_string()),
            RData::AAAA(aaaa) => ips.push(aaaa.0.to_string().to_ascii_lowercase()),
            RData::CNAME(cname) => {
                let mut s = cname.0.to_utf8();
                if s.ends_with('.') {
                    s.pop();
                }
                cnames.push(s);
            }
            _ => {}
        }
    }
    (ips, cnames)
}
