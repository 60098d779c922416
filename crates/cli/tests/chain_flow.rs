//! End-to-end chain scenarios, driven against an in-process fake
//! upstream instead of live DNS servers, so results are deterministic.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use ferrous_resolver_application::ports::ChainStage;
use ferrous_resolver_domain::config::BlockingConfig;
use ferrous_resolver_domain::{
    ClientProtocol, Config, InitStrategy, Request, ResponseType, Upstream, UpstreamGroup,
    UpstreamProtocol, UpstreamStrategy, DEFAULT_GROUP_NAME,
};
use ferrous_resolver_infrastructure::build_chain;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{rdata::A, DNSClass, Name, RData, Record, RecordType};
use hickory_proto::serialize::binary::BinEncodable;
use tokio::net::UdpSocket;

/// Binds a loopback UDP "upstream" that answers every A query for any name
/// with `answer_ip`, echoing the request's ID and question section back
/// (mirroring a well-behaved recursive resolver's reply shape).
async fn spawn_fake_upstream(answer_ip: Ipv4Addr) -> std::net::SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.expect("bind fake upstream");
    let addr = socket.local_addr().expect("local addr");

    tokio::spawn(async move {
        let mut buf = [0u8; 512];
        loop {
            let (len, peer) = match socket.recv_from(&mut buf).await {
                Ok(v) => v,
                Err(_) => return,
            };
            let Ok(query) = Message::from_vec(&buf[..len]) else {
                continue;
            };
            let Some(question) = query.queries().first().cloned() else {
                continue;
            };

            let mut response = Message::new(query.id(), MessageType::Response, OpCode::Query);
            response.set_recursion_desired(query.recursion_desired());
            response.set_recursion_available(true);
            response.add_query(question.clone());

            if question.query_type() == RecordType::A {
                let record = Record::from_rdata(question.name().clone(), 300, RData::A(A(answer_ip)));
                response.add_answer(record);
            }

            let Ok(bytes) = response.to_bytes() else {
                continue;
            };
            let _ = socket.send_to(&bytes, peer).await;
        }
    });

    addr
}

fn a_query(qname: &str) -> Arc<[u8]> {
    let mut query = Query::new();
    query.set_name(Name::from_ascii(qname).unwrap());
    query.set_query_type(RecordType::A);
    query.set_query_class(DNSClass::IN);
    let mut msg = Message::new(42, MessageType::Query, OpCode::Query);
    msg.set_recursion_desired(true);
    msg.add_query(query);
    Arc::from(msg.to_bytes().unwrap().into_boxed_slice())
}

fn base_config(upstream_addr: std::net::SocketAddr, strategy: UpstreamStrategy) -> Config {
    let mut config = Config {
        blocking: BlockingConfig {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    config.upstreams.groups = vec![UpstreamGroup {
        name: Arc::from(DEFAULT_GROUP_NAME),
        strategy,
        upstreams: vec![Upstream {
            protocol: UpstreamProtocol::TcpUdp,
            host: Arc::from(upstream_addr.ip().to_string().as_str()),
            port: upstream_addr.port(),
            path: None,
            common_name: None,
            timeout: Duration::from_millis(500),
            proxy: None,
        }],
        timeout: Duration::from_millis(500),
        init_strategy: InitStrategy::Fast,
    }];
    config
}

fn request(wire: Arc<[u8]>) -> Request {
    Request::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), ClientProtocol::Udp, wire)
}

/// S5-style scenario: a miss is forwarded and cached, a repeat query within
/// the TTL window is served from cache with a strictly lower remaining TTL,
/// and the upstream is not contacted a second time.
#[tokio::test]
async fn second_query_is_served_from_cache_with_decreasing_ttl() {
    let upstream = spawn_fake_upstream(Ipv4Addr::new(93, 184, 216, 34)).await;
    // Default `min_caching_time` is 0 and `max_caching_time` is 24h, so the
    // fake upstream's 300s answer TTL passes through `clamp` unchanged.
    let config = base_config(upstream, UpstreamStrategy::Strict);

    let chain = build_chain(&config).await.expect("chain builds");

    let query = a_query("example.com.");
    let first = chain.head.resolve(&request(query.clone())).await.unwrap();
    assert_eq!(first.response_type, ResponseType::Resolved);

    tokio::time::sleep(Duration::from_secs(1)).await;

    let second = chain.head.resolve(&request(query.clone())).await.unwrap();
    assert_eq!(second.response_type, ResponseType::Cached);

    let msg = Message::from_vec(&second.wire).unwrap();
    let ttl = msg.answers().first().unwrap().ttl();
    assert!(ttl < 300, "expected aged-down ttl, got {ttl}");
    assert!(ttl >= 298, "ttl aged down by more than elapsed time: {ttl}");
}

/// Strict strategy with a single healthy upstream resolves successfully and
/// tags the response `RESOLVED`.
#[tokio::test]
async fn strict_strategy_resolves_through_single_upstream() {
    let upstream = spawn_fake_upstream(Ipv4Addr::new(1, 2, 3, 4)).await;
    let config = base_config(upstream, UpstreamStrategy::Strict);
    let chain = build_chain(&config).await.expect("chain builds");

    let resp = chain
        .head
        .resolve(&request(a_query("strict.example.")))
        .await
        .unwrap();
    assert_eq!(resp.response_type, ResponseType::Resolved);

    let msg = Message::from_vec(&resp.wire).unwrap();
    let RData::A(A(ip)) = msg.answers().first().unwrap().data().unwrap() else {
        panic!("expected A record");
    };
    assert_eq!(*ip, Ipv4Addr::new(1, 2, 3, 4));
}

/// ParallelBest with only one upstream configured falls back to a direct
/// dispatch (no second candidate to race) and still resolves.
#[tokio::test]
async fn parallel_best_with_single_upstream_still_resolves() {
    let upstream = spawn_fake_upstream(Ipv4Addr::new(8, 8, 8, 8)).await;
    let config = base_config(upstream, UpstreamStrategy::ParallelBest);
    let chain = build_chain(&config).await.expect("chain builds");

    let resp = chain
        .head
        .resolve(&request(a_query("parallel.example.")))
        .await
        .unwrap();
    assert_eq!(resp.response_type, ResponseType::Resolved);
}
