use std::net::IpAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use ferrous_resolver_application::ports::ChainStage;
use ferrous_resolver_domain::{ClientProtocol, Request};
use ferrous_resolver_infrastructure::wire;
use futures::FutureExt;
use tracing::{error, warn};

/// Resolves one raw wire query through the chain, converting any chain
/// error or panic into a SERVFAIL ("Panic safety": "catches unexpected
/// panics and converts them to a SERVFAIL with a log entry; no process
/// termination").
///
/// Returns `None` for a query that doesn't even parse as a DNS message —
/// there is no valid ID to answer with, so the datagram is silently
/// dropped, matching ordinary resolver behavior toward garbage input.
pub async fn handle_query(
    head: Arc<dyn ChainStage>,
    client_ip: IpAddr,
    protocol: ClientProtocol,
    bytes: Vec<u8>,
) -> Option<Vec<u8>> {
    let parsed = match wire::parse(&bytes) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(%client_ip, error = %e, "dropping malformed query");
            return None;
        }
    };

    let request = Request::new(client_ip, protocol, bytes);

    let outcome = AssertUnwindSafe(head.resolve(&request)).catch_unwind().await;

    let wire_bytes = match outcome {
        Ok(Ok(response)) => response.wire,
        Ok(Err(e)) => {
            warn!(%client_ip, error = %e, "chain returned error, answering SERVFAIL");
            match wire::to_bytes(&wire::build_servfail(&parsed)) {
                Ok(b) => b,
                Err(_) => return None,
            }
        }
        Err(_panic) => {
            error!(%client_ip, "chain panicked, answering SERVFAIL");
            match wire::to_bytes(&wire::build_servfail(&parsed)) {
                Ok(b) => b,
                Err(_) => return None,
            }
        }
    };

    Some(wire_bytes.to_vec())
}
