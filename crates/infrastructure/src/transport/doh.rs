use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use ferrous_resolver_domain::ResolverError;

const DNS_MESSAGE_CONTENT_TYPE: &str = "application/dns-message";

/// Shared clients, one per dial target (and optional proxy), so a
/// steady-state DoH upstream reuses its pooled HTTP/2 connection (and skips
/// a fresh TCP+TLS handshake) across queries instead of paying for a new
/// `reqwest::Client` every call. Keyed by `(host, addr, proxy)` rather than
/// a single global instance because each client bakes in a `resolve()`
/// override pinning that exact dial target (and, when configured, a fixed
/// upstream HTTP proxy); a new entry is built only the first time a target
/// is seen, or again if Bootstrap hands back a different address for the
/// same host.
static CLIENTS: LazyLock<DashMap<(Arc<str>, SocketAddr, Option<Arc<str>>), reqwest::Client>> =
    LazyLock::new(DashMap::new);

fn client_for(host: &str, addr: SocketAddr, proxy: Option<&str>) -> Result<reqwest::Client, ResolverError> {
    let key = (Arc::<str>::from(host), addr, proxy.map(Arc::<str>::from));
    if let Some(existing) = CLIENTS.get(&key) {
        return Ok(existing.clone());
    }
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .http2_prior_knowledge()
        .resolve(host, addr);
    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| ResolverError::DialFailed(e.to_string()))?;
        builder = builder.proxy(proxy);
    }
    let built = builder.build().map_err(|e| ResolverError::DialFailed(e.to_string()))?;
    CLIENTS.insert(key, built.clone());
    Ok(built)
}

/// DNS-over-HTTPS client (RFC 8484): POST to `https://<host><path>` dialed
/// against a pinned `addr`, with an explicit `Host` header so TLS/certificate
/// validation uses the configured hostname rather than the dialed IP.
#[derive(Debug, Default, Clone, Copy)]
pub struct DohClient;

impl DohClient {
    pub async fn send(
        &self,
        query: &[u8],
        addr: SocketAddr,
        host: &str,
        path: &str,
        proxy: Option<&str>,
        timeout: Duration,
    ) -> Result<(Vec<u8>, Duration), ResolverError> {
        let start = Instant::now();

        let client = client_for(host, addr, proxy)?;

        let url = format!("https://{host}{path}");
        let response = client
            .post(&url)
            .header("Content-Type", DNS_MESSAGE_CONTENT_TYPE)
            .header("Accept", DNS_MESSAGE_CONTENT_TYPE)
            .header("Host", host)
            .timeout(timeout)
            .body(query.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResolverError::Timeout
                } else {
                    ResolverError::DialFailed(format!("{url}: {e}"))
                }
            })?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(ResolverError::HttpStatus(status.as_u16()));
        }
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !content_type.starts_with(DNS_MESSAGE_CONTENT_TYPE) {
            return Err(ResolverError::MalformedMessage(format!(
                "unexpected content-type '{content_type}'"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ResolverError::DialFailed(e.to_string()))?;

        Ok((body.to_vec(), start.elapsed()))
    }
}
