use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use ferrous_resolver_domain::ResolverError;
use rustls::pki_types::ServerName;
use rustls::ClientConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

/// DNS-over-TLS client : `ServerName = CommonName ?? Host`,
/// `MinVersion = TLS1.2`, webpki-roots trust anchors.
#[derive(Debug, Default, Clone, Copy)]
pub struct DotClient;

fn tls_config() -> &'static Arc<ClientConfig> {
    static CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();
    CONFIG.get_or_init(|| {
        let roots = rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = ClientConfig::builder_with_protocol_versions(&[&rustls::version::TLS12, &rustls::version::TLS13])
            .with_root_certificates(roots)
            .with_no_client_auth();
        Arc::new(config)
    })
}

impl DotClient {
    pub async fn send(
        &self,
        query: &[u8],
        addr: SocketAddr,
        sni_name: &str,
        timeout: Duration,
    ) -> Result<(Vec<u8>, Duration), ResolverError> {
        let start = Instant::now();
        let connector = TlsConnector::from(Arc::clone(tls_config()));
        let server_name = ServerName::try_from(sni_name.to_string())
            .map_err(|e| ResolverError::TlsHandshake(e.to_string()))?;

        let tcp = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ResolverError::Timeout)?
            .map_err(|e| ResolverError::DialFailed(e.to_string()))?;

        let mut tls = tokio::time::timeout(timeout, connector.connect(server_name, tcp))
            .await
            .map_err(|_| ResolverError::Timeout)?
            .map_err(|e| ResolverError::TlsHandshake(e.to_string()))?;

        let len = (query.len() as u16).to_be_bytes();
        tokio::time::timeout(timeout, async {
            tls.write_all(&len).await?;
            tls.write_all(query).await
        })
        .await
        .map_err(|_| ResolverError::Timeout)?
        .map_err(|e| ResolverError::DialFailed(e.to_string()))?;

        let mut len_buf = [0u8; 2];
        tokio::time::timeout(timeout, tls.read_exact(&mut len_buf))
            .await
            .map_err(|_| ResolverError::Timeout)?
            .map_err(|e| ResolverError::DialFailed(e.to_string()))?;
        let resp_len = u16::from_be_bytes(len_buf) as usize;

        let mut resp = vec![0u8; resp_len];
        tokio::time::timeout(timeout, tls.read_exact(&mut resp))
            .await
            .map_err(|_| ResolverError::Timeout)?
            .map_err(|e| ResolverError::DialFailed(e.to_string()))?;

        Ok((resp, start.elapsed()))
    }
}
