use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ferrous_resolver_application::ports::ChainStage;
use ferrous_resolver_domain::ClientProtocol;
use ferrous_resolver_infrastructure::wire;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::handler::handle_query;

/// TCP max response size: the length-prefixed framing field is 16 bits, so
/// 64 KiB is the hard ceiling regardless of what upstream returns.
const MAX_TCP_MESSAGE: usize = 65535;
const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn run(bind_addr: SocketAddr, head: Arc<dyn ChainStage>, shutdown: CancellationToken) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!(%bind_addr, "TCP listener ready");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("TCP listener shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(error = %e, "TCP accept error");
                        continue;
                    }
                };
                let head = Arc::clone(&head);
                let conn_shutdown = shutdown.clone();
                tokio::spawn(async move {
                    if let Err(e) = serve_connection(stream, peer, head, conn_shutdown).await {
                        warn!(%peer, error = %e, "TCP connection error");
                    }
                });
            }
        }
    }
}

/// DNS-over-TCP clients may pipeline multiple queries on one connection
/// (RFC 1035); this loop keeps reading length-prefixed messages
/// until the peer closes the stream or goes idle past `IDLE_TIMEOUT`.
async fn serve_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    head: Arc<dyn ChainStage>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    loop {
        let mut len_buf = [0u8; 2];
        let read_len = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            r = tokio::time::timeout(IDLE_TIMEOUT, stream.read_exact(&mut len_buf)) => r,
        };
        match read_len {
            Ok(Ok(_)) => {}
            Ok(Err(_)) => return Ok(()), // peer closed
            Err(_) => return Ok(()),     // idle timeout
        }

        let len = u16::from_be_bytes(len_buf) as usize;
        if len == 0 || len > MAX_TCP_MESSAGE {
            return Ok(());
        }
        let mut query = vec![0u8; len];
        stream.read_exact(&mut query).await?;

        if let Some(response) = handle_query(Arc::clone(&head), peer.ip(), ClientProtocol::Tcp, query).await {
            let response = if response.len() > MAX_TCP_MESSAGE {
                match wire::enforce_tcp_size_limit(&response) {
                    Ok(truncated) => truncated.to_vec(),
                    Err(e) => {
                        warn!(%peer, error = %e, "failed to truncate oversized TCP response");
                        continue;
                    }
                }
            } else {
                response
            };
            let len_prefix = (response.len() as u16).to_be_bytes();
            stream.write_all(&len_prefix).await?;
            stream.write_all(&response).await?;
        }
    }
}
