use std::net::SocketAddr;
use std::sync::Arc;

use ferrous_resolver_application::ports::ChainStage;
use ferrous_resolver_domain::ClientProtocol;
use ferrous_resolver_infrastructure::wire;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::handler::handle_query;

/// Largest UDP datagram a client could plausibly send us: the listener reads
/// into a full 65535-byte buffer rather than a MTU-sized one.
const MAX_UDP_QUERY: usize = 65535;

/// Binds and runs the UDP listener, tuning the kernel socket buffers since
/// the default ~256KB is too small for a busy resolver's burst of
/// concurrent queries.
pub async fn run(bind_addr: SocketAddr, head: Arc<dyn ChainStage>, shutdown: CancellationToken) -> anyhow::Result<()> {
    let domain = if bind_addr.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_recv_buffer_size(8 * 1024 * 1024)?;
    socket.set_send_buffer_size(4 * 1024 * 1024)?;
    socket.bind(&bind_addr.into())?;
    socket.set_nonblocking(true)?;

    let std_socket: std::net::UdpSocket = socket.into();
    let socket = Arc::new(UdpSocket::from_std(std_socket)?);

    info!(%bind_addr, "UDP listener ready");

    let mut buf = vec![0u8; MAX_UDP_QUERY];
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("UDP listener shutting down");
                return Ok(());
            }
            result = socket.recv_from(&mut buf) => {
                let (n, from) = match result {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(error = %e, "UDP recv error");
                        continue;
                    }
                };
                let query = buf[..n].to_vec();
                let head = Arc::clone(&head);
                let socket = Arc::clone(&socket);
                tokio::spawn(async move {
                    if let Some(response) = handle_query(head, from.ip(), ClientProtocol::Udp, query).await {
                        let response = wire::enforce_udp_size_limit(&response).unwrap_or_else(|_| response.into());
                        if let Err(e) = socket.send_to(&response, from).await {
                            warn!(%from, error = %e, "failed to send UDP response");
                        }
                    }
                });
            }
        }
    }
}
