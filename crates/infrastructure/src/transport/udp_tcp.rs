use std::net::SocketAddr;
use std::time::{Duration, Instant};

use ferrous_resolver_domain::{ClientProtocol, ResolverError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

use crate::wire;

const MAX_UDP_RESPONSE: usize = 4096;

/// Plain UDP/TCP upstream transport : "if caller's protocol is TCP, try
/// TCP first; on a *dial* error fall back to UDP if configured. Otherwise
/// prefer UDP." A UDP response with the TC bit set is retried over TCP,
/// matching ordinary recursive-resolver behavior.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpTcpClient;

impl UdpTcpClient {
    pub async fn send(
        &self,
        query: &[u8],
        addr: SocketAddr,
        client_protocol: ClientProtocol,
        timeout: Duration,
    ) -> Result<(Vec<u8>, Duration), ResolverError> {
        let start = Instant::now();
        if client_protocol == ClientProtocol::Tcp {
            match self.send_tcp(query, addr, timeout).await {
                Ok(bytes) => return Ok((bytes, start.elapsed())),
                Err(ResolverError::DialFailed(_)) => {
                    let bytes = self.send_udp(query, addr, timeout).await?;
                    return Ok((bytes, start.elapsed()));
                }
                Err(e) => return Err(e),
            }
        }

        let bytes = self.send_udp(query, addr, timeout).await?;
        if let Ok(msg) = wire::parse(&bytes) {
            if wire::is_truncated(&msg) {
                let remaining = timeout.saturating_sub(start.elapsed());
                let tcp_bytes = self.send_tcp(query, addr, remaining).await?;
                return Ok((tcp_bytes, start.elapsed()));
            }
        }
        Ok((bytes, start.elapsed()))
    }

    async fn send_udp(
        &self,
        query: &[u8],
        addr: SocketAddr,
        timeout: Duration,
    ) -> Result<Vec<u8>, ResolverError> {
        let bind_addr: SocketAddr = if addr.is_ipv4() {
            "0.0.0.0:0".parse().unwrap()
        } else {
            "[::]:0".parse().unwrap()
        };
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| ResolverError::DialFailed(e.to_string()))?;

        tokio::time::timeout(timeout, socket.send_to(query, addr))
            .await
            .map_err(|_| ResolverError::Timeout)?
            .map_err(|e| ResolverError::DialFailed(e.to_string()))?;

        let mut buf = vec![0u8; MAX_UDP_RESPONSE];
        let (n, _from) = tokio::time::timeout(timeout, socket.recv_from(&mut buf))
            .await
            .map_err(|_| ResolverError::Timeout)?
            .map_err(|e| ResolverError::DialFailed(e.to_string()))?;
        buf.truncate(n);
        Ok(buf)
    }

    async fn send_tcp(
        &self,
        query: &[u8],
        addr: SocketAddr,
        timeout: Duration,
    ) -> Result<Vec<u8>, ResolverError> {
        let mut stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ResolverError::Timeout)?
            .map_err(|e| ResolverError::DialFailed(e.to_string()))?;

        let len = (query.len() as u16).to_be_bytes();
        tokio::time::timeout(timeout, async {
            stream.write_all(&len).await?;
            stream.write_all(query).await
        })
        .await
        .map_err(|_| ResolverError::Timeout)?
        .map_err(|e| ResolverError::DialFailed(e.to_string()))?;

        let mut len_buf = [0u8; 2];
        tokio::time::timeout(timeout, stream.read_exact(&mut len_buf))
            .await
            .map_err(|_| ResolverError::Timeout)?
            .map_err(|e| ResolverError::DialFailed(e.to_string()))?;
        let resp_len = u16::from_be_bytes(len_buf) as usize;

        let mut resp = vec![0u8; resp_len];
        tokio::time::timeout(timeout, stream.read_exact(&mut resp))
            .await
            .map_err(|_| ResolverError::Timeout)?
            .map_err(|e| ResolverError::DialFailed(e.to_string()))?;
        Ok(resp)
    }
}
