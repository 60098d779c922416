use std::net::IpAddr;
use std::sync::Arc;
use std::time::SystemTime;

/// Transport the client used to reach us. Forwarded to `UpstreamClient` so
/// TCP clients prefer TCP upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientProtocol {
    Udp,
    Tcp,
}

/// Small bag of fields surfaced in log lines; kept separate from `Request`
/// so stages can enrich it without needing `&mut Request`.
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    pub client_id: Option<Arc<str>>,
    pub notes: Vec<Arc<str>>,
}

impl LogContext {
    pub fn note(&mut self, note: impl Into<Arc<str>>) {
        self.notes.push(note.into());
    }
}

/// The immutable-for-the-chain request bundle.
///
/// Stages that need to rewrite the question name copy `wire` into a new
/// `Request` (e.g. via [`Request::with_wire`]); the original is retained
/// separately by the caller for response-time revert (see `rewriter`).
#[derive(Debug, Clone)]
pub struct Request {
    pub client_ip: IpAddr,
    pub client_names: Vec<Arc<str>>,
    pub client_id: Option<Arc<str>>,
    pub protocol: ClientProtocol,
    pub wire: Arc<[u8]>,
    pub received_at: SystemTime,
    pub log: LogContext,
}

impl Request {
    pub fn new(client_ip: IpAddr, protocol: ClientProtocol, wire: impl Into<Arc<[u8]>>) -> Self {
        Self {
            client_ip,
            client_names: Vec::new(),
            client_id: None,
            protocol,
            wire: wire.into(),
            received_at: SystemTime::now(),
            log: LogContext::default(),
        }
    }

    /// Returns a copy of this request with the wire message replaced.
    /// Used by stages that rewrite the question (ECS, rewriter, conditional).
    pub fn with_wire(&self, wire: impl Into<Arc<[u8]>>) -> Self {
        Self {
            wire: wire.into(),
            ..self.clone()
        }
    }

    /// Returns a copy of this request with `client_names` assigned.
    pub fn with_client_names(&self, client_names: Vec<Arc<str>>) -> Self {
        Self {
            client_names,
            ..self.clone()
        }
    }
}
