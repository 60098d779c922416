use std::sync::Arc;

/// Classification of how a [`Response`] was produced. Surfaced in logs
/// and, when enabled, as an Extended-DNS-Error code (EDE).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Resolved,
    Cached,
    Blocked,
    Conditional,
    CustomDns,
    HostsFile,
    NotFqdn,
    Filtered,
    Special,
}

impl ResponseType {
    /// Extended-DNS-Error code mapping used by the EDE annotation stage.
    pub fn extended_error_code(&self) -> Option<u16> {
        match self {
            ResponseType::Blocked => Some(15),     // Blocked
            ResponseType::Filtered => Some(17),    // Filtered
            ResponseType::NotFqdn => Some(21),     // Invalid Data (closest EDE match)
            ResponseType::Special => Some(21),
            _ => None,
        }
    }
}

/// A chain stage's answer. `reason` is a short human string used in logs
/// and optionally surfaced as an Extended-DNS-Error text.
#[derive(Debug, Clone)]
pub struct Response {
    pub wire: Arc<[u8]>,
    pub response_type: ResponseType,
    pub reason: Arc<str>,
}

impl Response {
    pub fn new(wire: impl Into<Arc<[u8]>>, response_type: ResponseType, reason: impl Into<Arc<str>>) -> Self {
        Self {
            wire: wire.into(),
            response_type,
            reason: reason.into(),
        }
    }

    /// The sentinel "no opinion, continue in outer chain" value.
    ///
    /// Its wire is empty and its type is `Resolved`; stages check
    /// [`Response::is_no_response`] rather than matching on fields directly.
    pub fn no_response() -> Self {
        Self {
            wire: Arc::from(&[][..]),
            response_type: ResponseType::Resolved,
            reason: Arc::from(""),
        }
    }

    pub fn is_no_response(&self) -> bool {
        self.wire.is_empty() && self.response_type == ResponseType::Resolved && self.reason.is_empty()
    }
}
