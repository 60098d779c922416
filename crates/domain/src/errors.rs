use thiserror::Error;

/// Error taxonomy for the resolver chain (see design notes, "error handling").
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("invalid CIDR: {0}")]
    InvalidCidr(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing default upstream group")]
    MissingDefaultGroup,

    #[error("bootstrap requires at least one hardcoded IP for encrypted upstream {0}")]
    MissingBootstrapIps(String),

    #[error("network timeout")]
    Timeout,

    #[error("dial failed: {0}")]
    DialFailed(String),

    #[error("TLS handshake failed: {0}")]
    TlsHandshake(String),

    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    #[error("malformed DNS wire message: {0}")]
    MalformedMessage(String),

    #[error("upstream server error: {0}")]
    UpstreamServerError(String),

    #[error("all upstreams in group '{0}' failed")]
    AllUpstreamsFailed(String),

    #[error("no such host: {0}")]
    NoSuchHost(String),

    #[error("cache entry corrupted")]
    CacheCorrupted,

    #[error("internal: {0}")]
    Internal(String),
}

impl ResolverError {
    /// Transport-layer errors are retryable inside a dispatcher.
    pub fn is_transport_retryable(&self) -> bool {
        matches!(
            self,
            ResolverError::Timeout
                | ResolverError::DialFailed(_)
                | ResolverError::TlsHandshake(_)
                | ResolverError::HttpStatus(_)
                | ResolverError::MalformedMessage(_)
        )
    }
}
