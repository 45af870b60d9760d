use thiserror::Error;

/// Top-level error type for the `tikly-api` crate.
///
/// Covers every failure mode of the transport layer: socket I/O, TLS,
/// authentication, and the RouterOS reply categories. `tikly-core` passes
/// these through to callers untouched.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Socket-level failure (connection refused, reset, timeout, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS configuration or handshake failure.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The host could not be resolved to any socket address.
    #[error("Cannot resolve host '{host}'")]
    InvalidHost { host: String },

    // ── Session ─────────────────────────────────────────────────────
    /// The device rejected the login sentence.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A command was issued before `open` or after `close`.
    #[error("Connector is not connected")]
    NotConnected,

    /// `open` was called on a connector that already holds a connection.
    #[error("Connector is already open")]
    AlreadyOpen,

    // ── Replies ─────────────────────────────────────────────────────
    /// `!trap` reply: the command failed on the device.
    #[error("Device rejected command: {message}")]
    Trap {
        /// RouterOS trap category (0 = missing item, 1 = argument value, ...).
        category: Option<u32>,
        message: String,
    },

    /// `!fatal` reply: the device closed the connection.
    #[error("Device closed the connection: {message}")]
    Fatal { message: String },

    /// A reply that does not follow the sentence grammar.
    #[error("Protocol error: {message}")]
    Protocol { message: String },
}

impl Error {
    /// Returns `true` if the underlying connection is unusable after this error.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Fatal { .. } | Self::NotConnected)
    }

    /// The trap category, if this is a `!trap` reply.
    pub fn trap_category(&self) -> Option<u32> {
        match self {
            Self::Trap { category, .. } => *category,
            _ => None,
        }
    }
}

impl From<rustls::Error> for Error {
    fn from(err: rustls::Error) -> Self {
        Self::Tls(err.to_string())
    }
}
