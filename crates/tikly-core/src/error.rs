// ── Core error types ──
//
// Every failure the session and entity layers can raise. Transport errors
// are carried through untouched: this layer adds no retry or translation.

use thiserror::Error;

use tikly_api::ConnectorType;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration errors ─────────────────────────────────────────
    #[error("Transport '{connector_type}' is not supported")]
    UnsupportedTransport { connector_type: ConnectorType },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("A log factory is already installed for this process")]
    LogFactoryInstalled,

    // ── Session errors ───────────────────────────────────────────────
    #[error("No active session in the current context")]
    NoActiveSession,

    #[error("Session has been disposed")]
    SessionDisposed,

    #[error("Connector is busy (already borrowed by another caller)")]
    ConnectorBusy,

    // ── Capability errors ────────────────────────────────────────────
    #[error("Connector does not implement capability {capability}")]
    CapabilityMismatch { capability: &'static str },

    // ── Entity errors ────────────────────────────────────────────────
    #[error("Entity '{kind}' is read-only")]
    ReadOnly { kind: String },

    #[error("Field '{field}' of '{kind}' is read-only")]
    ReadOnlyField { kind: String, field: String },

    #[error("Entity '{kind}' has no field '{field}'")]
    UnknownField { kind: String, field: String },

    #[error("Field '{field}' value {value:?} is not a valid {expected}")]
    Coercion {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("Entity '{kind}' has no row id; it was never saved")]
    MissingId { kind: String },

    #[error("No '{kind}' row with id {id}")]
    NotFound { kind: String, id: String },

    // ── Transport errors (passed through) ────────────────────────────
    #[error(transparent)]
    Transport(#[from] tikly_api::Error),
}

impl CoreError {
    /// Returns `true` for errors caused by how the caller used the API
    /// rather than by the device or the network.
    pub fn is_usage_error(&self) -> bool {
        !matches!(self, Self::Transport(_) | Self::NotFound { .. })
    }
}
