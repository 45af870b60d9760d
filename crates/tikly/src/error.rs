//! CLI error types with miette diagnostics.
//!
//! Maps core, transport and config errors into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use tikly_config::ConfigError;
use tikly_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to device at {host}")]
    #[diagnostic(
        code(tikly::connection_failed),
        help(
            "Check that the device is reachable and the API service is enabled\n\
             (/ip service enable api, or api-ssl for --transport api-ssl)."
        )
    )]
    ConnectionFailed {
        host: String,
        #[source]
        source: tikly_api::Error,
    },

    #[error("TLS handshake with {host} failed: {message}")]
    #[diagnostic(
        code(tikly::tls_error),
        help(
            "Use --insecure (-k) to accept a self-signed certificate,\n\
             or configure ca_cert in your profile."
        )
    )]
    TlsError { host: String, message: String },

    #[error("Connection to device lost: {message}")]
    #[diagnostic(code(tikly::connection_lost))]
    ConnectionLost { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Login rejected: {message}")]
    #[diagnostic(
        code(tikly::auth_failed),
        help("Verify the user name and password for profile '{profile}'.")
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(tikly::no_credentials),
        help(
            "Set `username` and `password_env` in the profile, store the password\n\
             in the system keyring under service 'tikly' as '{profile}/password',\n\
             or set TIKLY_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Rows and kinds ───────────────────────────────────────────────

    #[error("Unknown kind '{kind}'")]
    #[diagnostic(code(tikly::unknown_kind), help("Known kinds: {available}\nRun: tikly kinds"))]
    UnknownKind { kind: String, available: String },

    #[error("{kind} '{id}' not found")]
    #[diagnostic(code(tikly::not_found), help("Run: tikly print {kind}"))]
    NotFound { kind: String, id: String },

    #[error("{message}")]
    #[diagnostic(code(tikly::read_only), help("Run: tikly kinds to see which kinds are editable"))]
    ReadOnly { message: String },

    #[error("Device rejected the command: {message}")]
    #[diagnostic(code(tikly::device_error))]
    DeviceError { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tikly::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(tikly::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No device configured")]
    #[diagnostic(
        code(tikly::no_config),
        help(
            "Pass --host, or add a profile to the config file.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(tikly::config))]
    Config(ConfigError),

    #[error(transparent)]
    #[diagnostic(code(tikly::internal))]
    Internal(CoreError),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(tikly::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(tikly::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } | Self::ConnectionLost { .. } => {
                exit_code::CONNECTION
            }
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::ReadOnly { .. } => exit_code::PERMISSION,
            Self::UnknownKind { .. } | Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the connection target to a failed `open`.
    pub fn from_open(err: CoreError, host: &str, profile: &str) -> Self {
        match err {
            CoreError::Transport(tikly_api::Error::Authentication { message }) => {
                Self::AuthFailed {
                    profile: profile.into(),
                    message,
                }
            }
            CoreError::Transport(tikly_api::Error::Tls(message)) => Self::TlsError {
                host: host.into(),
                message,
            },
            CoreError::Transport(
                source @ (tikly_api::Error::Io(_)
                | tikly_api::Error::InvalidHost { .. }
                | tikly_api::Error::Fatal { .. }),
            ) => Self::ConnectionFailed {
                host: host.into(),
                source,
            },
            other => other.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { kind, id } => Self::NotFound { kind, id },

            CoreError::ReadOnly { .. } | CoreError::ReadOnlyField { .. } => Self::ReadOnly {
                message: err.to_string(),
            },

            CoreError::UnknownField { .. } | CoreError::Coercion { .. } | CoreError::MissingId { .. } => {
                Self::Validation {
                    field: "assignment".into(),
                    reason: err.to_string(),
                }
            }

            CoreError::Transport(tikly_api::Error::Trap { message, .. }) => {
                Self::DeviceError { message }
            }

            CoreError::Transport(
                e @ (tikly_api::Error::Io(_)
                | tikly_api::Error::Fatal { .. }
                | tikly_api::Error::NotConnected),
            ) => Self::ConnectionLost {
                message: e.to_string(),
            },

            other => Self::Internal(other),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let auth = CliError::from_open(
            CoreError::Transport(tikly_api::Error::Authentication {
                message: "invalid user name or password (6)".into(),
            }),
            "10.0.0.1",
            "edge",
        );
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let read_only: CliError = CoreError::ReadOnly { kind: "log".into() }.into();
        assert_eq!(read_only.exit_code(), exit_code::PERMISSION);

        let missing: CliError = CoreError::NotFound {
            kind: "interface".into(),
            id: "*9".into(),
        }
        .into();
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);

        let trap: CliError = CoreError::Transport(tikly_api::Error::Trap {
            category: None,
            message: "failure: already have such address".into(),
        })
        .into();
        assert_eq!(trap.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn refused_connection_maps_to_connection_failed() {
        let io = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        let err = CliError::from_open(CoreError::Transport(io.into()), "10.0.0.1", "edge");
        assert!(matches!(err, CliError::ConnectionFailed { ref host, .. } if host == "10.0.0.1"));
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
    }
}
