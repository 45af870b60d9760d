//! Transport layer for talking to RouterOS devices.
//!
//! - **[`Connector`]**: the minimal contract every transport satisfies:
//!   open, close, logged-on state, and an optional wire logger.
//! - **[`CommandConnector`]**: the extended capability for transports that
//!   can execute API commands and return rows. Reached through
//!   [`Capability`] queries rather than concrete type casts.
//! - **[`ApiConnector`]**: the built-in RouterOS API client (plain TCP on
//!   8728, TLS on 8729).
//! - **[`ConnectorType`]**: the fixed enumeration of transports a session
//!   can be created with.

pub mod api;
pub mod connector;
pub mod error;
pub mod logger;
pub mod transport;
pub mod wire;

pub use api::ApiConnector;
pub use connector::{
    Capability, CommandConnector, Connector, ConnectorType, Response, Row, downcast_connector,
};
pub use error::Error;
pub use logger::{ConnectorLogger, Direction, NoopLogger, TracingLogger};
pub use transport::{TlsMode, TransportConfig};
