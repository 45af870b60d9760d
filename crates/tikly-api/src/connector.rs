// ── Connector contract ──
//
// A connector is a transport that can open/close a connection to a device
// and, optionally, exchange commands with it. Sessions own exactly one
// connector and reach extended capabilities through `Capability` queries.

use std::any::Any;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::Error;
use crate::logger::ConnectorLogger;

/// One reply row, keyed by field name in the order the device sent them.
///
/// Unknown fields are kept as-is so firmware additions survive a round trip.
pub type Row = IndexMap<String, String>;

// ── ConnectorType ───────────────────────────────────────────────────

/// The transports a session can be created with.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectorType {
    /// RouterOS API over plain TCP (port 8728).
    #[default]
    Api,
    /// RouterOS API over TLS (port 8729).
    ApiSsl,
    /// SSH console. Recognised but not shipped.
    Ssh,
    /// Telnet console. Recognised but not shipped.
    Telnet,
    /// Marker for a caller-supplied connector instance.
    Custom,
}

impl ConnectorType {
    /// Whether a built-in connector exists for this type.
    pub fn is_supported(self) -> bool {
        matches!(self, Self::Api | Self::ApiSsl)
    }

    /// The standard port for this transport.
    pub fn default_port(self) -> Option<u16> {
        match self {
            Self::Api => Some(8728),
            Self::ApiSsl => Some(8729),
            Self::Ssh => Some(22),
            Self::Telnet => Some(23),
            Self::Custom => None,
        }
    }
}

// ── Connector ───────────────────────────────────────────────────────

/// Minimal transport contract.
///
/// `close` must be idempotent and must be safe on a connector that was
/// never opened.
pub trait Connector: Any {
    /// Connect and authenticate.
    fn open(&mut self, host: &str, port: u16, user: &str, password: &str) -> Result<(), Error>;

    /// Tear down the connection. No-op when already closed.
    fn close(&mut self);

    /// Whether a successful login is currently held.
    fn is_logged_on(&self) -> bool;

    /// Attach (`Some`) or detach (`None`) a wire logger.
    fn set_logger(&mut self, logger: Option<Arc<dyn ConnectorLogger>>);

    /// Port used when the caller does not give one.
    fn default_port(&self) -> u16;

    /// Command capability, if this transport has one.
    fn as_command_mut(&mut self) -> Option<&mut (dyn CommandConnector + 'static)> {
        None
    }
}

/// Extended capability: execute one API command and collect its reply.
pub trait CommandConnector {
    /// Send `command` with `=key=value` attribute words built from `args`.
    ///
    /// Returns every `!re` row plus the attributes of the closing `!done`.
    /// A `!trap` is surfaced as [`Error::Trap`] once the reply is complete.
    fn call(&mut self, command: &str, args: &[(&str, &str)]) -> Result<Response, Error>;
}

/// Collected reply to one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// `!re` rows in arrival order.
    pub rows: Vec<Row>,
    /// Attributes carried on `!done` (e.g. `ret` after `/add`).
    pub done: Row,
}

impl Response {
    /// The `ret` attribute of `!done`, typically the id of an added row.
    pub fn ret(&self) -> Option<&str> {
        self.done.get("ret").map(String::as_str)
    }
}

// ── Capability queries ──────────────────────────────────────────────

/// A view of a connector that may or may not be available at runtime.
///
/// Implemented for capability trait objects (`dyn CommandConnector`) and for
/// concrete connector types. Custom connectors opt in with
/// [`downcast_connector`]:
///
/// ```rust,ignore
/// impl Capability for MyConnector {
///     fn query<'a>(connector: &'a mut (dyn Connector + 'static)) -> Option<&'a mut Self> {
///         downcast_connector(connector)
///     }
/// }
/// ```
pub trait Capability: 'static {
    fn query<'a>(connector: &'a mut (dyn Connector + 'static)) -> Option<&'a mut Self>;
}

impl Capability for dyn CommandConnector {
    fn query<'a>(connector: &'a mut (dyn Connector + 'static)) -> Option<&'a mut Self> {
        connector.as_command_mut()
    }
}

/// Downcast a connector trait object to its concrete type.
pub fn downcast_connector<'a, T: Connector>(
    connector: &'a mut (dyn Connector + 'static),
) -> Option<&'a mut T> {
    let any: &mut dyn Any = connector;
    any.downcast_mut::<T>()
}
