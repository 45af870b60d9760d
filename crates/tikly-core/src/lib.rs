//! Session and entity layer for RouterOS devices.
//!
//! `tikly-core` sits between a transport from `tikly-api` and callers that
//! want typed device rows:
//!
//! - **[`Session`]** owns one [`Connector`](tikly_api::Connector), tracks the
//!   per-thread active-session stack, mediates capability casts and wire
//!   logging, and caches the [`DeviceIdentity`].
//! - **[`PropertyStore`]** holds one row's raw fields with typed coercion
//!   and read-only enforcement.
//! - **[`Entity`]** is one row of a kind described by an [`EntitySchema`];
//!   kinds are data in [`schema`], not generated types.
//! - **[`EntityList`]** loads, saves and removes rows of one kind.
//!
//! Sessions are `!Send`: a session and the stack it lives on stay on the
//! thread that created them.

mod coerce;
pub mod entity;
pub mod error;
pub mod identity;
pub mod list;
pub mod logging;
pub mod schema;
pub mod session;
pub mod store;

pub use entity::{Entity, Value};
pub use error::CoreError;
pub use identity::DeviceIdentity;
pub use list::EntityList;
pub use logging::{LogFactory, NoopLogFactory, TracingLogFactory, install_log_factory, log_factory};
pub use schema::{EntitySchema, FieldSpec, FieldType};
pub use session::{Session, SessionOptions, SessionState, active_depth};
pub use store::{EditMode, PropertyStore};

// Re-exported so callers can name connector types without a direct dependency.
pub use tikly_api::{Capability, CommandConnector, Connector, ConnectorType, Row};
