//! Process-wide connector logger registry.
//!
//! Sessions obtain wire loggers only through a [`LogFactory`]. The process
//! default is [`NoopLogFactory`]; an application replaces it exactly once at
//! startup with [`install_log_factory`]. A later install is rejected rather
//! than silently swapping the factory out from under live sessions. A single
//! session can still use its own factory through
//! [`SessionOptions::log_factory`](crate::SessionOptions).

use std::sync::{Arc, OnceLock};

use tikly_api::{ConnectorLogger, NoopLogger, TracingLogger};
use tracing::debug;

use crate::error::CoreError;

/// Creates loggers for connectors.
pub trait LogFactory: Send + Sync {
    fn create_logger(&self, name: &str) -> Arc<dyn ConnectorLogger>;
}

/// Default factory: every logger discards its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogFactory;

impl LogFactory for NoopLogFactory {
    fn create_logger(&self, _name: &str) -> Arc<dyn ConnectorLogger> {
        Arc::new(NoopLogger)
    }
}

/// Factory whose loggers forward wire traffic to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogFactory;

impl LogFactory for TracingLogFactory {
    fn create_logger(&self, name: &str) -> Arc<dyn ConnectorLogger> {
        Arc::new(TracingLogger::new(name))
    }
}

static INSTALLED: OnceLock<Arc<dyn LogFactory>> = OnceLock::new();

/// Install the process-wide log factory. Fails if one is already installed.
pub fn install_log_factory(factory: Arc<dyn LogFactory>) -> Result<(), CoreError> {
    INSTALLED
        .set(factory)
        .map_err(|_| CoreError::LogFactoryInstalled)?;
    debug!("log factory installed");
    Ok(())
}

/// The installed factory, or [`NoopLogFactory`] if none was installed.
pub fn log_factory() -> Arc<dyn LogFactory> {
    INSTALLED
        .get()
        .map_or_else(|| Arc::new(NoopLogFactory) as Arc<dyn LogFactory>, Arc::clone)
}
