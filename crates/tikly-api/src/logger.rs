// Wire-level logging hooks for connectors.
//
// Connectors never construct loggers themselves; a session hands them one
// (or takes it away) through `Connector::set_logger`.

use tracing::trace;

/// Which way a word travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    fn arrow(self) -> &'static str {
        match self {
            Self::Sent => ">>>",
            Self::Received => "<<<",
        }
    }
}

/// Receives every word a connector writes or reads.
pub trait ConnectorLogger: Send + Sync {
    fn log(&self, direction: Direction, word: &str);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl ConnectorLogger for NoopLogger {
    fn log(&self, _direction: Direction, _word: &str) {}
}

/// Forwards words to `tracing` at TRACE level under the `tikly::wire` target.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    name: String,
}

impl TracingLogger {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ConnectorLogger for TracingLogger {
    fn log(&self, direction: Direction, word: &str) {
        trace!(target: "tikly::wire", connector = %self.name, "{} {word}", direction.arrow());
    }
}

/// Mask the value of secret attribute words before they reach a logger.
pub fn redact(word: &str) -> &str {
    if word.starts_with("=password=") {
        "=password=***"
    } else {
        word
    }
}
