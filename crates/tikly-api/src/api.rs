// RouterOS API connector
//
// Speaks the sentence protocol from `wire` over plain TCP or TLS. One
// command is in flight at a time: `call` writes a sentence and reads
// replies until `!done`, so tags are never needed.

use std::io::BufReader;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::connector::{Capability, CommandConnector, Connector, ConnectorType, Response, downcast_connector};
use crate::error::Error;
use crate::logger::{ConnectorLogger, Direction, redact};
use crate::transport::{Stream, TransportConfig};
use crate::wire::{self, Reply};

/// Built-in RouterOS API client.
///
/// Create with [`ApiConnector::plain`] (port 8728) or [`ApiConnector::tls`]
/// (port 8729). Login uses the post-6.43 plaintext `/login` sentence, which
/// is why the TLS flavour is the one to prefer on untrusted networks.
pub struct ApiConnector {
    tls: bool,
    transport: TransportConfig,
    stream: Option<BufReader<Box<dyn Stream>>>,
    logged_on: bool,
    logger: Option<Arc<dyn ConnectorLogger>>,
}

impl ApiConnector {
    /// Plain-TCP API connector.
    pub fn plain(transport: TransportConfig) -> Self {
        Self::new(false, transport)
    }

    /// TLS API connector.
    pub fn tls(transport: TransportConfig) -> Self {
        Self::new(true, transport)
    }

    fn new(tls: bool, transport: TransportConfig) -> Self {
        Self {
            tls,
            transport,
            stream: None,
            logged_on: false,
            logger: None,
        }
    }

    /// Which connector type this instance implements.
    pub fn connector_type(&self) -> ConnectorType {
        if self.tls {
            ConnectorType::ApiSsl
        } else {
            ConnectorType::Api
        }
    }

    /// The transport settings this connector dials with.
    pub fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    /// Whether a wire logger is attached.
    pub fn has_logger(&self) -> bool {
        self.logger.is_some()
    }

    fn send(&mut self, words: &[String]) -> Result<(), Error> {
        if let Some(logger) = &self.logger {
            for word in words {
                logger.log(Direction::Sent, redact(word));
            }
        }
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        wire::write_sentence(stream.get_mut(), words)
    }

    fn receive(&mut self) -> Result<Reply, Error> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        let words = wire::read_sentence(stream)?;
        if let Some(logger) = &self.logger {
            for word in &words {
                logger.log(Direction::Received, word);
            }
        }
        wire::parse_reply(&words)
    }

    /// Send one sentence and read the whole reply.
    fn exchange(&mut self, words: &[String]) -> Result<Response, Error> {
        self.send(words)?;

        let mut response = Response::default();
        let mut trap = None;
        loop {
            match self.receive() {
                Ok(Reply::Re(row)) => response.rows.push(row),
                Ok(Reply::Empty) => {}
                Ok(Reply::Done(attrs)) => {
                    response.done = attrs;
                    break;
                }
                // A trap is followed by `!done`; keep reading so the stream
                // stays aligned for the next command.
                Ok(Reply::Trap { category, message }) => {
                    trap.get_or_insert(Error::Trap { category, message });
                }
                Ok(Reply::Fatal(message)) => {
                    self.drop_connection();
                    return Err(Error::Fatal { message });
                }
                // The rest of the reply can no longer be framed, so the
                // connection is unusable.
                Err(e) => {
                    self.drop_connection();
                    return Err(e);
                }
            }
        }

        match trap {
            Some(err) => Err(err),
            None => Ok(response),
        }
    }

    fn drop_connection(&mut self) {
        self.stream = None;
        self.logged_on = false;
    }
}

impl Connector for ApiConnector {
    fn open(&mut self, host: &str, port: u16, user: &str, password: &str) -> Result<(), Error> {
        if self.stream.is_some() {
            return Err(Error::AlreadyOpen);
        }

        debug!(host, port, tls = self.tls, "opening API connection");
        let stream: Box<dyn Stream> = if self.tls {
            self.transport.dial_tls(host, port)?
        } else {
            Box::new(self.transport.dial(host, port)?)
        };
        self.stream = Some(BufReader::new(stream));

        let login = vec![
            "/login".to_owned(),
            wire::attribute("name", user),
            wire::attribute("password", password),
        ];
        match self.exchange(&login) {
            Ok(_) => {
                self.logged_on = true;
                debug!(host, user, "logged on");
                Ok(())
            }
            Err(Error::Trap { message, .. }) => {
                self.drop_connection();
                Err(Error::Authentication { message })
            }
            Err(e) => {
                self.drop_connection();
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        if self.stream.is_none() {
            return;
        }
        if self.logged_on {
            // `/quit` is answered with `!fatal`; either way the socket goes.
            let quit = vec!["/quit".to_owned()];
            if let Err(e) = self.send(&quit) {
                warn!(error = %e, "failed to send /quit");
            }
        }
        self.drop_connection();
        debug!("API connection closed");
    }

    fn is_logged_on(&self) -> bool {
        self.logged_on
    }

    fn set_logger(&mut self, logger: Option<Arc<dyn ConnectorLogger>>) {
        self.logger = logger;
    }

    fn default_port(&self) -> u16 {
        if self.tls { 8729 } else { 8728 }
    }

    fn as_command_mut(&mut self) -> Option<&mut (dyn CommandConnector + 'static)> {
        Some(self)
    }
}

impl CommandConnector for ApiConnector {
    fn call(&mut self, command: &str, args: &[(&str, &str)]) -> Result<Response, Error> {
        if !self.logged_on {
            return Err(Error::NotConnected);
        }
        let mut words = Vec::with_capacity(args.len() + 1);
        words.push(command.to_owned());
        words.extend(args.iter().map(|(k, v)| wire::attribute(k, v)));
        self.exchange(&words)
    }
}

impl Capability for ApiConnector {
    fn query<'a>(connector: &'a mut (dyn Connector + 'static)) -> Option<&'a mut Self> {
        downcast_connector(connector)
    }
}

impl Drop for ApiConnector {
    fn drop(&mut self) {
        self.close();
    }
}
