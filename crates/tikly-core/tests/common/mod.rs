// Shared stub connectors for tikly-core integration tests.
#![allow(clippy::unwrap_used, dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use tikly_api::{
    Capability, CommandConnector, Connector, ConnectorLogger, Direction, Error, Response, Row,
    downcast_connector,
};
use tikly_core::LogFactory;

pub fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

// ── StubConnector ───────────────────────────────────────────────────

/// Observable state of a [`StubConnector`], shared with the test after
/// the connector has moved into a session.
#[derive(Default)]
pub struct StubState {
    pub opened: Vec<(String, u16, String)>,
    pub closes: usize,
    pub logged_on: bool,
    pub reject_login: bool,
    pub logger: Option<Arc<dyn ConnectorLogger>>,
    pub calls: Vec<(String, Vec<(String, String)>)>,
    pub replies: HashMap<String, Response>,
}

impl StubState {
    pub fn reply(&mut self, command: &str, rows: Vec<Row>) {
        self.replies.insert(
            command.to_owned(),
            Response {
                rows,
                done: Row::new(),
            },
        );
    }

    pub fn reply_ret(&mut self, command: &str, ret: &str) {
        self.replies.insert(
            command.to_owned(),
            Response {
                rows: Vec::new(),
                done: row(&[("ret", ret)]),
            },
        );
    }

    pub fn commands(&self) -> Vec<&str> {
        self.calls.iter().map(|(c, _)| c.as_str()).collect()
    }
}

/// In-memory connector with command capability.
#[derive(Default)]
pub struct StubConnector {
    pub state: Rc<RefCell<StubState>>,
}

impl StubConnector {
    pub fn new() -> (Self, Rc<RefCell<StubState>>) {
        let stub = Self::default();
        let state = Rc::clone(&stub.state);
        (stub, state)
    }
}

impl Connector for StubConnector {
    fn open(&mut self, host: &str, port: u16, user: &str, _password: &str) -> Result<(), Error> {
        let mut state = self.state.borrow_mut();
        if state.reject_login {
            return Err(Error::Authentication {
                message: "invalid user name or password".into(),
            });
        }
        state.opened.push((host.to_owned(), port, user.to_owned()));
        state.logged_on = true;
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        if state.logged_on {
            state.logged_on = false;
            state.closes += 1;
        }
    }

    fn is_logged_on(&self) -> bool {
        self.state.borrow().logged_on
    }

    fn set_logger(&mut self, logger: Option<Arc<dyn ConnectorLogger>>) {
        self.state.borrow_mut().logger = logger;
    }

    fn default_port(&self) -> u16 {
        8728
    }

    fn as_command_mut(&mut self) -> Option<&mut (dyn CommandConnector + 'static)> {
        Some(self)
    }
}

impl CommandConnector for StubConnector {
    fn call(&mut self, command: &str, args: &[(&str, &str)]) -> Result<Response, Error> {
        let mut state = self.state.borrow_mut();
        if !state.logged_on {
            return Err(Error::NotConnected);
        }
        if let Some(logger) = &state.logger {
            logger.log(Direction::Sent, command);
        }
        state.calls.push((
            command.to_owned(),
            args.iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        ));
        Ok(state.replies.get(command).cloned().unwrap_or_default())
    }
}

impl Capability for StubConnector {
    fn query<'a>(connector: &'a mut (dyn Connector + 'static)) -> Option<&'a mut Self> {
        downcast_connector(connector)
    }
}

// ── BareConnector ───────────────────────────────────────────────────

/// Satisfies only the minimal contract: no command capability.
#[derive(Default)]
pub struct BareConnector {
    logged_on: bool,
}

impl Connector for BareConnector {
    fn open(&mut self, _host: &str, _port: u16, _user: &str, _password: &str) -> Result<(), Error> {
        self.logged_on = true;
        Ok(())
    }

    fn close(&mut self) {
        self.logged_on = false;
    }

    fn is_logged_on(&self) -> bool {
        self.logged_on
    }

    fn set_logger(&mut self, _logger: Option<Arc<dyn ConnectorLogger>>) {}

    fn default_port(&self) -> u16 {
        23
    }
}

// ── Recording log factory ───────────────────────────────────────────

#[derive(Default)]
pub struct RecordingLogger {
    pub words: Mutex<Vec<String>>,
}

impl ConnectorLogger for RecordingLogger {
    fn log(&self, _direction: Direction, word: &str) {
        self.words.lock().unwrap().push(word.to_owned());
    }
}

/// Hands out one shared [`RecordingLogger`] and remembers requested names.
#[derive(Default)]
pub struct RecordingFactory {
    pub names: Mutex<Vec<String>>,
    pub logger: Arc<RecordingLogger>,
}

impl LogFactory for RecordingFactory {
    fn create_logger(&self, name: &str) -> Arc<dyn ConnectorLogger> {
        self.names.lock().unwrap().push(name.to_owned());
        self.logger.clone()
    }
}
