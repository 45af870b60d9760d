// ── Session manager ──
//
// A Session owns exactly one connector for its whole lifetime and is the
// "current" session of its thread from the moment it is created until it
// is disposed. Handles are cheap `Rc` clones and `!Send`: a
// session never leaves the thread that created it.

use std::cell::{Cell, OnceCell, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use strum::Display;
use tracing::{debug, warn};

use tikly_api::{
    ApiConnector, Capability, CommandConnector, Connector, ConnectorType, TransportConfig,
};

use crate::error::CoreError;
use crate::identity::DeviceIdentity;
use crate::logging::{self, LogFactory};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

// ── Active-session stack ─────────────────────────────────────────

struct StackEntry {
    id: u64,
    session: Weak<SessionInner>,
}

thread_local! {
    static ACTIVE: RefCell<Vec<StackEntry>> = const { RefCell::new(Vec::new()) };
}

fn push_active(id: u64, session: Weak<SessionInner>) {
    ACTIVE.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack.retain(|e| e.session.strong_count() > 0);
        stack.push(StackEntry { id, session });
    });
}

/// Remove `id` wherever it sits. Returns whether it was the top entry.
fn remove_active(id: u64) -> Option<bool> {
    // `try_with`: sessions may be dropped while thread-locals are torn down.
    ACTIVE
        .try_with(|stack| {
            let mut stack = stack.borrow_mut();
            let pos = stack.iter().rposition(|e| e.id == id)?;
            let was_top = pos + 1 == stack.len();
            stack.remove(pos);
            Some(was_top)
        })
        .ok()
        .flatten()
}

/// Number of sessions on the current thread's stack.
pub fn active_depth() -> usize {
    ACTIVE.with(|stack| {
        stack
            .borrow()
            .iter()
            .filter(|e| e.session.strong_count() > 0)
            .count()
    })
}

// ── Types ────────────────────────────────────────────────────────

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    /// Constructed; `open` not yet called or not yet successful.
    Created,
    /// `open` succeeded.
    Opened,
    /// Disposed. Terminal.
    Closed,
}

/// Construction-time settings for a session.
#[derive(Clone, Default)]
pub struct SessionOptions {
    /// Socket settings handed to built-in connectors.
    pub transport: TransportConfig,
    /// Overrides the process-wide log factory for this session only.
    pub log_factory: Option<Arc<dyn LogFactory>>,
}

impl fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptions")
            .field("transport", &self.transport)
            .field("log_factory", &self.log_factory.as_ref().map(|_| ".."))
            .finish()
    }
}

// ── Session ──────────────────────────────────────────────────────

/// One logical connection to a device.
///
/// Creating a session pushes it onto the current thread's active-session
/// stack; [`dispose`](Self::dispose), or dropping the last handle, removes
/// it and closes the connector. Entities and lists created without an
/// explicit session bind to [`Session::active`].
#[derive(Clone)]
pub struct Session {
    inner: Rc<SessionInner>,
}

struct SessionInner {
    id: u64,
    connector_type: ConnectorType,
    connector: RefCell<Box<dyn Connector>>,
    state: Cell<SessionState>,
    /// Set when dispose found the connector borrowed and could not close it.
    close_pending: Cell<bool>,
    logging: Cell<bool>,
    log_factory: Arc<dyn LogFactory>,
    identity: OnceCell<Arc<DeviceIdentity>>,
}

impl Session {
    /// Create a session over the built-in connector for `connector_type`.
    ///
    /// `Ssh` and `Telnet` fail with [`CoreError::UnsupportedTransport`];
    /// `Custom` fails with [`CoreError::Config`] because it needs an
    /// instance (see [`with_connector`](Self::with_connector)).
    pub fn new(connector_type: ConnectorType) -> Result<Self, CoreError> {
        Self::with_options(connector_type, SessionOptions::default())
    }

    /// Like [`new`](Self::new), with explicit transport and logging settings.
    pub fn with_options(
        connector_type: ConnectorType,
        options: SessionOptions,
    ) -> Result<Self, CoreError> {
        let connector: Box<dyn Connector> = match connector_type {
            ConnectorType::Api => Box::new(ApiConnector::plain(options.transport)),
            ConnectorType::ApiSsl => Box::new(ApiConnector::tls(options.transport)),
            ConnectorType::Ssh | ConnectorType::Telnet => {
                return Err(CoreError::UnsupportedTransport { connector_type });
            }
            ConnectorType::Custom => {
                return Err(CoreError::Config {
                    message: "custom transport requires a connector instance".into(),
                });
            }
        };
        Ok(Self::register(connector_type, connector, options.log_factory))
    }

    /// Create a session over a caller-supplied connector.
    pub fn with_connector(connector: impl Connector) -> Self {
        Self::register(ConnectorType::Custom, Box::new(connector), None)
    }

    /// Like [`with_connector`](Self::with_connector), with a per-session log factory.
    pub fn with_connector_and_logging(
        connector: impl Connector,
        log_factory: Arc<dyn LogFactory>,
    ) -> Self {
        Self::register(ConnectorType::Custom, Box::new(connector), Some(log_factory))
    }

    fn register(
        connector_type: ConnectorType,
        connector: Box<dyn Connector>,
        log_factory: Option<Arc<dyn LogFactory>>,
    ) -> Self {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        let inner = Rc::new(SessionInner {
            id,
            connector_type,
            connector: RefCell::new(connector),
            state: Cell::new(SessionState::Created),
            close_pending: Cell::new(false),
            logging: Cell::new(false),
            log_factory: log_factory.unwrap_or_else(logging::log_factory),
            identity: OnceCell::new(),
        });
        push_active(id, Rc::downgrade(&inner));
        debug!(session = id, %connector_type, "session created");
        Self { inner }
    }

    // ── Active session ───────────────────────────────────────────

    /// The most recently created, not yet disposed session on this thread.
    pub fn active() -> Option<Self> {
        ACTIVE.with(|stack| {
            stack
                .borrow()
                .iter()
                .rev()
                .find_map(|e| e.session.upgrade())
                .map(|inner| Self { inner })
        })
    }

    /// [`active`](Self::active), or [`CoreError::NoActiveSession`].
    pub fn require_active() -> Result<Self, CoreError> {
        Self::active().ok_or(CoreError::NoActiveSession)
    }

    /// Whether this session is currently the top of its thread's stack.
    pub fn is_active(&self) -> bool {
        Self::active().is_some_and(|s| s.ptr_eq(self))
    }

    /// Whether two handles refer to the same session.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ── Accessors ────────────────────────────────────────────────

    /// Process-unique session number (used in log fields).
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn connector_type(&self) -> ConnectorType {
        self.inner.connector_type
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.get()
    }

    /// Whether the connector currently holds a login.
    pub fn is_logged_on(&self) -> bool {
        self.inner
            .connector
            .try_borrow()
            .is_ok_and(|c| c.is_logged_on())
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Connect on the connector's default port.
    pub fn open(&self, host: &str, user: &str, password: &str) -> Result<(), CoreError> {
        let port = self.connector()?.default_port();
        self.open_with_port(host, port, user, password)
    }

    /// Connect on an explicit port.
    ///
    /// A failed open leaves the session in [`SessionState::Created`];
    /// it can be retried or disposed.
    pub fn open_with_port(
        &self,
        host: &str,
        port: u16,
        user: &str,
        password: &str,
    ) -> Result<(), CoreError> {
        match self.state() {
            SessionState::Closed => return Err(CoreError::SessionDisposed),
            SessionState::Opened => return Err(tikly_api::Error::AlreadyOpen.into()),
            SessionState::Created => {}
        }

        self.connector()?.open(host, port, user, password)?;
        self.inner.state.set(SessionState::Opened);
        debug!(session = self.inner.id, host, port, "session opened");
        Ok(())
    }

    /// Remove this session from the active stack and close its connector.
    ///
    /// Idempotent, and safe on a session that was never opened.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    // ── Connector access ─────────────────────────────────────────

    /// Borrow the owned connector through its minimal contract.
    pub fn connector(&self) -> Result<RefMut<'_, dyn Connector + 'static>, CoreError> {
        let guard = self
            .inner
            .connector
            .try_borrow_mut()
            .map_err(|_| CoreError::ConnectorBusy)?;
        Ok(RefMut::map(guard, |c| c.as_mut()))
    }

    /// Borrow the owned connector as capability `T`.
    ///
    /// `T` is either a capability trait object such as
    /// `dyn CommandConnector`, or a concrete connector type.
    pub fn cast_connector<T: Capability + ?Sized>(&self) -> Result<RefMut<'_, T>, CoreError> {
        if self.state() == SessionState::Closed {
            return Err(CoreError::SessionDisposed);
        }
        let guard = self
            .inner
            .connector
            .try_borrow_mut()
            .map_err(|_| CoreError::ConnectorBusy)?;
        RefMut::filter_map(guard, |c| T::query(c.as_mut())).map_err(|_| {
            CoreError::CapabilityMismatch {
                capability: std::any::type_name::<T>(),
            }
        })
    }

    /// Run `f` against the active session's connector viewed as `T`.
    pub fn with_active_connector<T, R>(f: impl FnOnce(&mut T) -> R) -> Result<R, CoreError>
    where
        T: Capability + ?Sized,
    {
        let session = Self::require_active()?;
        let mut connector = session.cast_connector::<T>()?;
        Ok(f(&mut connector))
    }

    // ── Logging ──────────────────────────────────────────────────

    /// Attach (`true`) or detach (`false`) a wire logger from the factory.
    pub fn set_connector_logging(&self, enabled: bool) -> Result<(), CoreError> {
        if self.inner.logging.get() == enabled {
            return Ok(());
        }
        let logger = enabled.then(|| {
            let name = format!("{}#{}", self.inner.connector_type, self.inner.id);
            self.inner.log_factory.create_logger(&name)
        });
        self.connector()?.set_logger(logger);
        self.inner.logging.set(enabled);
        Ok(())
    }

    pub fn connector_logging(&self) -> bool {
        self.inner.logging.get()
    }

    // ── Device identity ──────────────────────────────────────────

    /// Identity and resource snapshot of the device, fetched on first call
    /// and cached for the session's lifetime.
    pub fn device_identity(&self) -> Result<Arc<DeviceIdentity>, CoreError> {
        if let Some(identity) = self.inner.identity.get() {
            return Ok(Arc::clone(identity));
        }

        let identity = {
            let mut conn = self.cast_connector::<dyn CommandConnector>()?;
            let resource = conn.call("/system/resource/print", &[])?;
            let name = conn.call("/system/identity/print", &[])?;
            DeviceIdentity::from_rows(name.rows.first(), resource.rows.first())?
        };
        debug!(session = self.inner.id, identity = ?identity.name, "device identity cached");

        // First value wins if a re-entrant caller filled the cell meanwhile.
        Ok(Arc::clone(
            self.inner.identity.get_or_init(|| Arc::new(identity)),
        ))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("connector_type", &self.inner.connector_type)
            .field("state", &self.inner.state.get())
            .finish_non_exhaustive()
    }
}

impl SessionInner {
    fn dispose(&self) {
        if self.state.get() == SessionState::Closed {
            if self.close_pending.get() {
                self.close_connector();
            }
            return;
        }
        self.state.set(SessionState::Closed);

        match remove_active(self.id) {
            Some(true) | None => {}
            Some(false) => debug!(session = self.id, "session disposed out of creation order"),
        }

        self.close_connector();
        debug!(session = self.id, "session disposed");
    }

    /// Close the connector, or leave the close pending for the next
    /// `dispose` (or the final drop) if it is still borrowed.
    fn close_connector(&self) {
        match self.connector.try_borrow_mut() {
            Ok(mut connector) => {
                connector.close();
                self.close_pending.set(false);
            }
            Err(_) => {
                warn!(session = self.id, "connector borrowed during dispose, close deferred");
                self.close_pending.set(true);
            }
        }
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.dispose();
    }
}
