// Session lifecycle, active-session stack, capability casts and logging.
#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use strum::IntoEnumIterator;

use tikly_api::{ApiConnector, CommandConnector, ConnectorType};
use tikly_core::{
    CoreError, Entity, Session, SessionOptions, SessionState, active_depth, schema,
};

use common::{BareConnector, RecordingFactory, StubConnector, row};

fn stub_session() -> (Session, std::rc::Rc<std::cell::RefCell<common::StubState>>) {
    let (stub, state) = StubConnector::new();
    (Session::with_connector(stub), state)
}

// ── Construction ────────────────────────────────────────────────────

#[test]
fn builtin_types_construct_and_others_fail() {
    for ty in ConnectorType::iter() {
        let result = Session::new(ty);
        match ty {
            ConnectorType::Api | ConnectorType::ApiSsl => {
                let session = result.unwrap();
                assert_eq!(session.connector_type(), ty);
                assert_eq!(session.state(), SessionState::Created);
                assert!(session.cast_connector::<ApiConnector>().is_ok());
            }
            ConnectorType::Ssh | ConnectorType::Telnet => {
                assert!(matches!(
                    result,
                    Err(CoreError::UnsupportedTransport { connector_type }) if connector_type == ty
                ));
            }
            ConnectorType::Custom => {
                assert!(matches!(result, Err(CoreError::Config { .. })));
            }
        }
    }
}

#[test]
fn builtin_connector_uses_standard_port() {
    let session = Session::new(ConnectorType::ApiSsl).unwrap();
    assert_eq!(session.connector().unwrap().default_port(), 8729);
}

#[test]
fn options_transport_reaches_builtin_connector() {
    let options = SessionOptions {
        transport: tikly_api::TransportConfig {
            timeout: std::time::Duration::from_secs(3),
            ..Default::default()
        },
        ..SessionOptions::default()
    };
    let session = Session::with_options(ConnectorType::Api, options).unwrap();
    let api = session.cast_connector::<ApiConnector>().unwrap();
    assert_eq!(api.transport().timeout, std::time::Duration::from_secs(3));
}

// ── Active-session stack ────────────────────────────────────────────

#[test]
fn newest_session_is_active_until_disposed() {
    assert!(Session::active().is_none());

    let a = Session::with_connector(BareConnector::default());
    assert!(a.is_active());

    let b = Session::with_connector(BareConnector::default());
    assert!(Session::active().unwrap().ptr_eq(&b));
    assert!(!a.is_active());

    b.dispose();
    assert!(Session::active().unwrap().ptr_eq(&a));

    a.dispose();
    assert!(Session::active().is_none());
    assert_eq!(active_depth(), 0);
}

#[test]
fn out_of_order_dispose_removes_only_that_session() {
    let a = Session::with_connector(BareConnector::default());
    let b = Session::with_connector(BareConnector::default());
    let c = Session::with_connector(BareConnector::default());

    b.dispose();
    assert!(Session::active().unwrap().ptr_eq(&c));
    assert_eq!(active_depth(), 2);

    c.dispose();
    assert!(Session::active().unwrap().ptr_eq(&a));
}

#[test]
fn dropping_last_handle_disposes() {
    let (stub, state) = StubConnector::new();
    {
        let session = Session::with_connector(stub);
        session.open("10.0.0.1", "admin", "").unwrap();
        let _clone = session.clone();
    }
    assert!(Session::active().is_none());
    assert_eq!(state.borrow().closes, 1);
}

#[test]
fn require_active_without_session_fails() {
    assert!(matches!(
        Session::require_active(),
        Err(CoreError::NoActiveSession)
    ));
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[test]
fn open_uses_default_port_and_moves_to_opened() {
    let (session, state) = stub_session();
    session.open("10.0.0.1", "admin", "").unwrap();

    assert_eq!(session.state(), SessionState::Opened);
    assert!(session.is_logged_on());
    assert_eq!(
        state.borrow().opened,
        vec![("10.0.0.1".to_owned(), 8728, "admin".to_owned())]
    );
}

#[test]
fn open_with_port_overrides_default() {
    let (session, state) = stub_session();
    session.open_with_port("10.0.0.1", 18728, "admin", "").unwrap();
    assert_eq!(state.borrow().opened[0].1, 18728);
}

#[test]
fn second_open_is_rejected() {
    let (session, _state) = stub_session();
    session.open("10.0.0.1", "admin", "").unwrap();
    let err = session.open("10.0.0.1", "admin", "").unwrap_err();
    assert!(matches!(err, CoreError::Transport(tikly_api::Error::AlreadyOpen)));
}

#[test]
fn failed_open_passes_error_through_and_dispose_is_safe() {
    let (session, state) = stub_session();
    state.borrow_mut().reject_login = true;

    let err = session.open("10.0.0.1", "admin", "wrong").unwrap_err();
    assert!(matches!(
        err,
        CoreError::Transport(tikly_api::Error::Authentication { .. })
    ));
    assert_eq!(session.state(), SessionState::Created);

    session.dispose();
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn dispose_twice_is_idempotent() {
    let (session, state) = stub_session();
    session.open("10.0.0.1", "admin", "").unwrap();

    session.dispose();
    session.dispose();

    assert!(!session.is_logged_on());
    assert_eq!(state.borrow().closes, 1);
    assert!(Session::active().is_none());
}

#[test]
fn dispose_with_connector_borrowed_closes_on_retry() {
    let (session, state) = stub_session();
    session.open("10.0.0.1", "admin", "").unwrap();

    let guard = session.connector().unwrap();
    session.dispose();
    assert_eq!(session.state(), SessionState::Closed);
    drop(guard);
    assert_eq!(state.borrow().closes, 0);

    session.dispose();
    assert!(!state.borrow().logged_on);
    assert_eq!(state.borrow().closes, 1);

    session.dispose();
    assert_eq!(state.borrow().closes, 1);
}

#[test]
fn deferred_close_runs_when_last_handle_drops() {
    let (session, state) = stub_session();
    session.open("10.0.0.1", "admin", "").unwrap();

    let guard = session.connector().unwrap();
    session.dispose();
    drop(guard);
    drop(session);

    assert!(!state.borrow().logged_on);
    assert_eq!(state.borrow().closes, 1);
}

#[test]
fn dispose_without_open_is_a_no_op_close() {
    let (session, state) = stub_session();
    session.dispose();
    assert_eq!(state.borrow().closes, 0);
}

#[test]
fn open_after_dispose_fails() {
    let (session, _state) = stub_session();
    session.dispose();
    assert!(matches!(
        session.open("10.0.0.1", "admin", ""),
        Err(CoreError::SessionDisposed)
    ));
}

// ── Capability casts ────────────────────────────────────────────────

#[test]
fn cast_to_supported_capability_is_usable() {
    let (session, state) = stub_session();
    session.open("10.0.0.1", "admin", "").unwrap();

    session
        .cast_connector::<dyn CommandConnector>()
        .unwrap()
        .call("/system/clock/print", &[])
        .unwrap();
    assert_eq!(state.borrow().commands(), vec!["/system/clock/print"]);

    let stub = session.cast_connector::<StubConnector>().unwrap();
    assert!(stub.state.borrow().logged_on);
}

#[test]
fn cast_to_unsupported_capability_fails() {
    let session = Session::with_connector(BareConnector::default());

    let err = session.cast_connector::<dyn CommandConnector>().err().unwrap();
    assert!(matches!(err, CoreError::CapabilityMismatch { capability } if capability.contains("CommandConnector")));

    assert!(matches!(
        session.cast_connector::<ApiConnector>(),
        Err(CoreError::CapabilityMismatch { .. })
    ));
}

#[test]
fn cast_while_borrowed_reports_busy() {
    let (session, _state) = stub_session();
    let _held = session.connector().unwrap();
    assert!(matches!(
        session.cast_connector::<dyn CommandConnector>(),
        Err(CoreError::ConnectorBusy)
    ));
}

#[test]
fn cast_after_dispose_fails() {
    let (session, _state) = stub_session();
    session.dispose();
    assert!(matches!(
        session.cast_connector::<StubConnector>(),
        Err(CoreError::SessionDisposed)
    ));
}

#[test]
fn with_active_connector_uses_top_of_stack() {
    let (_outer, outer_state) = stub_session();
    let (inner, inner_state) = stub_session();
    inner.open("10.0.0.2", "admin", "").unwrap();

    Session::with_active_connector::<dyn CommandConnector, _>(|c| c.call("/ping", &[]))
        .unwrap()
        .unwrap();

    assert_eq!(inner_state.borrow().commands(), vec!["/ping"]);
    assert!(outer_state.borrow().calls.is_empty());
}

// ── Logging ─────────────────────────────────────────────────────────

#[test]
fn connector_logging_attaches_and_detaches() {
    let factory = Arc::new(RecordingFactory::default());
    let (stub, state) = StubConnector::new();
    let session = Session::with_connector_and_logging(stub, factory.clone());
    session.open("10.0.0.1", "admin", "").unwrap();

    session.set_connector_logging(true).unwrap();
    assert!(session.connector_logging());
    assert!(state.borrow().logger.is_some());
    assert_eq!(
        *factory.names.lock().unwrap(),
        vec![format!("custom#{}", session.id())]
    );

    session
        .cast_connector::<dyn CommandConnector>()
        .unwrap()
        .call("/log/print", &[])
        .unwrap();

    session.set_connector_logging(false).unwrap();
    assert!(state.borrow().logger.is_none());
    assert_eq!(*factory.logger.words.lock().unwrap(), vec!["/log/print"]);
}

#[test]
fn enabling_logging_twice_creates_one_logger() {
    let factory = Arc::new(RecordingFactory::default());
    let session = Session::with_connector_and_logging(BareConnector::default(), factory.clone());
    session.set_connector_logging(true).unwrap();
    session.set_connector_logging(true).unwrap();
    assert_eq!(factory.names.lock().unwrap().len(), 1);
}

// ── Device identity ─────────────────────────────────────────────────

#[test]
fn device_identity_is_fetched_once_and_cached() {
    let (session, state) = stub_session();
    {
        let mut s = state.borrow_mut();
        s.reply("/system/identity/print", vec![row(&[("name", "edge-01")])]);
        s.reply(
            "/system/resource/print",
            vec![row(&[("uptime", "1d00:00:05"), ("cpu-count", "2")])],
        );
    }
    session.open("10.0.0.1", "admin", "").unwrap();

    let first = session.device_identity().unwrap();
    let second = session.device_identity().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.name.as_deref(), Some("edge-01"));
    assert_eq!(first.cpu_count, Some(2));
    assert_eq!(state.borrow().calls.len(), 2);
}

#[test]
fn device_identity_needs_command_capability() {
    let session = Session::with_connector(BareConnector::default());
    assert!(matches!(
        session.device_identity(),
        Err(CoreError::CapabilityMismatch { .. })
    ));
}

// ── End to end ──────────────────────────────────────────────────────

#[test]
fn read_only_log_row_over_stub_session() {
    let (session, state) = stub_session();
    session.open("10.0.0.1", "admin", "").unwrap();

    let mut entry = Entity::from_active_row(
        &schema::LOG,
        row(&[
            ("message", "router rebooted"),
            ("time", "feb/07 12:00:07"),
            ("topics", "system,info"),
        ]),
    )
    .unwrap();
    assert!(entry.session().ptr_eq(&session));

    assert_eq!(entry.get_str("message"), Some("router rebooted"));
    assert_eq!(
        entry.get_list("topics").unwrap(),
        vec!["system".to_owned(), "info".to_owned()]
    );
    assert!(entry.get_datetime("time").unwrap().is_some());

    let err = entry.set("message", "x").unwrap_err();
    assert!(matches!(err, CoreError::ReadOnly { .. }));
    assert_eq!(entry.get_str("message"), Some("router rebooted"));

    drop(entry);
    session.dispose();
    assert!(!state.borrow().logged_on);
    assert_eq!(state.borrow().closes, 1);
    assert!(Session::active().is_none());
}
