// Integration tests for `ApiConnector` against a loopback fake device.
#![allow(clippy::unwrap_used)]

use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use pretty_assertions::assert_eq;

use tikly_api::wire;
use tikly_api::{
    ApiConnector, CommandConnector, Connector, ConnectorLogger, Direction, Error, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn sentence(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_owned()).collect()
}

/// Serve one connection, answering each request sentence with whatever
/// `handler` returns. `/quit` is answered with `!fatal` and ends the loop.
fn spawn_device<F>(handler: F) -> (u16, JoinHandle<()>)
where
    F: Fn(&[String]) -> Vec<Vec<String>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut sock, _) = listener.accept().unwrap();
        loop {
            let Ok(words) = wire::read_sentence(&mut sock) else {
                return;
            };
            if words.first().map(String::as_str) == Some("/quit") {
                let _ = wire::write_sentence(&mut sock, &["!fatal", "session terminated on request"]);
                return;
            }
            for reply in handler(&words) {
                if wire::write_sentence(&mut sock, &reply).is_err() {
                    return;
                }
            }
        }
    });
    (port, handle)
}

/// A device that accepts `admin` with an empty password.
fn router(words: &[String]) -> Vec<Vec<String>> {
    match words[0].as_str() {
        "/login" if words.contains(&"=name=admin".to_owned()) => vec![sentence(&["!done"])],
        "/login" => vec![
            sentence(&["!trap", "=message=invalid user name or password (6)"]),
            sentence(&["!done"]),
        ],
        "/system/identity/print" => vec![
            sentence(&["!re", "=name=core-rtr"]),
            sentence(&["!done"]),
        ],
        "/interface/print" => vec![
            sentence(&["!re", "=.id=*1", "=name=ether1", "=mtu=1500", "=fw-only-field=x"]),
            sentence(&["!re", "=.id=*2", "=name=ether2", "=mtu=1500"]),
            sentence(&["!done"]),
        ],
        "/queue/simple/add" => vec![sentence(&["!done", "=ret=*1A"])],
        "/ip/address/print" => vec![sentence(&["!empty"]), sentence(&["!done"])],
        "/tool/sniffer/print" => vec![sentence(&["!surprise"]), sentence(&["!done"])],
        _ => vec![
            sentence(&["!trap", "=category=0", "=message=no such command"]),
            sentence(&["!done"]),
        ],
    }
}

fn connector() -> ApiConnector {
    ApiConnector::plain(TransportConfig {
        timeout: Duration::from_secs(5),
        ..TransportConfig::default()
    })
}

#[derive(Default)]
struct Recorder(Mutex<Vec<(Direction, String)>>);

impl ConnectorLogger for Recorder {
    fn log(&self, direction: Direction, word: &str) {
        self.0.lock().unwrap().push((direction, word.to_owned()));
    }
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[test]
fn open_logs_on_and_close_is_idempotent() {
    let (port, device) = spawn_device(router);
    let mut api = connector();
    assert!(!api.is_logged_on());

    api.open("127.0.0.1", port, "admin", "").unwrap();
    assert!(api.is_logged_on());

    api.close();
    api.close();
    assert!(!api.is_logged_on());
    device.join().unwrap();
}

#[test]
fn rejected_login_is_authentication_error() {
    let (port, device) = spawn_device(router);
    let mut api = connector();

    let err = api.open("127.0.0.1", port, "intruder", "guess").unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }), "got {err:?}");
    assert!(!api.is_logged_on());

    drop(api);
    device.join().unwrap();
}

#[test]
fn call_before_open_is_not_connected() {
    let mut api = connector();
    let err = api.call("/interface/print", &[]).unwrap_err();
    assert!(matches!(err, Error::NotConnected));
}

#[test]
fn default_ports_match_transport() {
    assert_eq!(connector().default_port(), 8728);
    assert_eq!(ApiConnector::tls(TransportConfig::default()).default_port(), 8729);
}

// ── Commands ────────────────────────────────────────────────────────

#[test]
fn print_collects_rows_in_order_with_unknown_fields() {
    let (port, device) = spawn_device(router);
    let mut api = connector();
    api.open("127.0.0.1", port, "admin", "").unwrap();

    let resp = api.call("/interface/print", &[]).unwrap();
    assert_eq!(resp.rows.len(), 2);
    let keys: Vec<&str> = resp.rows[0].keys().map(String::as_str).collect();
    assert_eq!(keys, vec![".id", "name", "mtu", "fw-only-field"]);

    api.close();
    device.join().unwrap();
}

#[test]
fn add_returns_new_id_on_done() {
    let (port, device) = spawn_device(router);
    let mut api = connector();
    api.open("127.0.0.1", port, "admin", "").unwrap();

    let resp = api
        .call("/queue/simple/add", &[("name", "guest"), ("target", "10.0.0.0/24")])
        .unwrap();
    assert_eq!(resp.ret(), Some("*1A"));

    api.close();
    device.join().unwrap();
}

#[test]
fn trap_is_reported_and_stream_stays_usable() {
    let (port, device) = spawn_device(router);
    let mut api = connector();
    api.open("127.0.0.1", port, "admin", "").unwrap();

    let err = api.call("/bogus/print", &[]).unwrap_err();
    assert_eq!(err.trap_category(), Some(0));
    assert!(api.is_logged_on());

    let resp = api.call("/system/identity/print", &[]).unwrap();
    assert_eq!(resp.rows[0].get("name").unwrap(), "core-rtr");

    api.close();
    device.join().unwrap();
}

#[test]
fn empty_print_reads_through_done() {
    let (port, device) = spawn_device(router);
    let mut api = connector();
    api.open("127.0.0.1", port, "admin", "").unwrap();

    let resp = api.call("/ip/address/print", &[]).unwrap();
    assert!(resp.rows.is_empty());

    // The next reply is its own, not the `!done` left over from the print.
    let resp = api.call("/system/identity/print", &[]).unwrap();
    assert_eq!(resp.rows[0].get("name").unwrap(), "core-rtr");

    api.close();
    device.join().unwrap();
}

#[test]
fn unreadable_reply_drops_connection() {
    let (port, device) = spawn_device(router);
    let mut api = connector();
    api.open("127.0.0.1", port, "admin", "").unwrap();

    let err = api.call("/tool/sniffer/print", &[]).unwrap_err();
    assert!(matches!(err, Error::Protocol { .. }), "got {err:?}");
    assert!(!api.is_logged_on());

    let err = api.call("/system/identity/print", &[]).unwrap_err();
    assert!(matches!(err, Error::NotConnected), "got {err:?}");

    drop(api);
    device.join().unwrap();
}

// ── Logging ─────────────────────────────────────────────────────────

#[test]
fn logger_sees_words_with_password_redacted() {
    let (port, device) = spawn_device(router);
    let recorder = Arc::new(Recorder::default());
    let mut api = connector();
    api.set_logger(Some(recorder.clone()));

    api.open("127.0.0.1", port, "admin", "").unwrap();
    api.set_logger(None);
    api.call("/system/identity/print", &[]).unwrap();

    let seen = recorder.0.lock().unwrap().clone();
    assert!(seen.contains(&(Direction::Sent, "/login".into())));
    assert!(seen.contains(&(Direction::Sent, "=password=***".into())));
    assert!(seen.contains(&(Direction::Received, "!done".into())));
    // Detached before the identity query.
    assert!(!seen.iter().any(|(_, w)| w.contains("core-rtr")));

    api.close();
    device.join().unwrap();
}
