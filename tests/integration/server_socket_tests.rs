//! Socket-level server tests over the loopback interface.
//!
//! Each test binds its own port so they can run in parallel. The server
//! thread is detached — `run()` never returns — which is fine for a test
//! process.

use std::time::Duration;

use crate::mocks::MockRestart;

use autoswitch::adapters::nvs::NvsStore;
use autoswitch::client::{send_command, DatagramPort, RetryPolicy, SendOutcome, UdpTransport};
use autoswitch::config::{KEY_SSID, SSID_RESTART_DELAY_SECS};
use autoswitch::period::Period;
use autoswitch::ports::StoragePort;
use autoswitch::protocol::Message;
use autoswitch::scheduler::PeriodQueue;
use autoswitch::server::CommandServer;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Start a server on `port` with a shared store handle and restart probe.
/// Returns handles the test can observe while the server runs.
fn start_server(port: u16) -> (NvsStore, MockRestart, &'static PeriodQueue) {
    let store = NvsStore::new().unwrap();
    let restart = MockRestart::new();
    let queue: &'static PeriodQueue = Box::leak(Box::new(PeriodQueue::new()));

    let server_store = store.clone();
    let server_restart = restart.clone();
    std::thread::Builder::new()
        .name("udp-server".into())
        .spawn(move || CommandServer::new(port, server_store, server_restart).run(queue))
        .unwrap();

    // Give the server a moment to bind before the first send.
    std::thread::sleep(Duration::from_millis(50));
    (store, restart, queue)
}

fn transport(port: u16) -> UdpTransport {
    UdpTransport::connect(("127.0.0.1", port), RECV_TIMEOUT).unwrap()
}

#[test]
fn period_command_is_echoed_and_enqueued() {
    let (_store, _restart, queue) = start_server(42511);
    let mut link = transport(42511);

    let msg = Message::Period {
        raw: Period::new(7, 0, 22, 0).unwrap().as_bytes(),
    };
    assert_eq!(
        send_command(&mut link, &msg, RetryPolicy::default()),
        SendOutcome::Acked
    );
    assert_eq!(queue.pop(), Some(Period::new(7, 0, 22, 0).unwrap()));
}

#[test]
fn malformed_frame_gets_invalid_reply() {
    let (_store, _restart, _queue) = start_server(42512);
    let mut link = transport(42512);

    link.send(&[0u8, 1, 2]).unwrap(); // PERIOD frame of the wrong length
    let mut buf = [0u8; 64];
    let len = link.recv(&mut buf).unwrap();
    assert_eq!(&buf[..len], b"invalid");
}

#[test]
fn server_recovers_socket_after_malformed_frame() {
    let (_store, _restart, queue) = start_server(42513);

    let mut link = transport(42513);
    link.send(&[0u8, 9]).unwrap();
    let mut buf = [0u8; 64];
    let len = link.recv(&mut buf).unwrap();
    assert_eq!(&buf[..len], b"invalid");

    // The socket was torn down and re-created; a fresh valid command must
    // still be served. Allow a few attempts while the rebind happens.
    let mut link = transport(42513);
    let msg = Message::Period {
        raw: Period::new(6, 30, 23, 15).unwrap().as_bytes(),
    };
    assert_eq!(
        send_command(&mut link, &msg, RetryPolicy { max_attempts: 5 }),
        SendOutcome::Acked
    );
    assert_eq!(queue.pop(), Some(Period::new(6, 30, 23, 15).unwrap()));
}

#[test]
fn unknown_flag_is_ignored_but_socket_survives() {
    let (_store, _restart, queue) = start_server(42514);
    let mut link = transport(42514);

    link.send(&[42u8, 1, 2, 3]).unwrap();
    let mut buf = [0u8; 64];
    assert!(link.recv(&mut buf).is_err(), "no reply to an unknown flag");

    // Same socket, no restart cycle: next command answers immediately.
    let msg = Message::Period {
        raw: Period::new(7, 0, 22, 0).unwrap().as_bytes(),
    };
    assert_eq!(
        send_command(&mut link, &msg, RetryPolicy { max_attempts: 2 }),
        SendOutcome::Acked
    );
    assert_eq!(queue.pop(), Some(Period::new(7, 0, 22, 0).unwrap()));
}

#[test]
fn ssid_command_echoes_persists_and_schedules_restart() {
    let (store, restart, _queue) = start_server(42515);
    let mut link = transport(42515);

    let msg = Message::credentials("new-net", "new-pass-123").unwrap();
    assert_eq!(
        send_command(&mut link, &msg, RetryPolicy::default()),
        SendOutcome::Acked,
        "ack must be the byte-identical 97-byte echo"
    );

    // The restart is scheduled with the settling delay, not performed.
    assert_eq!(restart.scheduled(), 1);
    assert_eq!(
        restart.last_delay(),
        Some(Duration::from_secs(SSID_RESTART_DELAY_SECS))
    );

    // Credentials are durable through the shared store handle.
    let mut buf = [0u8; 64];
    let len = store.get(KEY_SSID, &mut buf).unwrap();
    assert_eq!(&buf[..len], b"new-net");
}
