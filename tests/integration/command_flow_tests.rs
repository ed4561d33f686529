//! End-to-end command flows without sockets: client framing → server
//! dispatch → scheduler/store effects, using mock adapters throughout.

use crate::mocks::{MockGpio, MockStore};

use autoswitch::client::{send_command, DatagramPort, RetryPolicy, SendOutcome};
use autoswitch::config::{KEY_ADDRESS, KEY_PASS, KEY_SSID};
use autoswitch::drivers::relay::RelayDriver;
use autoswitch::error::TransportError;
use autoswitch::period::{DayTime, Period};
use autoswitch::protocol::Message;
use autoswitch::scheduler::{PeriodQueue, RelayScheduler};
use autoswitch::server::{dispatch, Disposition, INVALID_REPLY};

fn at(hour: u8, minute: u8) -> Option<DayTime> {
    Some(DayTime { hour, minute })
}

// ── Period command → scheduler ────────────────────────────────

#[test]
fn period_command_reaches_the_relay_on_next_tick() {
    let mut store = MockStore::new();
    let mut gpio = MockGpio::new();
    let queue = PeriodQueue::new();
    let mut scheduler = RelayScheduler::new(&queue, RelayDriver::new(21));

    // Client-built frame, exactly as it would arrive off the wire.
    let frame = Message::Period {
        raw: Period::new(7, 0, 22, 0).unwrap().as_bytes(),
    }
    .encode();

    assert_eq!(dispatch(&frame, &mut store, &queue), Disposition::Ack);

    // Next tick: the queued window is applied, persisted, and evaluated.
    scheduler.tick(at(12, 0), &mut store, &mut gpio);
    assert_eq!(scheduler.period(), Period::new(7, 0, 22, 0).unwrap());
    assert!(scheduler.relay_is_on());
    assert_eq!(store.commits, 1, "period change must be committed");

    scheduler.tick(at(23, 0), &mut store, &mut gpio);
    assert!(!scheduler.relay_is_on());
}

#[test]
fn rejected_address_leaves_store_untouched() {
    let mut store = MockStore::new();
    store.seed(KEY_ADDRESS, b"http://old.example/update");
    let queue = PeriodQueue::new();

    let mut frame = vec![1u8];
    frame.extend_from_slice(b"ftp://bad");
    assert_eq!(dispatch(&frame, &mut store, &queue), Disposition::Reject);

    assert_eq!(
        store.committed_str(KEY_ADDRESS),
        Some("http://old.example/update")
    );
    assert_eq!(store.commits, 0);
}

#[test]
fn credential_command_persists_both_fields() {
    let mut store = MockStore::new();
    let queue = PeriodQueue::new();
    let frame = Message::credentials("cellar", "swordfish").unwrap().encode();

    assert_eq!(
        dispatch(&frame, &mut store, &queue),
        Disposition::AckThenRestart
    );
    assert_eq!(store.committed_str(KEY_SSID), Some("cellar"));
    assert_eq!(store.committed_str(KEY_PASS), Some("swordfish"));
}

// ── Client ↔ dispatch loop ────────────────────────────────────

/// Transport that short-circuits the socket pair: every sent frame goes
/// straight through `dispatch` against a server-side store/queue, and the
/// reply is what the socket loop would have sent.
struct InProcessTransport {
    store: MockStore,
    queue: PeriodQueue,
    reply: Option<Vec<u8>>,
    /// Sends to swallow before the "server" starts answering.
    drop_first: usize,
}

impl InProcessTransport {
    fn new() -> Self {
        Self {
            store: MockStore::new(),
            queue: PeriodQueue::new(),
            reply: None,
            drop_first: 0,
        }
    }

    fn lossy(drop_first: usize) -> Self {
        Self {
            drop_first,
            ..Self::new()
        }
    }
}

impl DatagramPort for InProcessTransport {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.drop_first > 0 {
            self.drop_first -= 1;
            self.reply = None;
            return Ok(());
        }
        self.reply = match dispatch(frame, &mut self.store, &self.queue) {
            Disposition::Ack | Disposition::AckThenRestart => Some(frame.to_vec()),
            Disposition::Reject => Some(INVALID_REPLY.to_vec()),
            Disposition::Ignore => None,
        };
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.reply.take() {
            Some(reply) => {
                buf[..reply.len()].copy_from_slice(&reply);
                Ok(reply.len())
            }
            None => Err(TransportError::TimedOut),
        }
    }
}

#[test]
fn client_period_roundtrip_acks_and_enqueues() {
    let mut link = InProcessTransport::new();
    let msg = Message::Period {
        raw: Period::new(7, 0, 22, 0).unwrap().as_bytes(),
    };

    let outcome = send_command(&mut link, &msg, RetryPolicy::default());
    assert_eq!(outcome, SendOutcome::Acked);
    assert_eq!(link.queue.pop(), Some(Period::new(7, 0, 22, 0).unwrap()));
}

#[test]
fn client_out_of_range_period_is_rejected_terminally() {
    let mut link = InProcessTransport::new();
    // Bypasses the validated constructor deliberately: a buggy or hostile
    // client can always put raw bytes on the wire.
    let msg = Message::Period {
        raw: [24, 0, 22, 0],
    };

    let outcome = send_command(&mut link, &msg, RetryPolicy::default());
    assert_eq!(outcome, SendOutcome::Rejected);
    assert!(link.queue.is_empty());
}

#[test]
fn client_retries_through_loss_then_acks() {
    let mut link = InProcessTransport::lossy(2);
    let msg = Message::address("http://reports.example/u").unwrap();

    let outcome = send_command(&mut link, &msg, RetryPolicy { max_attempts: 4 });
    assert_eq!(outcome, SendOutcome::Acked);
    assert_eq!(
        link.store.committed_str(KEY_ADDRESS),
        Some("http://reports.example/u")
    );
}

#[test]
fn client_gives_up_after_budget_against_dead_link() {
    let mut link = InProcessTransport::lossy(usize::MAX);
    let msg = Message::address("http://reports.example/u").unwrap();

    let outcome = send_command(&mut link, &msg, RetryPolicy { max_attempts: 3 });
    assert_eq!(outcome, SendOutcome::TimedOut);
}
