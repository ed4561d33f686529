//! Reliable command sender.
//!
//! Builds a wire frame from validated user intent, sends it as a single
//! datagram and waits for the reply:
//!
//! - reply byte-equal to the sent frame → acknowledged, done;
//! - reply containing `"invalid"` → the server rejected the command,
//!   terminal — retrying an invalid command cannot succeed;
//! - anything else, or any transport error → re-send the identical frame.
//!
//! Retries are bounded by an explicit [`RetryPolicy`] and surface as a
//! typed [`SendOutcome`] instead of looping forever against an
//! unreachable host. Commands are idempotent on the server side, so
//! at-least-once delivery with re-application is safe.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use log::{info, warn};

use crate::error::TransportError;
use crate::protocol::Message;

// ───────────────────────────────────────────────────────────────
// Datagram capability
// ───────────────────────────────────────────────────────────────

/// One connected datagram flow. Implemented by [`UdpTransport`] for real
/// use and by scripted mocks in tests.
pub trait DatagramPort {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError>;
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;
}

/// UDP implementation with a per-attempt receive timeout.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    pub fn connect(target: impl ToSocketAddrs, recv_timeout: Duration) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))?;
        socket.connect(target)?;
        socket.set_read_timeout(Some(recv_timeout))?;
        Ok(Self { socket })
    }
}

impl DatagramPort for UdpTransport {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        match self.socket.send(frame) {
            Ok(n) if n == frame.len() => Ok(()),
            Ok(_) => Err(TransportError::SendFailed),
            Err(_) => Err(TransportError::SendFailed),
        }
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.socket.recv(buf) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Err(TransportError::TimedOut)
            }
            Err(_) => Err(TransportError::RecvFailed),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Retry policy and outcome
// ───────────────────────────────────────────────────────────────

/// Bound on the re-send loop. No backoff: commands are tiny and the
/// server answers immediately or not at all.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 8 }
    }
}

/// Terminal result of a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The server echoed the frame byte-for-byte.
    Acked,
    /// The server answered `"invalid"` — the command is wrong, not lost.
    Rejected,
    /// The retry budget ran out without an acknowledgment.
    TimedOut,
}

// ───────────────────────────────────────────────────────────────
// Send loop
// ───────────────────────────────────────────────────────────────

/// Send `message` until it is acknowledged, rejected, or the policy's
/// attempt budget is exhausted. The message has already passed its
/// validated constructor, so nothing invalid can reach the wire from
/// here.
pub fn send_command(
    transport: &mut impl DatagramPort,
    message: &Message,
    policy: RetryPolicy,
) -> SendOutcome {
    let frame = message.encode();
    let mut buf = [0u8; 256];

    for attempt in 1..=policy.max_attempts {
        info!("client: attempt {attempt}/{}", policy.max_attempts);

        if let Err(e) = transport.send(&frame) {
            warn!("client: send failed: {e}");
            continue;
        }

        let len = match transport.recv(&mut buf) {
            Ok(len) => len,
            Err(e) => {
                warn!("client: no reply: {e}");
                continue;
            }
        };

        let reply = &buf[..len];
        if reply == frame.as_slice() {
            return SendOutcome::Acked;
        }
        if contains_invalid(reply) {
            return SendOutcome::Rejected;
        }
        warn!("client: unexpected reply ({len} bytes), retrying");
    }

    SendOutcome::TimedOut
}

fn contains_invalid(reply: &[u8]) -> bool {
    reply
        .windows(crate::server::INVALID_REPLY.len())
        .any(|w| w == crate::server::INVALID_REPLY)
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Scripted transport: each entry is the reply to one successful send.
    struct ScriptedTransport {
        replies: Vec<Result<Vec<u8>, TransportError>>,
        sent: Vec<Vec<u8>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<Vec<u8>, TransportError>>) -> Self {
            Self {
                replies,
                sent: Vec::new(),
            }
        }
    }

    impl DatagramPort for ScriptedTransport {
        fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
            self.sent.push(frame.to_vec());
            Ok(())
        }
        fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
            match self.replies.remove(0) {
                Ok(reply) => {
                    buf[..reply.len()].copy_from_slice(&reply);
                    Ok(reply.len())
                }
                Err(e) => Err(e),
            }
        }
    }

    fn period_msg() -> Message {
        Message::Period { raw: [7, 0, 22, 0] }
    }

    #[test]
    fn echo_acks_on_first_try() {
        let frame = period_msg().encode().to_vec();
        let mut t = ScriptedTransport::new(vec![Ok(frame)]);
        let outcome = send_command(&mut t, &period_msg(), RetryPolicy::default());
        assert_eq!(outcome, SendOutcome::Acked);
        assert_eq!(t.sent.len(), 1);
    }

    #[test]
    fn invalid_reply_is_terminal() {
        let mut t = ScriptedTransport::new(vec![Ok(b"invalid".to_vec())]);
        let outcome = send_command(&mut t, &period_msg(), RetryPolicy::default());
        assert_eq!(outcome, SendOutcome::Rejected);
        assert_eq!(t.sent.len(), 1, "a rejection must stop the retry loop");
    }

    #[test]
    fn timeouts_retry_identical_frame_until_budget() {
        let mut t = ScriptedTransport::new(vec![
            Err(TransportError::TimedOut),
            Err(TransportError::TimedOut),
            Err(TransportError::TimedOut),
        ]);
        let outcome = send_command(&mut t, &period_msg(), RetryPolicy { max_attempts: 3 });
        assert_eq!(outcome, SendOutcome::TimedOut);
        assert_eq!(t.sent.len(), 3);
        assert!(t.sent.windows(2).all(|w| w[0] == w[1]), "re-sends are identical");
    }

    #[test]
    fn garbled_reply_retries_then_acks() {
        let frame = period_msg().encode().to_vec();
        let mut t = ScriptedTransport::new(vec![Ok(b"???".to_vec()), Ok(frame)]);
        let outcome = send_command(&mut t, &period_msg(), RetryPolicy::default());
        assert_eq!(outcome, SendOutcome::Acked);
        assert_eq!(t.sent.len(), 2);
    }

    #[test]
    fn recv_error_counts_against_budget() {
        let frame = period_msg().encode().to_vec();
        let mut t = ScriptedTransport::new(vec![Err(TransportError::RecvFailed), Ok(frame)]);
        let outcome = send_command(&mut t, &period_msg(), RetryPolicy { max_attempts: 2 });
        assert_eq!(outcome, SendOutcome::Acked);
    }
}
