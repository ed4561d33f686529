//! UDP command server.
//!
//! Terminates command datagrams, runs them through the codec, applies the
//! result and replies. Acknowledgment is an identity echo of the received
//! datagram; any malformed or out-of-range command is answered with the
//! 7-byte literal `"invalid"`.
//!
//! Recovery posture is deliberately conservative: after replying
//! `"invalid"`, and after any socket-level receive/send error, the
//! listening socket is torn down and re-created from scratch. A receive
//! timeout is not an error — the server just loops back to waiting.
//!
//! Dispatch is split from socket handling so the full command matrix is
//! testable without opening a socket.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use log::{error, info, warn};

use crate::config::{self, KEY_ADDRESS, KEY_PASS, KEY_SSID};
use crate::period::Period;
use crate::ports::{RestartPort, StoragePort};
use crate::protocol::{DecodeError, Message};
use crate::scheduler::PeriodQueue;

/// Negative-acknowledgment payload.
pub const INVALID_REPLY: &[u8] = b"invalid";

// ───────────────────────────────────────────────────────────────
// Pure dispatch
// ───────────────────────────────────────────────────────────────

/// What the socket loop must do with a received datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Echo the received bytes back.
    Ack,
    /// Reply `"invalid"`, then re-create the socket.
    Reject,
    /// No reply at all; keep the socket (unrecognised flag byte).
    Ignore,
    /// Echo, then schedule the settling restart — new credentials only
    /// take effect after a reboot.
    AckThenRestart,
}

/// Apply one decoded datagram to the system.
///
/// Period changes go through the scheduler queue (a different task owns
/// the live period); address and credential changes are written to the
/// store directly, since those keys belong to the server. A failed store
/// commit is logged but still acknowledged — the wire contract is the
/// identity echo, not a durability receipt.
pub fn dispatch(
    frame: &[u8],
    store: &mut impl StoragePort,
    queue: &PeriodQueue,
) -> Disposition {
    let message = match Message::decode(frame) {
        Ok(m) => m,
        Err(DecodeError::UnknownFlag(flag)) => {
            error!("server: unknown flag sent: {flag}");
            return Disposition::Ignore;
        }
        Err(e) => {
            error!("server: bad datagram ({} bytes): {e}", frame.len());
            return Disposition::Reject;
        }
    };

    match message {
        Message::Period { raw } => {
            let Ok(period) = Period::new(raw[0], raw[1], raw[2], raw[3]) else {
                error!(
                    "server: period out of range: {}:{} {}:{}",
                    raw[0], raw[1], raw[2], raw[3]
                );
                return Disposition::Reject;
            };
            if !queue.push(period) {
                // Dropped on a full queue; the client's retry will land it.
                warn!("server: period queue full, update dropped");
            }
            info!("server: period update queued: {period}");
            Disposition::Ack
        }

        Message::Address(url) => {
            persist(store, KEY_ADDRESS, url.as_bytes());
            info!("server: new report address set: {url}");
            Disposition::Ack
        }

        Message::Ssid { ssid, pass } => {
            persist(store, KEY_SSID, until_nul(&ssid));
            persist(store, KEY_PASS, until_nul(&pass));
            info!(
                "server: new credentials saved (ssid '{}')",
                String::from_utf8_lossy(until_nul(&ssid))
            );
            Disposition::AckThenRestart
        }
    }
}

/// Wire fields are NUL-padded; the store keeps the logical string.
fn until_nul(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

fn persist(store: &mut impl StoragePort, key: &str, value: &[u8]) {
    if let Err(e) = store.set(key, value) {
        warn!("server: store set '{key}' failed: {e}");
        return;
    }
    if let Err(e) = store.commit() {
        warn!("server: store commit '{key}' failed: {e}");
    }
}

// ───────────────────────────────────────────────────────────────
// Socket loop
// ───────────────────────────────────────────────────────────────

/// The long-lived server task.
pub struct CommandServer<S, R> {
    port: u16,
    store: S,
    restart: R,
}

impl<S: StoragePort, R: RestartPort> CommandServer<S, R> {
    pub fn new(port: u16, store: S, restart: R) -> Self {
        Self {
            port,
            store,
            restart,
        }
    }

    /// Bind, serve, and re-bind forever. Never returns.
    pub fn run(&mut self, queue: &PeriodQueue) -> ! {
        loop {
            let socket = match self.bind() {
                Ok(s) => s,
                Err(e) => {
                    error!("server: unable to create socket: {e}");
                    std::thread::sleep(Duration::from_secs(1));
                    continue;
                }
            };
            info!("server: socket bound, port {}", self.port);

            self.serve(&socket, queue);

            // Conservative recovery: any exit from serve() means the
            // socket state is suspect. Drop it and start fresh.
            error!("server: shutting down socket and restarting...");
        }
    }

    fn bind(&self) -> std::io::Result<UdpSocket> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port));
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(Duration::from_secs(config::RECV_TIMEOUT_SECS)))?;
        Ok(socket)
    }

    /// Receive/dispatch until the socket needs to be re-created.
    fn serve(&mut self, socket: &UdpSocket, queue: &PeriodQueue) {
        // Larger than any valid frame so oversized datagrams arrive intact
        // enough to be rejected by length rather than silently truncated.
        let mut buf = [0u8; 256];

        loop {
            let (len, peer) = match socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    // Receive timeout — not an error, keep waiting.
                    continue;
                }
                Err(e) => {
                    error!("server: recvfrom failed: {e}");
                    return;
                }
            };

            let frame = &buf[..len];
            info!("server: received {len} bytes from {peer}");

            match dispatch(frame, &mut self.store, queue) {
                Disposition::Ignore => {}

                Disposition::Ack => {
                    if let Err(e) = socket.send_to(frame, peer) {
                        error!("server: error occurred during sending: {e}");
                        return;
                    }
                }

                Disposition::Reject => {
                    if let Err(e) = socket.send_to(INVALID_REPLY, peer) {
                        error!("server: error occurred during sending: {e}");
                    }
                    return;
                }

                Disposition::AckThenRestart => {
                    if let Err(e) = socket.send_to(frame, peer) {
                        error!("server: error occurred during sending: {e}");
                    }
                    info!(
                        "server: credentials changed, restarting in {} seconds",
                        config::SSID_RESTART_DELAY_SECS
                    );
                    self.restart
                        .restart_after(Duration::from_secs(config::SSID_RESTART_DELAY_SECS));
                    // Keep serving until the restart lands; commands
                    // received in the settling window still apply.
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests (pure dispatch; socket behavior is covered in tests/)
// ───────────────────────────────────────────────────────────────
