//! Unified error types for the autoswitch firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level task loops' error handling uniform. All variants are `Copy` so
//! they can be passed through task boundaries without allocation.

use core::fmt;

use crate::ports::StoreError;
use crate::protocol::DecodeError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A datagram failed to decode or validate.
    Decode(DecodeError),
    /// Persistent storage failed.
    Store(StoreError),
    /// Socket-level send/receive failed.
    Transport(TransportError),
    /// Network bring-up exhausted its retry budget.
    Link(LinkError),
    /// Peripheral or subsystem initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Socket-level failures.
///
/// On the server these trigger the socket-restart posture; on the client
/// they count against the bounded retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Datagram could not be sent.
    SendFailed,
    /// Receive returned an error other than a timeout.
    RecvFailed,
    /// Receive timed out.
    TimedOut,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendFailed => write!(f, "send failed"),
            Self::RecvFailed => write!(f, "receive failed"),
            Self::TimedOut => write!(f, "receive timed out"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

/// Connectivity failures. The only unconditionally fatal path in the
/// firmware, and always preceded by an exhausted, bounded retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Primary retries and the single fallback attempt are both spent.
    FallbackExhausted,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FallbackExhausted => write!(f, "fallback network exhausted"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
