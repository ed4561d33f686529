//! UDP command wire codec.
//!
//! Wire format: one flag byte selecting the command kind, followed by a
//! flag-specific payload. No length prefix — UDP datagram boundaries frame
//! the message.
//!
//! ```text
//! ┌──────┬──────────────────────────────────────────────┐
//! │ Flag │ Payload                                      │
//! ├──────┼──────────────────────────────────────────────┤
//! │ 0x00 │ start_hour start_min end_hour end_min (4 B)  │
//! │ 0x01 │ report URL, http(s):// prefixed (1–199 B)    │
//! │ 0x02 │ 32 B SSID ‖ 64 B passphrase, NUL-padded      │
//! └──────┴──────────────────────────────────────────────┘
//! ```
//!
//! The codec is pure — no I/O, no range semantics. PERIOD payload bytes are
//! extracted raw; the consumer ([`Period::new`](crate::period::Period::new))
//! owns the hour/minute range check. Encoding is the byte-exact inverse of
//! decoding: the server acknowledges a command by echoing the datagram it
//! received, so `encode` must reproduce the original wire form.

use crate::config::{ADDRESS_MAX, PASS_MAX, SSID_MAX};

/// Flag byte values (raw integers on the wire, not ASCII digits).
pub const FLAG_PERIOD: u8 = 0;
pub const FLAG_ADDRESS: u8 = 1;
pub const FLAG_SSID: u8 = 2;

/// Largest well-formed frame: flag + 199-byte URL.
pub const MAX_FRAME: usize = 1 + ADDRESS_MAX;

/// Exact length of a PERIOD frame.
const PERIOD_FRAME: usize = 1 + 4;

/// Exact length of an SSID frame.
const SSID_FRAME: usize = 1 + SSID_MAX + PASS_MAX;

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

/// Reasons a datagram failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// First byte is not a recognised command flag.
    UnknownFlag(u8),
    /// Frame length does not match the flag's payload contract.
    MalformedLength,
    /// ADDRESS payload is not a syntactically acceptable URL.
    InvalidAddress,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownFlag(b) => write!(f, "unknown flag {b}"),
            Self::MalformedLength => write!(f, "malformed frame length"),
            Self::InvalidAddress => write!(f, "invalid report address"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Message
// ───────────────────────────────────────────────────────────────

/// A decoded command datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// New relay window, raw wire bytes in field order
    /// (start_hour, start_minute, end_hour, end_minute).
    Period { raw: [u8; 4] },
    /// New telemetry report URL.
    Address(heapless::String<ADDRESS_MAX>),
    /// New network credentials. NUL padding is part of the wire form and
    /// is preserved here; consumers trim at the first NUL.
    Ssid {
        ssid: [u8; SSID_MAX],
        pass: [u8; PASS_MAX],
    },
}

impl Message {
    /// Decode one datagram.
    pub fn decode(frame: &[u8]) -> Result<Self, DecodeError> {
        let (&flag, payload) = frame.split_first().ok_or(DecodeError::MalformedLength)?;
        match flag {
            FLAG_PERIOD => {
                if frame.len() != PERIOD_FRAME {
                    return Err(DecodeError::MalformedLength);
                }
                let mut raw = [0u8; 4];
                raw.copy_from_slice(payload);
                Ok(Self::Period { raw })
            }
            FLAG_ADDRESS => {
                if payload.is_empty() || frame.len() > MAX_FRAME {
                    return Err(DecodeError::MalformedLength);
                }
                let url = core::str::from_utf8(payload).map_err(|_| DecodeError::InvalidAddress)?;
                if !is_valid_url(url) {
                    return Err(DecodeError::InvalidAddress);
                }
                let mut s = heapless::String::new();
                // Length already checked against the ADDRESS_MAX capacity.
                s.push_str(url).map_err(|()| DecodeError::MalformedLength)?;
                Ok(Self::Address(s))
            }
            FLAG_SSID => {
                if frame.len() != SSID_FRAME {
                    return Err(DecodeError::MalformedLength);
                }
                let mut ssid = [0u8; SSID_MAX];
                let mut pass = [0u8; PASS_MAX];
                ssid.copy_from_slice(&payload[..SSID_MAX]);
                pass.copy_from_slice(&payload[SSID_MAX..]);
                Ok(Self::Ssid { ssid, pass })
            }
            other => Err(DecodeError::UnknownFlag(other)),
        }
    }

    /// Encode to the exact wire form [`decode`](Self::decode) accepts.
    pub fn encode(&self) -> heapless::Vec<u8, MAX_FRAME> {
        let mut out = heapless::Vec::new();
        match self {
            Self::Period { raw } => {
                // Every variant fits MAX_FRAME by construction.
                out.push(FLAG_PERIOD).ok();
                out.extend_from_slice(raw).ok();
            }
            Self::Address(url) => {
                out.push(FLAG_ADDRESS).ok();
                out.extend_from_slice(url.as_bytes()).ok();
            }
            Self::Ssid { ssid, pass } => {
                out.push(FLAG_SSID).ok();
                out.extend_from_slice(ssid).ok();
                out.extend_from_slice(pass).ok();
            }
        }
        out
    }

    // ── Validated constructors (client side) ──────────────────

    /// Build an ADDRESS message, applying the same URL rules the server
    /// decoder enforces. Fails fast so an invalid URL never hits the wire.
    pub fn address(url: &str) -> Result<Self, DecodeError> {
        if url.is_empty() || url.len() > ADDRESS_MAX {
            return Err(DecodeError::MalformedLength);
        }
        if !is_valid_url(url) {
            return Err(DecodeError::InvalidAddress);
        }
        let mut s = heapless::String::new();
        s.push_str(url).map_err(|()| DecodeError::MalformedLength)?;
        Ok(Self::Address(s))
    }

    /// Build an SSID message, NUL-padding both fields to their wire width.
    pub fn credentials(ssid: &str, pass: &str) -> Result<Self, DecodeError> {
        if ssid.len() > SSID_MAX || pass.len() > PASS_MAX {
            return Err(DecodeError::MalformedLength);
        }
        let mut ssid_field = [0u8; SSID_MAX];
        let mut pass_field = [0u8; PASS_MAX];
        ssid_field[..ssid.len()].copy_from_slice(ssid.as_bytes());
        pass_field[..pass.len()].copy_from_slice(pass.as_bytes());
        Ok(Self::Ssid {
            ssid: ssid_field,
            pass: pass_field,
        })
    }
}

/// Syntactic URL test: case-insensitive `http://` or `https://` prefix and
/// more than 8 bytes in total. No further parsing — the device only hands
/// the string to the HTTP client.
pub fn is_valid_url(s: &str) -> bool {
    if s.len() <= 8 {
        return false;
    }
    let mut prefix = [0u8; 8];
    for (dst, src) in prefix.iter_mut().zip(s.bytes()) {
        *dst = src.to_ascii_lowercase();
    }
    prefix.starts_with(b"http://") || &prefix == b"https://"
}
