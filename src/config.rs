//! Compiled-in defaults and wire limits.
//!
//! Every value here can be superseded at runtime through the UDP command
//! protocol (and persists in NVS); these are only what the device falls
//! back to on a blank store.

/// UDP port the command server listens on.
pub const COMMAND_PORT: u16 = 3333;

/// Receive timeout for the command socket. A timeout is not an error —
/// the server simply loops back to waiting.
pub const RECV_TIMEOUT_SECS: u64 = 10;

/// Settling delay between acknowledging a credential change and the
/// unconditional device restart that makes it take effect.
pub const SSID_RESTART_DELAY_SECS: u64 = 10;

/// Delay before the restart that follows an exhausted connectivity budget.
pub const LINK_FAILURE_RESTART_DELAY_SECS: u64 = 30;

/// Consecutive connect attempts against the primary network before the
/// manager falls back to [`FALLBACK_SSID`].
pub const MAX_PRIMARY_RETRIES: u8 = 5;

// ── Wire/field limits ─────────────────────────────────────────

/// Maximum SSID length in bytes (802.11 limit, also the wire field width).
pub const SSID_MAX: usize = 32;

/// Maximum WPA2 passphrase length in bytes (wire field width).
pub const PASS_MAX: usize = 64;

/// Maximum report-URL length in bytes (payload of an ADDRESS datagram).
pub const ADDRESS_MAX: usize = 199;

// ── Store keys ────────────────────────────────────────────────

pub const KEY_SSID: &str = "ssid";
pub const KEY_PASS: &str = "pass";
pub const KEY_ADDRESS: &str = "address";
pub const KEY_PERIOD: &str = "period";

// ── Compiled-in network identities ────────────────────────────
//
// The primary credentials can be baked in at build time; the fallback set
// is the rescue identity used only after the primary repeatedly fails.

/// Default primary SSID, overridable with `WIFI_SSID=... cargo build`.
pub const DEFAULT_SSID: &str = match option_env!("WIFI_SSID") {
    Some(s) => s,
    None => "homenet",
};

/// Default primary passphrase, overridable with `WIFI_PASS=...`.
pub const DEFAULT_PASS: &str = match option_env!("WIFI_PASS") {
    Some(s) => s,
    None => "changeme-psk",
};

/// Rescue network tried once after the primary exhausts its retries.
pub const FALLBACK_SSID: &str = "autoswitch-rescue";
pub const FALLBACK_PASS: &str = "autoswitch-rescue";

/// Default endpoint for telemetry reports until an ADDRESS command
/// overrides it.
pub const DEFAULT_REPORT_URL: &str = "http://palantir/thermo/update-sensor.php";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_match_wire_format() {
        // flag + ssid + pass is the fixed SSID frame length
        assert_eq!(1 + SSID_MAX + PASS_MAX, 97);
        // flag + url must fit the 200-byte datagram ceiling
        assert_eq!(1 + ADDRESS_MAX, 200);
    }

    #[test]
    fn defaults_fit_their_fields() {
        assert!(DEFAULT_SSID.len() <= SSID_MAX);
        assert!(DEFAULT_PASS.len() <= PASS_MAX);
        assert!(FALLBACK_SSID.len() <= SSID_MAX);
        assert!(FALLBACK_PASS.len() <= PASS_MAX);
        assert!(DEFAULT_REPORT_URL.len() <= ADDRESS_MAX);
    }
}
