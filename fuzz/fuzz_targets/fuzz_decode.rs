//! Fuzz target: `Message::decode`
//!
//! Drives arbitrary datagrams through the command codec and asserts that
//! it never panics and that every accepted frame re-encodes to the exact
//! input bytes (the echo-acknowledgment invariant).
//!
//! cargo fuzz run fuzz_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use autoswitch::protocol::Message;

fuzz_target!(|data: &[u8]| {
    if let Ok(msg) = Message::decode(data) {
        // Accepted frames must round-trip byte-exactly — the server's
        // acknowledgment is an identity echo of the request.
        assert_eq!(msg.encode().as_slice(), data);
    }
});
