//! Telemetry report dispatch.
//!
//! Only the address-resolution half lives in the control core: the report
//! endpoint is the `address` store key (remotely settable over UDP), with
//! the compiled-in URL as the self-healing default. Body formatting and
//! the HTTP client itself stay behind the [`HttpPort`] capability.

use log::{info, warn};

use crate::config::{ADDRESS_MAX, DEFAULT_REPORT_URL, KEY_ADDRESS};
use crate::ports::{HttpError, HttpPort, StoragePort};
use crate::store;

/// Resolve the report URL and post `body` to it.
pub fn report(
    storage: &mut impl StoragePort,
    http: &mut impl HttpPort,
    body: &[u8],
) -> Result<(), HttpError> {
    let url: heapless::String<ADDRESS_MAX> =
        store::read_string_or_heal(storage, KEY_ADDRESS, DEFAULT_REPORT_URL);
    info!("telemetry: posting {} bytes to {url}", body.len());
    http.post(&url, body).inspect_err(|e| {
        warn!("telemetry: report failed: {e}");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StoreError;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapStore {
        map: HashMap<String, Vec<u8>>,
    }

    impl StoragePort for MapStore {
        fn get(&self, key: &str, buf: &mut [u8]) -> Result<usize, StoreError> {
            let data = self.map.get(key).ok_or(StoreError::NotFound)?;
            let len = data.len().min(buf.len());
            buf[..len].copy_from_slice(&data[..len]);
            Ok(len)
        }
        fn set(&mut self, key: &str, data: &[u8]) -> Result<(), StoreError> {
            self.map.insert(key.to_string(), data.to_vec());
            Ok(())
        }
        fn commit(&mut self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingHttp {
        posts: Vec<(String, Vec<u8>)>,
    }

    impl HttpPort for RecordingHttp {
        fn post(&mut self, url: &str, body: &[u8]) -> Result<(), HttpError> {
            self.posts.push((url.to_string(), body.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn uses_stored_address_when_present() {
        let mut store = MapStore::default();
        store
            .map
            .insert(KEY_ADDRESS.into(), b"http://custom/endpoint".to_vec());
        let mut http = RecordingHttp::default();

        report(&mut store, &mut http, b"temp=21.5").unwrap();
        assert_eq!(http.posts[0].0, "http://custom/endpoint");
        assert_eq!(http.posts[0].1, b"temp=21.5");
    }

    #[test]
    fn missing_address_heals_to_default() {
        let mut store = MapStore::default();
        let mut http = RecordingHttp::default();

        report(&mut store, &mut http, b"x").unwrap();
        assert_eq!(http.posts[0].0, DEFAULT_REPORT_URL);
        // The default was written back: the store converges on first use.
        assert_eq!(
            store.map.get(KEY_ADDRESS).map(Vec::as_slice),
            Some(DEFAULT_REPORT_URL.as_bytes())
        );
    }
}
