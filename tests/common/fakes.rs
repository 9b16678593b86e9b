use async_trait::async_trait;
use bytes::Bytes;
use rentals::{
    error::{Error, Result},
    models::properties::{AddressQuery, Coordinates},
    services::{geocoding::Geocoder, storage::ObjectStorage},
};
use std::sync::Mutex;
use std::time::Duration;

/// Keeps stored objects in memory.
///
/// The first byte of each payload is a delay in milliseconds, so tests can
/// make uploads finish in a different order than they were submitted.
#[derive(Default)]
pub struct MemoryStorage {
    pub stored: Mutex<Vec<String>>,
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn store(&self, bytes: Bytes, _content_type: &str, key: &str) -> Result<String> {
        let delay = bytes.first().copied().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay as u64)).await;

        self.stored.lock().unwrap().push(key.to_string());
        Ok(format!("memory://{}", key))
    }
}

/// Fails every object whose key contains `fail`.
#[derive(Default)]
pub struct FailingStorage {
    pub stored: Mutex<Vec<String>>,
}

#[async_trait]
impl ObjectStorage for FailingStorage {
    async fn store(&self, _bytes: Bytes, _content_type: &str, key: &str) -> Result<String> {
        if key.contains("fail") {
            return Err(Error::Storage(format!("Upload rejected: {}", key)));
        }
        self.stored.lock().unwrap().push(key.to_string());
        Ok(format!("memory://{}", key))
    }
}

/// Answers every lookup with the same result.
pub struct StaticGeocoder(pub Option<Coordinates>);

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn resolve(&self, _address: &AddressQuery) -> Result<Option<Coordinates>> {
        Ok(self.0)
    }
}

pub struct UnavailableGeocoder;

#[async_trait]
impl Geocoder for UnavailableGeocoder {
    async fn resolve(&self, _address: &AddressQuery) -> Result<Option<Coordinates>> {
        Err(Error::Geocoding("service unavailable".to_string()))
    }
}
