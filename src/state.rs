use crate::{
    config::Config,
    database::PoolHandle,
    error::Result,
    services::{
        geocoding::{Geocoder, NominatimGeocoder},
        storage::{FilesystemObjectStorage, ObjectStorage},
    },
};
use std::sync::Arc;

/// Resources shared by every unit of work.
///
/// The pool handle is the only shared mutable resource; the capabilities are
/// stateless clients.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool for accessing the database
    pub pool: PoolHandle,
    /// Object storage for listing photos
    pub storage: Arc<dyn ObjectStorage>,
    /// Address resolution for new locations
    pub geocoder: Arc<dyn Geocoder>,
}

impl AppState {
    pub fn new(pool: PoolHandle, storage: Arc<dyn ObjectStorage>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            pool,
            storage,
            geocoder,
        }
    }

    /// Builds the state with the filesystem storage and Nominatim geocoder.
    ///
    /// No connection is opened here; the pool initializes on first use.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = PoolHandle::new(config.database.clone())?;

        let storage = FilesystemObjectStorage::new(&config.storage);
        storage.init().await?;

        let geocoder = NominatimGeocoder::new(&config.geocoding)?;

        Ok(Self::new(pool, Arc::new(storage), Arc::new(geocoder)))
    }
}
