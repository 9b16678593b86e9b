use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::config::GeocodingConfig;
use crate::error::{Error, Result};
use crate::models::properties::{AddressQuery, Coordinates};

/// Resolves a postal address to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Returns `None` when the address has no match.
    async fn resolve(&self, address: &AddressQuery) -> Result<Option<Coordinates>>;
}

/// Geocoder backed by a Nominatim-compatible search endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    search_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            search_url: format!("{}/search", config.base_url.trim_end_matches('/')),
        })
    }

    fn search_url(&self, address: &AddressQuery) -> Result<Url> {
        Url::parse_with_params(
            &self.search_url,
            &[
                ("street", address.street.as_str()),
                ("city", address.city.as_str()),
                ("country", address.country.as_str()),
                ("postalcode", address.postal_code.as_str()),
                ("format", "json"),
                ("limit", "1"),
            ],
        )
        .map_err(|e| Error::Geocoding(format!("Invalid geocoding URL: {}", e)))
    }
}

/// Takes the first hit whose coordinates parse as finite numbers.
fn first_coordinates(hits: &[SearchHit]) -> Option<Coordinates> {
    let hit = hits.first()?;
    let latitude = hit.lat.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    let longitude = hit.lon.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(Coordinates {
        latitude,
        longitude,
    })
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, address: &AddressQuery) -> Result<Option<Coordinates>> {
        let url = self.search_url(address)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Geocoding(format!("Geocoding request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Geocoding(format!(
                "Geocoding service returned status {}",
                response.status()
            )));
        }

        let hits: Vec<SearchHit> = response
            .json()
            .await
            .map_err(|e| Error::Geocoding(format!("Invalid geocoding response: {}", e)))?;

        Ok(first_coordinates(&hits))
    }
}

/// Resolves an address, degrading to [`Coordinates::UNRESOLVED`] on a miss or failure.
pub async fn resolve_or_unresolved(geocoder: &dyn Geocoder, address: &AddressQuery) -> Coordinates {
    match geocoder.resolve(address).await {
        Ok(Some(coordinates)) => coordinates,
        Ok(None) => {
            tracing::info!(city = %address.city, "Address not found by geocoder, storing unresolved coordinates");
            Coordinates::UNRESOLVED
        }
        Err(e) => {
            tracing::warn!(error = %e, city = %address.city, "Geocoding failed, storing unresolved coordinates");
            Coordinates::UNRESOLVED
        }
    }
}
