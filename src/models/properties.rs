use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::managers::Manager;
use crate::codec::Money;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Stored when an address cannot be resolved.
    pub const UNRESOLVED: Coordinates = Coordinates {
        latitude: 0.0,
        longitude: 0.0,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: i64,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub coordinates: Coordinates,
}

/// Structured address handed to the geocoding capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressQuery {
    pub street: String,
    pub city: String,
    pub country: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price_per_month: Money,
    pub security_deposit: Money,
    pub application_fee: Money,
    pub photo_urls: Vec<String>,
    pub amenities: Vec<String>,
    pub highlights: Vec<String>,
    pub is_pets_allowed: bool,
    pub is_parking_included: bool,
    pub beds: i64,
    pub baths: f64,
    pub square_feet: i64,
    pub property_type: String,
    pub posted_date: DateTime<Utc>,
    pub average_rating: f64,
    pub number_of_reviews: i64,
    pub location_id: i64,
    pub manager_cognito_id: String,
    pub location: Location,
    pub manager: Manager,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub name: String,
    pub description: String,
    pub price_per_month: Money,
    pub security_deposit: Money,
    pub application_fee: Money,
    pub photo_urls: Vec<String>,
    pub amenities: Vec<String>,
    pub highlights: Vec<String>,
    pub is_pets_allowed: bool,
    pub is_parking_included: bool,
    pub beds: i64,
    pub baths: f64,
    pub square_feet: i64,
    pub property_type: String,
    pub posted_date: DateTime<Utc>,
    pub location_id: i64,
    pub manager_cognito_id: String,
}

/// Rent and deposit of a property read at one point in time.
///
/// Leases copy these values; later price changes do not reach existing leases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSnapshot {
    pub property_id: i64,
    pub price_per_month: Money,
    pub security_deposit: Money,
}

impl Property {
    pub fn pricing(&self) -> PricingSnapshot {
        PricingSnapshot {
            property_id: self.id,
            price_per_month: self.price_per_month,
            security_deposit: self.security_deposit,
        }
    }
}
