use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{applications::ApplicationStatus, properties::AddressQuery};
use crate::{
    error::Result,
    validation::{parse_id, parse_status},
};

/// A file received with a property listing, before it is stored.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Property listing as submitted by a manager.
///
/// Numeric and flag fields arrive as raw form text and are coerced when the
/// property row is built: absent or malformed numbers become zero, and flags
/// are true only for `true`/`1`. `amenities` and `highlights` accept either a
/// JSON array or a comma-separated list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    pub manager_cognito_id: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub name: String,
    pub description: String,
    pub price_per_month: Option<String>,
    pub security_deposit: Option<String>,
    pub application_fee: Option<String>,
    pub amenities: Option<String>,
    pub highlights: Option<String>,
    pub is_pets_allowed: Option<String>,
    pub is_parking_included: Option<String>,
    pub beds: Option<String>,
    pub baths: Option<String>,
    pub square_feet: Option<String>,
    pub property_type: String,
    #[serde(skip)]
    pub files: Vec<UploadedFile>,
}

impl CreatePropertyRequest {
    pub fn address_query(&self) -> AddressQuery {
        AddressQuery {
            street: self.address.clone(),
            city: self.city.clone(),
            country: self.country.clone(),
            postal_code: self.postal_code.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    /// Defaults to the time of submission.
    pub application_date: Option<DateTime<Utc>>,
    pub property_id: i64,
    pub tenant_cognito_id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateApplicationStatusRequest {
    pub status: String,
}

impl UpdateApplicationStatusRequest {
    pub fn parsed_status(&self) -> Result<ApplicationStatus> {
        parse_status(&self.status)
    }
}

/// Filter of the property listing. `property_ids` is a comma-separated id
/// list, as sent by the favorites view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPropertiesQuery {
    pub property_ids: Option<String>,
}

impl ListPropertiesQuery {
    /// The requested ids, or `None` to list every property.
    pub fn parsed_ids(&self) -> Result<Option<Vec<i64>>> {
        self.property_ids
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| raw.split(',').map(|id| parse_id(id, "property id")).collect())
            .transpose()
    }
}
