use chrono::Utc;
use futures::future::try_join_all;

use crate::{
    codec::{BooleanFlag, JsonStringArray, Money, coerce_f64, coerce_i64},
    database::PoolHandle,
    error::{Error, Result},
    models::{
        properties::{NewLocation, NewProperty, Property},
        requests::{CreatePropertyRequest, ListPropertiesQuery, UploadedFile},
    },
    queries::{locations, managers, properties},
    services::{
        geocoding::{Geocoder, resolve_or_unresolved},
        storage::{ObjectStorage, property_photo_key},
    },
    validation::validate_required,
};

/// Uploads every file, returning their URLs in submission order.
///
/// Uploads run concurrently; the first failure fails the whole batch.
pub async fn upload_photos(storage: &dyn ObjectStorage, files: Vec<UploadedFile>) -> Result<Vec<String>> {
    let uploads = files.into_iter().map(|file| async move {
        let key = property_photo_key(&file.original_name);
        storage.store(file.bytes, &file.content_type, &key).await
    });

    try_join_all(uploads).await
}

fn build_new_property(
    request: &CreatePropertyRequest,
    photo_urls: Vec<String>,
) -> Result<NewProperty> {
    Ok(NewProperty {
        name: validate_required(&request.name, "Property name")?,
        description: request.description.trim().to_string(),
        price_per_month: Money::coerce(request.price_per_month.as_deref()),
        security_deposit: Money::coerce(request.security_deposit.as_deref()),
        application_fee: Money::coerce(request.application_fee.as_deref()),
        photo_urls,
        amenities: JsonStringArray::normalize(request.amenities.as_deref()),
        highlights: JsonStringArray::normalize(request.highlights.as_deref()),
        is_pets_allowed: BooleanFlag::parse(request.is_pets_allowed.as_deref()),
        is_parking_included: BooleanFlag::parse(request.is_parking_included.as_deref()),
        beds: coerce_i64(request.beds.as_deref(), 0),
        baths: coerce_f64(request.baths.as_deref(), 0.0),
        square_feet: coerce_i64(request.square_feet.as_deref(), 0),
        property_type: request.property_type.trim().to_string(),
        posted_date: Utc::now(),
        // Assigned once the location row exists
        location_id: 0,
        manager_cognito_id: request.manager_cognito_id.clone(),
    })
}

/// Creates a property listing with its location and uploaded photos.
///
/// Photos are stored first, then the address is geocoded (falling back to
/// unresolved coordinates), then location and property are written in one
/// transaction. A failed upload aborts before anything is written; a failed
/// property insert leaves no location behind.
pub async fn create_property(
    pool: &PoolHandle,
    storage: &dyn ObjectStorage,
    geocoder: &dyn Geocoder,
    mut request: CreatePropertyRequest,
) -> Result<Property> {
    let manager_cognito_id = validate_required(&request.manager_cognito_id, "Manager id")?;
    request.manager_cognito_id = manager_cognito_id.clone();
    // Fail on bad input before anything is uploaded
    build_new_property(&request, Vec::new())?;

    let manager_exists = {
        let manager_cognito_id = manager_cognito_id.clone();
        pool.with_connection(move |conn| {
            Box::pin(async move {
                Ok(managers::get_manager_optional(conn, &manager_cognito_id).await?.is_some())
            })
        })
        .await?
    };
    if !manager_exists {
        return Err(Error::NotFound(format!("Manager {} not found", manager_cognito_id)));
    }

    let files = std::mem::take(&mut request.files);
    let file_count = files.len();
    let photo_urls = upload_photos(storage, files).await?;

    let coordinates = resolve_or_unresolved(geocoder, &request.address_query()).await;

    let new_location = NewLocation {
        address: request.address.trim().to_string(),
        city: request.city.trim().to_string(),
        state: request.state.trim().to_string(),
        country: request.country.trim().to_string(),
        postal_code: request.postal_code.trim().to_string(),
        coordinates,
    };
    let new_property = build_new_property(&request, photo_urls)?;

    let property = pool
        .with_transaction(move |conn| {
            Box::pin(async move {
                let location_id = locations::create_location(conn, new_location).await?;
                let property_id = properties::create_property(
                    conn,
                    NewProperty {
                        location_id,
                        ..new_property
                    },
                )
                .await?;
                properties::get_property(conn, property_id).await
            })
        })
        .await?;

    tracing::info!(
        property_id = property.id,
        manager = %property.manager_cognito_id,
        photos = file_count,
        latitude = property.location.coordinates.latitude,
        longitude = property.location.coordinates.longitude,
        "Property created"
    );

    Ok(property)
}

/// Gets a property with its location and manager.
pub async fn get_property(pool: &PoolHandle, id: i64) -> Result<Property> {
    pool.with_connection(move |conn| Box::pin(async move { properties::get_property(conn, id).await }))
        .await
}

/// Lists all properties, or only those with the ids named in `query`.
///
/// A malformed id fails with `Validation` before the database is touched.
pub async fn list_properties(pool: &PoolHandle, query: &ListPropertiesQuery) -> Result<Vec<Property>> {
    let ids = query.parsed_ids()?;
    pool.with_connection(move |conn| {
        Box::pin(async move {
            match ids {
                Some(ids) => properties::list_properties_by_ids(conn, &ids).await,
                None => properties::list_properties(conn).await,
            }
        })
    })
    .await
}

/// Lists the properties of a manager. Fails with `NotFound` for an unknown manager.
pub async fn list_manager_properties(pool: &PoolHandle, manager_cognito_id: &str) -> Result<Vec<Property>> {
    let manager_cognito_id = manager_cognito_id.to_string();
    pool.with_connection(move |conn| {
        Box::pin(async move {
            if managers::get_manager_optional(conn, &manager_cognito_id).await?.is_none() {
                return Err(Error::NotFound(format!("Manager {} not found", manager_cognito_id)));
            }
            properties::list_properties_by_manager(conn, &manager_cognito_id).await
        })
    })
    .await
}
