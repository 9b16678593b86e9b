use crate::{
    error::{Error, Result},
    models::properties::{Coordinates, Location, NewLocation},
};

use crate::DbConn;

#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    id: i64,
    address: String,
    city: String,
    state: String,
    country: String,
    postal_code: String,
    latitude: f64,
    longitude: f64,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: row.id,
            address: row.address,
            city: row.city,
            state: row.state,
            country: row.country,
            postal_code: row.postal_code,
            coordinates: Coordinates {
                latitude: row.latitude,
                longitude: row.longitude,
            },
        }
    }
}

/// Creates a new location in the database and returns its id.
pub async fn create_location(conn: &mut DbConn, new_location: NewLocation) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO location (address, city, state, country, postal_code, latitude, longitude)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(new_location.address)
    .bind(new_location.city)
    .bind(new_location.state)
    .bind(new_location.country)
    .bind(new_location.postal_code)
    .bind(new_location.coordinates.latitude)
    .bind(new_location.coordinates.longitude)
    .fetch_one(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(id)
}

/// Gets a single location by its ID. The location may not exist.
pub async fn get_location_optional(conn: &mut DbConn, id: i64) -> Result<Option<Location>> {
    let row = sqlx::query_as::<_, LocationRow>(
        r#"
        SELECT id, address, city, state, country, postal_code, latitude, longitude
        FROM location
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(row.map(Location::from))
}
