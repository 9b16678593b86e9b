use crate::{
    codec::{BooleanFlag, ColumnCodec, DecimalMoney, JsonStringArray, TimestampText},
    error::{Error, Result},
    models::{
        managers::Manager,
        properties::{Coordinates, Location, NewProperty, PricingSnapshot, Property},
    },
};

use crate::DbConn;

/// Columns selected for a property joined with its location and manager.
///
/// Aliases are unique across the three tables so the row can be flattened
/// into larger joins (see `queries::applications`).
pub(crate) const PROPERTY_COLUMNS: &str = r#"
    p.id AS property_id,
    p.name AS property_name,
    p.description AS property_description,
    p.price_per_month AS price_per_month,
    p.security_deposit AS security_deposit,
    p.application_fee AS application_fee,
    p.photo_urls AS photo_urls,
    p.amenities AS amenities,
    p.highlights AS highlights,
    p.is_pets_allowed AS is_pets_allowed,
    p.is_parking_included AS is_parking_included,
    p.beds AS beds,
    p.baths AS baths,
    p.square_feet AS square_feet,
    p.property_type AS property_type,
    p.posted_date AS posted_date,
    p.average_rating AS average_rating,
    p.number_of_reviews AS number_of_reviews,
    l.id AS location_id,
    l.address AS address,
    l.city AS city,
    l.state AS state,
    l.country AS country,
    l.postal_code AS postal_code,
    l.latitude AS latitude,
    l.longitude AS longitude,
    m.id AS manager_id,
    m.cognito_id AS manager_cognito_id,
    m.name AS manager_name,
    m.email AS manager_email,
    m.phone_number AS manager_phone_number
"#;

/// Joins from a `property p` alias to its location and manager.
pub(crate) const PROPERTY_JOINS: &str = r#"
    JOIN location l ON p.location_id = l.id
    JOIN manager m ON p.manager_cognito_id = m.cognito_id
"#;

/// Raw row shape of [`PROPERTY_COLUMNS`]. Converted through the column codecs only.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PropertyRow {
    property_id: i64,
    property_name: String,
    property_description: String,
    price_per_month: i64,
    security_deposit: i64,
    application_fee: i64,
    photo_urls: Option<String>,
    amenities: Option<String>,
    highlights: Option<String>,
    is_pets_allowed: i64,
    is_parking_included: i64,
    beds: i64,
    baths: f64,
    square_feet: i64,
    property_type: String,
    posted_date: String,
    average_rating: Option<f64>,
    number_of_reviews: Option<i64>,
    location_id: i64,
    address: String,
    city: String,
    state: String,
    country: String,
    postal_code: String,
    latitude: f64,
    longitude: f64,
    manager_id: i64,
    manager_cognito_id: String,
    manager_name: String,
    manager_email: String,
    manager_phone_number: String,
}

impl PropertyRow {
    pub(crate) fn into_property(self) -> Result<Property> {
        let manager = Manager {
            id: self.manager_id,
            cognito_id: self.manager_cognito_id.clone(),
            name: self.manager_name,
            email: self.manager_email,
            phone_number: self.manager_phone_number,
        };

        let location = Location {
            id: self.location_id,
            address: self.address,
            city: self.city,
            state: self.state,
            country: self.country,
            postal_code: self.postal_code,
            coordinates: Coordinates {
                latitude: self.latitude,
                longitude: self.longitude,
            },
        };

        Ok(Property {
            id: self.property_id,
            name: self.property_name,
            description: self.property_description,
            price_per_month: DecimalMoney::decode(self.price_per_month)?,
            security_deposit: DecimalMoney::decode(self.security_deposit)?,
            application_fee: DecimalMoney::decode(self.application_fee)?,
            photo_urls: JsonStringArray::decode(self.photo_urls.unwrap_or_default())?,
            amenities: JsonStringArray::decode(self.amenities.unwrap_or_default())?,
            highlights: JsonStringArray::decode(self.highlights.unwrap_or_default())?,
            is_pets_allowed: BooleanFlag::decode(self.is_pets_allowed)?,
            is_parking_included: BooleanFlag::decode(self.is_parking_included)?,
            beds: self.beds,
            baths: self.baths,
            square_feet: self.square_feet,
            property_type: self.property_type,
            posted_date: TimestampText::decode(self.posted_date)?,
            average_rating: self.average_rating.unwrap_or(0.0),
            number_of_reviews: self.number_of_reviews.unwrap_or(0),
            location_id: self.location_id,
            manager_cognito_id: self.manager_cognito_id,
            location,
            manager,
        })
    }
}

pub(crate) fn rows_into_properties(rows: Vec<PropertyRow>) -> Result<Vec<Property>> {
    rows.into_iter().map(PropertyRow::into_property).collect()
}

/// Creates a new property in the database and returns its id.
pub async fn create_property(conn: &mut DbConn, new_property: NewProperty) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO property (
            name, description, price_per_month, security_deposit, application_fee,
            photo_urls, amenities, highlights, is_pets_allowed, is_parking_included,
            beds, baths, square_feet, property_type, posted_date,
            average_rating, number_of_reviews, location_id, manager_cognito_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        RETURNING id
        "#,
    )
    .bind(new_property.name)
    .bind(new_property.description)
    .bind(DecimalMoney::encode(&new_property.price_per_month))
    .bind(DecimalMoney::encode(&new_property.security_deposit))
    .bind(DecimalMoney::encode(&new_property.application_fee))
    .bind(JsonStringArray::encode(&new_property.photo_urls))
    .bind(JsonStringArray::encode(&new_property.amenities))
    .bind(JsonStringArray::encode(&new_property.highlights))
    .bind(BooleanFlag::encode(&new_property.is_pets_allowed))
    .bind(BooleanFlag::encode(&new_property.is_parking_included))
    .bind(new_property.beds)
    .bind(new_property.baths)
    .bind(new_property.square_feet)
    .bind(new_property.property_type)
    .bind(TimestampText::encode(&new_property.posted_date))
    .bind(0.0_f64)
    .bind(0_i64)
    .bind(new_property.location_id)
    .bind(new_property.manager_cognito_id)
    .fetch_one(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(id)
}

/// Gets a single property with its location and manager. The property may not exist.
pub async fn get_property_optional(conn: &mut DbConn, id: i64) -> Result<Option<Property>> {
    let sql = format!("SELECT {PROPERTY_COLUMNS} FROM property p {PROPERTY_JOINS} WHERE p.id = $1");

    let row = sqlx::query_as::<_, PropertyRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(Error::Sqlx)?;

    row.map(PropertyRow::into_property).transpose()
}

/// Gets a single property, failing with `NotFound` when it does not exist.
pub async fn get_property(conn: &mut DbConn, id: i64) -> Result<Property> {
    get_property_optional(conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Property {} not found", id)))
}

/// Reads the rent and deposit a new lease should copy.
pub async fn get_pricing_snapshot(conn: &mut DbConn, id: i64) -> Result<PricingSnapshot> {
    let (price_per_month, security_deposit) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT price_per_month, security_deposit FROM property WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?
    .ok_or_else(|| Error::NotFound(format!("Property {} not found", id)))?;

    Ok(PricingSnapshot {
        property_id: id,
        price_per_month: DecimalMoney::decode(price_per_month)?,
        security_deposit: DecimalMoney::decode(security_deposit)?,
    })
}

/// Lists all properties, newest listing first.
pub async fn list_properties(conn: &mut DbConn) -> Result<Vec<Property>> {
    let sql = format!(
        "SELECT {PROPERTY_COLUMNS} FROM property p {PROPERTY_JOINS} ORDER BY p.posted_date DESC, p.id DESC"
    );

    let rows = sqlx::query_as::<_, PropertyRow>(&sql)
        .fetch_all(conn)
        .await
        .map_err(Error::Sqlx)?;

    rows_into_properties(rows)
}

/// Lists the properties with the given ids. Unknown ids are skipped.
pub async fn list_properties_by_ids(conn: &mut DbConn, ids: &[i64]) -> Result<Vec<Property>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = (1..=ids.len())
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {PROPERTY_COLUMNS} FROM property p {PROPERTY_JOINS} WHERE p.id IN ({placeholders}) ORDER BY p.id"
    );

    let mut query = sqlx::query_as::<_, PropertyRow>(&sql);
    for id in ids {
        query = query.bind(*id);
    }

    let rows = query.fetch_all(conn).await.map_err(Error::Sqlx)?;
    rows_into_properties(rows)
}

/// Lists the properties managed by the given manager.
pub async fn list_properties_by_manager(
    conn: &mut DbConn,
    manager_cognito_id: &str,
) -> Result<Vec<Property>> {
    let sql = format!(
        "SELECT {PROPERTY_COLUMNS} FROM property p {PROPERTY_JOINS} WHERE p.manager_cognito_id = $1 ORDER BY p.id"
    );

    let rows = sqlx::query_as::<_, PropertyRow>(&sql)
        .bind(manager_cognito_id)
        .fetch_all(conn)
        .await
        .map_err(Error::Sqlx)?;

    rows_into_properties(rows)
}
