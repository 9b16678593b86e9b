use crate::{
    error::{Error, Result},
    models::{
        properties::Property,
        tenants::{NewTenant, Tenant, UpdateTenant},
    },
    queries::properties::{PROPERTY_COLUMNS, PROPERTY_JOINS, PropertyRow, rows_into_properties},
};

use crate::DbConn;

/// Creates a new tenant in the database.
pub async fn create_tenant(conn: &mut DbConn, new_tenant: NewTenant) -> Result<Tenant> {
    let tenant = sqlx::query_as::<_, Tenant>(
        r#"
        INSERT INTO tenant (cognito_id, name, email, phone_number)
        VALUES ($1, $2, $3, $4)
        RETURNING id, cognito_id, name, email, phone_number
        "#,
    )
    .bind(new_tenant.cognito_id)
    .bind(new_tenant.name)
    .bind(new_tenant.email)
    .bind(new_tenant.phone_number)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        let error_msg = e.to_string().to_lowercase();
        if error_msg.contains("unique") || error_msg.contains("duplicate key") {
            Error::Conflict("Tenant already exists".to_string())
        } else {
            Error::Sqlx(e)
        }
    })?;

    Ok(tenant)
}

/// Gets a single tenant by their external identity. The tenant may not exist.
pub async fn get_tenant_optional(conn: &mut DbConn, cognito_id: &str) -> Result<Option<Tenant>> {
    let tenant = sqlx::query_as::<_, Tenant>(
        r#"
        SELECT id, cognito_id, name, email, phone_number
        FROM tenant
        WHERE cognito_id = $1
        "#,
    )
    .bind(cognito_id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(tenant)
}

/// Updates the given fields of a tenant. Fields left as `None` keep their value.
pub async fn update_tenant(
    conn: &mut DbConn,
    cognito_id: &str,
    update: UpdateTenant,
) -> Result<Option<Tenant>> {
    let tenant = sqlx::query_as::<_, Tenant>(
        r#"
        UPDATE tenant
        SET name = COALESCE($1, name),
            email = COALESCE($2, email),
            phone_number = COALESCE($3, phone_number)
        WHERE cognito_id = $4
        RETURNING id, cognito_id, name, email, phone_number
        "#,
    )
    .bind(update.name)
    .bind(update.email)
    .bind(update.phone_number)
    .bind(cognito_id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(tenant)
}

/// Records that the tenant resides at the property.
///
/// Returns `true` when a new association was written and `false` when it
/// already existed.
pub async fn upsert_residence(
    conn: &mut DbConn,
    tenant_cognito_id: &str,
    property_id: i64,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO tenant_properties (tenant_cognito_id, property_id)
        VALUES ($1, $2)
        ON CONFLICT (tenant_cognito_id, property_id) DO NOTHING
        "#,
    )
    .bind(tenant_cognito_id)
    .bind(property_id)
    .execute(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(result.rows_affected() > 0)
}

/// Lists the properties the tenant currently resides at.
pub async fn list_residences(conn: &mut DbConn, tenant_cognito_id: &str) -> Result<Vec<Property>> {
    let sql = format!(
        r#"
        SELECT {PROPERTY_COLUMNS}
        FROM tenant_properties tp
        JOIN property p ON tp.property_id = p.id
        {PROPERTY_JOINS}
        WHERE tp.tenant_cognito_id = $1
        ORDER BY p.id
        "#
    );

    let rows = sqlx::query_as::<_, PropertyRow>(&sql)
        .bind(tenant_cognito_id)
        .fetch_all(conn)
        .await
        .map_err(Error::Sqlx)?;

    rows_into_properties(rows)
}

/// Checks whether the tenant already marked the property as favorite.
pub async fn is_favorite(conn: &mut DbConn, tenant_cognito_id: &str, property_id: i64) -> Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM tenant_favorites
        WHERE tenant_cognito_id = $1 AND property_id = $2
        "#,
    )
    .bind(tenant_cognito_id)
    .bind(property_id)
    .fetch_one(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(count > 0)
}

/// Marks the property as a favorite of the tenant.
pub async fn add_favorite(conn: &mut DbConn, tenant_cognito_id: &str, property_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO tenant_favorites (tenant_cognito_id, property_id)
        VALUES ($1, $2)
        "#,
    )
    .bind(tenant_cognito_id)
    .bind(property_id)
    .execute(conn)
    .await
    .map_err(|e| {
        let error_msg = e.to_string().to_lowercase();
        if error_msg.contains("unique") || error_msg.contains("duplicate key") {
            Error::Conflict("Property already added as favorite".to_string())
        } else {
            Error::Sqlx(e)
        }
    })?;

    Ok(())
}

/// Removes a favorite. Returns `true` if a favorite was deleted.
pub async fn remove_favorite(
    conn: &mut DbConn,
    tenant_cognito_id: &str,
    property_id: i64,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM tenant_favorites
        WHERE tenant_cognito_id = $1 AND property_id = $2
        "#,
    )
    .bind(tenant_cognito_id)
    .bind(property_id)
    .execute(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(result.rows_affected() > 0)
}

/// Lists the tenant's favorite properties.
pub async fn list_favorites(conn: &mut DbConn, tenant_cognito_id: &str) -> Result<Vec<Property>> {
    let sql = format!(
        r#"
        SELECT {PROPERTY_COLUMNS}
        FROM tenant_favorites tf
        JOIN property p ON tf.property_id = p.id
        {PROPERTY_JOINS}
        WHERE tf.tenant_cognito_id = $1
        ORDER BY p.id
        "#
    );

    let rows = sqlx::query_as::<_, PropertyRow>(&sql)
        .bind(tenant_cognito_id)
        .fetch_all(conn)
        .await
        .map_err(Error::Sqlx)?;

    rows_into_properties(rows)
}
