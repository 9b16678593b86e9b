use crate::{
    database::PoolHandle,
    error::{Error, Result},
    models::{
        properties::Property,
        tenants::{NewTenant, Tenant, TenantWithFavorites, UpdateTenant},
    },
    queries::{properties, tenants},
    validation::{validate_email, validate_profile, validate_required},
};

/// Registers a tenant profile.
pub async fn create_tenant(pool: &PoolHandle, new_tenant: NewTenant) -> Result<Tenant> {
    validate_profile(&new_tenant.name, &new_tenant.email, &new_tenant.phone_number)?;
    let new_tenant = NewTenant {
        cognito_id: validate_required(&new_tenant.cognito_id, "Tenant id")?,
        name: new_tenant.name.trim().to_string(),
        email: new_tenant.email.trim().to_string(),
        phone_number: new_tenant.phone_number.trim().to_string(),
    };

    let tenant = pool
        .with_connection(move |conn| {
            Box::pin(async move { tenants::create_tenant(conn, new_tenant).await })
        })
        .await?;

    tracing::info!(tenant = %tenant.cognito_id, "Tenant created");
    Ok(tenant)
}

/// Gets a tenant together with their favorite properties.
pub async fn get_tenant(pool: &PoolHandle, cognito_id: &str) -> Result<TenantWithFavorites> {
    let cognito_id = cognito_id.to_string();
    pool.with_connection(move |conn| {
        Box::pin(async move {
            let tenant = tenants::get_tenant_optional(conn, &cognito_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Tenant {} not found", cognito_id)))?;
            let favorites = tenants::list_favorites(conn, &cognito_id).await?;
            Ok(TenantWithFavorites { tenant, favorites })
        })
    })
    .await
}

/// Updates a tenant's profile fields.
pub async fn update_tenant(pool: &PoolHandle, cognito_id: &str, update: UpdateTenant) -> Result<Tenant> {
    let update = UpdateTenant {
        name: update
            .name
            .map(|name| validate_required(&name, "Name"))
            .transpose()?,
        email: update
            .email
            .map(|email| validate_email(&email).map(|_| email.trim().to_string()))
            .transpose()?,
        phone_number: update
            .phone_number
            .map(|phone| validate_required(&phone, "Phone number"))
            .transpose()?,
    };

    let cognito_id = cognito_id.to_string();
    pool.with_connection(move |conn| {
        Box::pin(async move {
            tenants::update_tenant(conn, &cognito_id, update)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Tenant {} not found", cognito_id)))
        })
    })
    .await
}

/// Lists the properties a tenant currently resides at.
pub async fn list_current_residences(pool: &PoolHandle, cognito_id: &str) -> Result<Vec<Property>> {
    let cognito_id = cognito_id.to_string();
    pool.with_connection(move |conn| {
        Box::pin(async move {
            if tenants::get_tenant_optional(conn, &cognito_id).await?.is_none() {
                return Err(Error::NotFound(format!("Tenant {} not found", cognito_id)));
            }
            tenants::list_residences(conn, &cognito_id).await
        })
    })
    .await
}

/// Marks a property as favorite and returns the tenant with the updated favorites.
pub async fn add_favorite_property(
    pool: &PoolHandle,
    cognito_id: &str,
    property_id: i64,
) -> Result<TenantWithFavorites> {
    let cognito_id = cognito_id.to_string();
    pool.with_connection(move |conn| {
        Box::pin(async move {
            let tenant = tenants::get_tenant_optional(conn, &cognito_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Tenant {} not found", cognito_id)))?;
            if properties::get_property_optional(conn, property_id).await?.is_none() {
                return Err(Error::NotFound(format!("Property {} not found", property_id)));
            }
            if tenants::is_favorite(conn, &cognito_id, property_id).await? {
                return Err(Error::Conflict("Property already added as favorite".to_string()));
            }

            tenants::add_favorite(conn, &cognito_id, property_id).await?;
            let favorites = tenants::list_favorites(conn, &cognito_id).await?;
            Ok(TenantWithFavorites { tenant, favorites })
        })
    })
    .await
}

/// Removes a favorite and returns the tenant with the remaining favorites.
pub async fn remove_favorite_property(
    pool: &PoolHandle,
    cognito_id: &str,
    property_id: i64,
) -> Result<TenantWithFavorites> {
    let cognito_id = cognito_id.to_string();
    pool.with_connection(move |conn| {
        Box::pin(async move {
            let tenant = tenants::get_tenant_optional(conn, &cognito_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Tenant {} not found", cognito_id)))?;
            if !tenants::remove_favorite(conn, &cognito_id, property_id).await? {
                return Err(Error::NotFound(format!(
                    "Property {} is not a favorite of tenant {}",
                    property_id, cognito_id
                )));
            }

            let favorites = tenants::list_favorites(conn, &cognito_id).await?;
            Ok(TenantWithFavorites { tenant, favorites })
        })
    })
    .await
}
