use crate::{
    database::PoolHandle,
    error::{Error, Result},
    models::managers::{Manager, NewManager, UpdateManager},
    queries::managers,
    validation::{validate_email, validate_profile, validate_required},
};

/// Registers a manager profile.
pub async fn create_manager(pool: &PoolHandle, new_manager: NewManager) -> Result<Manager> {
    validate_profile(&new_manager.name, &new_manager.email, &new_manager.phone_number)?;
    let new_manager = NewManager {
        cognito_id: validate_required(&new_manager.cognito_id, "Manager id")?,
        name: new_manager.name.trim().to_string(),
        email: new_manager.email.trim().to_string(),
        phone_number: new_manager.phone_number.trim().to_string(),
    };

    let manager = pool
        .with_connection(move |conn| {
            Box::pin(async move { managers::create_manager(conn, new_manager).await })
        })
        .await?;

    tracing::info!(manager = %manager.cognito_id, "Manager created");
    Ok(manager)
}

pub async fn get_manager(pool: &PoolHandle, cognito_id: &str) -> Result<Manager> {
    let cognito_id = cognito_id.to_string();
    pool.with_connection(move |conn| {
        Box::pin(async move {
            managers::get_manager_optional(conn, &cognito_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Manager {} not found", cognito_id)))
        })
    })
    .await
}

/// Updates a manager's profile fields.
pub async fn update_manager(pool: &PoolHandle, cognito_id: &str, update: UpdateManager) -> Result<Manager> {
    if let Some(email) = update.email.as_deref() {
        validate_email(email)?;
    }
    let update = UpdateManager {
        name: update
            .name
            .map(|name| validate_required(&name, "Name"))
            .transpose()?,
        email: update.email.map(|email| email.trim().to_string()),
        phone_number: update
            .phone_number
            .map(|phone| validate_required(&phone, "Phone number"))
            .transpose()?,
    };

    let cognito_id = cognito_id.to_string();
    pool.with_connection(move |conn| {
        Box::pin(async move {
            managers::update_manager(conn, &cognito_id, update)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Manager {} not found", cognito_id)))
        })
    })
    .await
}
