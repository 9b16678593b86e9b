use crate::{
    error::{Error, Result},
    models::managers::{Manager, NewManager, UpdateManager},
};

use crate::DbConn;

/// Creates a new manager in the database.
pub async fn create_manager(conn: &mut DbConn, new_manager: NewManager) -> Result<Manager> {
    let manager = sqlx::query_as::<_, Manager>(
        r#"
        INSERT INTO manager (cognito_id, name, email, phone_number)
        VALUES ($1, $2, $3, $4)
        RETURNING id, cognito_id, name, email, phone_number
        "#,
    )
    .bind(new_manager.cognito_id)
    .bind(new_manager.name)
    .bind(new_manager.email)
    .bind(new_manager.phone_number)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        let error_msg = e.to_string().to_lowercase();
        if error_msg.contains("unique") || error_msg.contains("duplicate key") {
            Error::Conflict("Manager already exists".to_string())
        } else {
            Error::Sqlx(e)
        }
    })?;

    Ok(manager)
}

/// Gets a single manager by their external identity. The manager may not exist.
pub async fn get_manager_optional(conn: &mut DbConn, cognito_id: &str) -> Result<Option<Manager>> {
    let manager = sqlx::query_as::<_, Manager>(
        r#"
        SELECT id, cognito_id, name, email, phone_number
        FROM manager
        WHERE cognito_id = $1
        "#,
    )
    .bind(cognito_id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(manager)
}

/// Updates the given fields of a manager. Fields left as `None` keep their value.
pub async fn update_manager(
    conn: &mut DbConn,
    cognito_id: &str,
    update: UpdateManager,
) -> Result<Option<Manager>> {
    let manager = sqlx::query_as::<_, Manager>(
        r#"
        UPDATE manager
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

    Ok(manager)
}
