use crate::{
    codec::{ColumnCodec, TimestampText},
    error::{Error, Result},
    models::{
        applications::{
            Application, ApplicationDetails, ApplicationFilter, ApplicationStatus, NewApplication,
        },
        tenants::Tenant,
    },
    queries::properties::{PROPERTY_COLUMNS, PROPERTY_JOINS, PropertyRow},
};

use crate::DbConn;

const APPLICATION_COLUMNS: &str = r#"
    a.id AS id,
    a.application_date AS application_date,
    a.status AS status,
    a.tenant_cognito_id AS tenant_cognito_id,
    a.name AS name,
    a.email AS email,
    a.phone_number AS phone_number,
    a.message AS message,
    a.lease_id AS lease_id,
    t.id AS tenant_id,
    t.name AS tenant_name,
    t.email AS tenant_email,
    t.phone_number AS tenant_phone_number
"#;

const APPLICATION_JOINS: &str = r#"
    JOIN tenant t ON a.tenant_cognito_id = t.cognito_id
    JOIN property p ON a.property_id = p.id
"#;

#[derive(Debug, sqlx::FromRow)]
struct ApplicationRow {
    id: i64,
    application_date: String,
    status: String,
    tenant_cognito_id: String,
    name: String,
    email: String,
    phone_number: String,
    message: Option<String>,
    lease_id: Option<i64>,
    tenant_id: i64,
    tenant_name: String,
    tenant_email: String,
    tenant_phone_number: String,
    #[sqlx(flatten)]
    property: PropertyRow,
}

impl ApplicationRow {
    /// Maps the joined row. The lease is attached by the caller.
    fn into_details(self) -> Result<ApplicationDetails> {
        let status = self.status.parse::<ApplicationStatus>().map_err(|_| {
            Error::Internal(format!("Unknown application status '{}'", self.status))
        })?;
        let property = self.property.into_property()?;

        let application = Application {
            id: self.id,
            application_date: TimestampText::decode(self.application_date)?,
            status,
            property_id: property.id,
            tenant_cognito_id: self.tenant_cognito_id.clone(),
            name: self.name,
            email: self.email,
            phone_number: self.phone_number,
            message: self.message,
            lease_id: self.lease_id,
        };

        let tenant = Tenant {
            id: self.tenant_id,
            cognito_id: self.tenant_cognito_id,
            name: self.tenant_name,
            email: self.tenant_email,
            phone_number: self.tenant_phone_number,
        };

        Ok(ApplicationDetails {
            application,
            manager: property.manager.clone(),
            property,
            tenant,
            lease: None,
        })
    }
}

/// Creates a new pending application and returns its id.
pub async fn create_application(conn: &mut DbConn, new_application: NewApplication) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO application (
            application_date, status, property_id, tenant_cognito_id,
            name, email, phone_number, message
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(TimestampText::encode(&new_application.application_date))
    .bind(ApplicationStatus::Pending.to_string())
    .bind(new_application.property_id)
    .bind(new_application.tenant_cognito_id)
    .bind(new_application.name)
    .bind(new_application.email)
    .bind(new_application.phone_number)
    .bind(new_application.message)
    .fetch_one(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(id)
}

/// Gets an application with its property, manager and tenant. The application may not exist.
pub async fn get_application_details_optional(
    conn: &mut DbConn,
    id: i64,
) -> Result<Option<ApplicationDetails>> {
    let sql = format!(
        "SELECT {APPLICATION_COLUMNS}, {PROPERTY_COLUMNS} FROM application a {APPLICATION_JOINS} {PROPERTY_JOINS} WHERE a.id = $1"
    );

    let row = sqlx::query_as::<_, ApplicationRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(Error::Sqlx)?;

    row.map(ApplicationRow::into_details).transpose()
}

/// Lists applications with their property, manager and tenant.
pub async fn list_application_details(
    conn: &mut DbConn,
    filter: &ApplicationFilter,
) -> Result<Vec<ApplicationDetails>> {
    let (condition, subject) = match filter {
        ApplicationFilter::All => ("", None),
        ApplicationFilter::Tenant(cognito_id) => ("WHERE a.tenant_cognito_id = $1", Some(cognito_id)),
        ApplicationFilter::Manager(cognito_id) => ("WHERE p.manager_cognito_id = $1", Some(cognito_id)),
    };
    let sql = format!(
        "SELECT {APPLICATION_COLUMNS}, {PROPERTY_COLUMNS} FROM application a {APPLICATION_JOINS} {PROPERTY_JOINS} {condition} ORDER BY a.id"
    );

    let mut query = sqlx::query_as::<_, ApplicationRow>(&sql);
    if let Some(cognito_id) = subject {
        query = query.bind(cognito_id.as_str());
    }

    let rows = query.fetch_all(conn).await.map_err(Error::Sqlx)?;
    rows.into_iter().map(ApplicationRow::into_details).collect()
}

/// Moves a pending application to `status`, linking `lease_id` when given.
///
/// The update only matches an application that is still pending and has no
/// lease. Returns `false` when nothing matched, which means another writer
/// decided the application first.
pub async fn update_status_if_pending(
    conn: &mut DbConn,
    id: i64,
    status: ApplicationStatus,
    lease_id: Option<i64>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE application
        SET status = $1, lease_id = $2
        WHERE id = $3 AND status = $4 AND lease_id IS NULL
        "#,
    )
    .bind(status.to_string())
    .bind(lease_id)
    .bind(id)
    .bind(ApplicationStatus::Pending.to_string())
    .execute(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(result.rows_affected() == 1)
}
