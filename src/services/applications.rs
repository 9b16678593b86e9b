use chrono::{DateTime, Utc};

use crate::DbConn;
use crate::{
    database::PoolHandle,
    error::{Error, Result},
    models::{
        applications::{ApplicationDetails, ApplicationFilter, ApplicationStatus, NewApplication},
        leases::NewLease,
        requests::CreateApplicationRequest,
    },
    queries::{applications, leases, properties, tenants},
    services::leases::{lease_end_date, with_schedule},
    validation::{validate_profile, validate_required},
};

/// Attaches the lease of an application with its next payment date.
///
/// A decided application shows the lease it links to; otherwise the most
/// recent lease of the same tenant at the same property is shown, if any.
async fn attach_lease(
    conn: &mut DbConn,
    mut details: ApplicationDetails,
    now: DateTime<Utc>,
) -> Result<ApplicationDetails> {
    let lease = match details.application.lease_id {
        Some(lease_id) => leases::get_lease_optional(conn, lease_id).await?,
        None => {
            leases::get_latest_lease(
                conn,
                &details.application.tenant_cognito_id,
                details.application.property_id,
            )
            .await?
        }
    };

    details.lease = lease.map(|lease| with_schedule(lease, now)).transpose()?;
    Ok(details)
}

async fn load_application(conn: &mut DbConn, id: i64) -> Result<ApplicationDetails> {
    let details = applications::get_application_details_optional(conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Application {} not found", id)))?;
    attach_lease(conn, details, Utc::now()).await
}

/// Submits a pending application for a property.
pub async fn create_application(
    pool: &PoolHandle,
    request: CreateApplicationRequest,
) -> Result<ApplicationDetails> {
    validate_profile(&request.name, &request.email, &request.phone_number)?;
    let tenant_cognito_id = validate_required(&request.tenant_cognito_id, "Tenant id")?;

    let new_application = NewApplication {
        application_date: request.application_date.unwrap_or_else(Utc::now),
        property_id: request.property_id,
        tenant_cognito_id,
        name: request.name.trim().to_string(),
        email: request.email.trim().to_string(),
        phone_number: request.phone_number.trim().to_string(),
        message: request
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty()),
    };

    let details = pool
        .with_connection(move |conn| {
            Box::pin(async move {
                if properties::get_property_optional(conn, new_application.property_id)
                    .await?
                    .is_none()
                {
                    return Err(Error::NotFound(format!(
                        "Property {} not found",
                        new_application.property_id
                    )));
                }
                if tenants::get_tenant_optional(conn, &new_application.tenant_cognito_id)
                    .await?
                    .is_none()
                {
                    return Err(Error::NotFound(format!(
                        "Tenant {} not found",
                        new_application.tenant_cognito_id
                    )));
                }

                let id = applications::create_application(conn, new_application).await?;
                load_application(conn, id).await
            })
        })
        .await?;

    tracing::info!(
        application_id = details.application.id,
        property_id = details.application.property_id,
        tenant = %details.application.tenant_cognito_id,
        "Application submitted"
    );

    Ok(details)
}

/// Lists applications, each with its lease and next payment date when one exists.
pub async fn list_applications(
    pool: &PoolHandle,
    filter: ApplicationFilter,
) -> Result<Vec<ApplicationDetails>> {
    pool.with_connection(move |conn| {
        Box::pin(async move {
            let now = Utc::now();
            let rows = applications::list_application_details(conn, &filter).await?;

            let mut result = Vec::with_capacity(rows.len());
            for details in rows {
                result.push(attach_lease(conn, details, now).await?);
            }
            Ok(result)
        })
    })
    .await
}

/// Gets an application with its property, manager, tenant and lease.
pub async fn get_application(pool: &PoolHandle, id: i64) -> Result<ApplicationDetails> {
    pool.with_connection(move |conn| Box::pin(async move { load_application(conn, id).await }))
        .await
}

/// Decides a pending application.
///
/// Approving creates a lease that copies the property's current rent and
/// deposit, records the tenant as a resident of the property and links the
/// lease to the application, all in one transaction. Any other decision only
/// changes the status. Deciding an application that is no longer pending is a
/// `Conflict`, including when a concurrent decision wins the race.
pub async fn update_application_status(
    pool: &PoolHandle,
    id: i64,
    status: ApplicationStatus,
) -> Result<ApplicationDetails> {
    // Read outside the transaction; the conditional update below guards the write
    let (current, pricing) = pool
        .with_connection(move |conn| {
            Box::pin(async move {
                let application = applications::get_application_details_optional(conn, id)
                    .await?
                    .ok_or_else(|| Error::NotFound(format!("Application {} not found", id)))?
                    .application;
                let pricing = properties::get_pricing_snapshot(conn, application.property_id).await?;
                Ok((application, pricing))
            })
        })
        .await?;

    if !current.status.can_transition_to(status) {
        return Err(Error::Conflict(format!(
            "Application {} is {} and cannot become {}",
            id, current.status, status
        )));
    }

    let lease_id = pool
        .with_transaction(move |conn| {
            Box::pin(async move {
                let lease_id = if status == ApplicationStatus::Approved {
                    let start_date = Utc::now();
                    let lease = leases::create_lease(
                        conn,
                        NewLease {
                            start_date,
                            end_date: lease_end_date(start_date)?,
                            rent: pricing.price_per_month,
                            deposit: pricing.security_deposit,
                            property_id: pricing.property_id,
                            tenant_cognito_id: current.tenant_cognito_id.clone(),
                        },
                    )
                    .await?;

                    tenants::upsert_residence(conn, &current.tenant_cognito_id, current.property_id)
                        .await?;

                    Some(lease.id)
                } else {
                    None
                };

                if !applications::update_status_if_pending(conn, id, status, lease_id).await? {
                    return Err(Error::Conflict(format!(
                        "Application {} was already decided",
                        id
                    )));
                }

                Ok(lease_id)
            })
        })
        .await?;

    tracing::info!(
        application_id = id,
        status = %status,
        lease_id = ?lease_id,
        "Application status updated"
    );

    get_application(pool, id).await
}
