use crate::{
    codec::{ColumnCodec, DecimalMoney, TimestampText},
    error::{Error, Result},
    models::{
        leases::{Lease, LeaseDetails, NewLease, Payment, PaymentStatus, PropertySummary},
        tenants::Tenant,
    },
};

use crate::DbConn;

const LEASE_COLUMNS: &str =
    "le.id AS id, le.start_date AS start_date, le.end_date AS end_date, le.rent AS rent, \
     le.deposit AS deposit, le.property_id AS property_id, le.tenant_cognito_id AS tenant_cognito_id";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct LeaseRow {
    id: i64,
    start_date: String,
    end_date: String,
    rent: i64,
    deposit: i64,
    property_id: i64,
    tenant_cognito_id: String,
}

impl LeaseRow {
    pub(crate) fn into_lease(self) -> Result<Lease> {
        Ok(Lease {
            id: self.id,
            start_date: TimestampText::decode(self.start_date)?,
            end_date: TimestampText::decode(self.end_date)?,
            rent: DecimalMoney::decode(self.rent)?,
            deposit: DecimalMoney::decode(self.deposit)?,
            property_id: self.property_id,
            tenant_cognito_id: self.tenant_cognito_id,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LeaseDetailsRow {
    #[sqlx(flatten)]
    lease: LeaseRow,
    tenant_id: i64,
    tenant_name: String,
    tenant_email: String,
    tenant_phone_number: String,
    property_name: String,
    property_description: String,
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    amount_due: i64,
    amount_paid: i64,
    due_date: String,
    payment_date: Option<String>,
    payment_status: String,
    lease_id: i64,
}

impl PaymentRow {
    fn into_payment(self) -> Result<Payment> {
        let payment_status = self.payment_status.parse::<PaymentStatus>().map_err(|_| {
            Error::Internal(format!("Unknown payment status '{}'", self.payment_status))
        })?;

        Ok(Payment {
            id: self.id,
            amount_due: DecimalMoney::decode(self.amount_due)?,
            amount_paid: DecimalMoney::decode(self.amount_paid)?,
            due_date: TimestampText::decode(self.due_date)?,
            payment_date: self.payment_date.map(TimestampText::decode).transpose()?,
            payment_status,
            lease_id: self.lease_id,
        })
    }
}

/// Creates a new lease in the database.
pub async fn create_lease(conn: &mut DbConn, new_lease: NewLease) -> Result<Lease> {
    let row = sqlx::query_as::<_, LeaseRow>(
        r#"
        INSERT INTO lease (start_date, end_date, rent, deposit, property_id, tenant_cognito_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, start_date, end_date, rent, deposit, property_id, tenant_cognito_id
        "#,
    )
    .bind(TimestampText::encode(&new_lease.start_date))
    .bind(TimestampText::encode(&new_lease.end_date))
    .bind(DecimalMoney::encode(&new_lease.rent))
    .bind(DecimalMoney::encode(&new_lease.deposit))
    .bind(new_lease.property_id)
    .bind(new_lease.tenant_cognito_id)
    .fetch_one(conn)
    .await
    .map_err(Error::Sqlx)?;

    row.into_lease()
}

/// Gets a single lease by its ID. The lease may not exist.
pub async fn get_lease_optional(conn: &mut DbConn, id: i64) -> Result<Option<Lease>> {
    let sql = format!("SELECT {LEASE_COLUMNS} FROM lease le WHERE le.id = $1");

    let row = sqlx::query_as::<_, LeaseRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(Error::Sqlx)?;

    row.map(LeaseRow::into_lease).transpose()
}

/// Gets the most recent lease of a tenant at a property, if any.
pub async fn get_latest_lease(
    conn: &mut DbConn,
    tenant_cognito_id: &str,
    property_id: i64,
) -> Result<Option<Lease>> {
    let sql = format!(
        r#"
        SELECT {LEASE_COLUMNS}
        FROM lease le
        WHERE le.tenant_cognito_id = $1 AND le.property_id = $2
        ORDER BY le.start_date DESC, le.id DESC
        LIMIT 1
        "#
    );

    let row = sqlx::query_as::<_, LeaseRow>(&sql)
        .bind(tenant_cognito_id)
        .bind(property_id)
        .fetch_optional(conn)
        .await
        .map_err(Error::Sqlx)?;

    row.map(LeaseRow::into_lease).transpose()
}

/// Lists all leases with their tenant and a summary of the leased property.
pub async fn list_leases(conn: &mut DbConn) -> Result<Vec<LeaseDetails>> {
    let sql = format!(
        r#"
        SELECT {LEASE_COLUMNS},
            t.id AS tenant_id,
            t.name AS tenant_name,
            t.email AS tenant_email,
            t.phone_number AS tenant_phone_number,
            p.name AS property_name,
            p.description AS property_description
        FROM lease le
        JOIN tenant t ON le.tenant_cognito_id = t.cognito_id
        JOIN property p ON le.property_id = p.id
        ORDER BY le.id
        "#
    );

    let rows = sqlx::query_as::<_, LeaseDetailsRow>(&sql)
        .fetch_all(conn)
        .await
        .map_err(Error::Sqlx)?;

    rows.into_iter()
        .map(|row| -> Result<LeaseDetails> {
            let lease = row.lease.into_lease()?;
            Ok(LeaseDetails {
                tenant: Tenant {
                    id: row.tenant_id,
                    cognito_id: lease.tenant_cognito_id.clone(),
                    name: row.tenant_name,
                    email: row.tenant_email,
                    phone_number: row.tenant_phone_number,
                },
                property: PropertySummary {
                    id: lease.property_id,
                    name: row.property_name,
                    description: row.property_description,
                },
                lease,
            })
        })
        .collect()
}

/// Lists the payments recorded against a lease, oldest due date first.
pub async fn list_payments(conn: &mut DbConn, lease_id: i64) -> Result<Vec<Payment>> {
    let rows = sqlx::query_as::<_, PaymentRow>(
        r#"
        SELECT id, amount_due, amount_paid, due_date, payment_date, payment_status, lease_id
        FROM payment
        WHERE lease_id = $1
        ORDER BY due_date, id
        "#,
    )
    .bind(lease_id)
    .fetch_all(conn)
    .await
    .map_err(Error::Sqlx)?;

    rows.into_iter().map(PaymentRow::into_payment).collect()
}
