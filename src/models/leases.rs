use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::tenants::Tenant;
use crate::codec::Money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lease {
    pub id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub rent: Money,
    pub deposit: Money,
    pub property_id: i64,
    pub tenant_cognito_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLease {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub rent: Money,
    pub deposit: Money,
    pub property_id: i64,
    pub tenant_cognito_id: String,
}

/// A lease with its derived next payment date.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseWithSchedule {
    #[serde(flatten)]
    pub lease: Lease,
    pub next_payment_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseDetails {
    #[serde(flatten)]
    pub lease: Lease,
    pub tenant: Tenant,
    pub property: PropertySummary,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
pub enum PaymentStatus {
    Pending,
    Paid,
    PartiallyPaid,
    Overdue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub amount_due: Money,
    pub amount_paid: Money,
    pub due_date: DateTime<Utc>,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_status: PaymentStatus,
    pub lease_id: i64,
}
