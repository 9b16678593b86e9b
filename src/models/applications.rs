use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::{
    leases::LeaseWithSchedule, managers::Manager, properties::Property, tenants::Tenant,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Denied,
}

impl ApplicationStatus {
    /// Only pending applications move, and only to a decided status.
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        self == ApplicationStatus::Pending && next != ApplicationStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: i64,
    pub application_date: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub property_id: i64,
    pub tenant_cognito_id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub message: Option<String>,
    pub lease_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub application_date: DateTime<Utc>,
    pub property_id: i64,
    pub tenant_cognito_id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub message: Option<String>,
}

/// An application joined with its property, the property's manager and the tenant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetails {
    #[serde(flatten)]
    pub application: Application,
    pub property: Property,
    pub manager: Manager,
    pub tenant: Tenant,
    pub lease: Option<LeaseWithSchedule>,
}

/// Whose applications to list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ApplicationFilter {
    #[default]
    All,
    Tenant(String),
    Manager(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_only_pending_transitions() {
        use ApplicationStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Denied));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Approved.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Denied));
        assert!(!Denied.can_transition_to(Approved));
    }

    #[test]
    fn test_status_text_form() {
        assert_eq!(ApplicationStatus::Approved.to_string(), "Approved");
        assert_eq!(
            ApplicationStatus::from_str("Denied").unwrap(),
            ApplicationStatus::Denied
        );
        assert!(ApplicationStatus::from_str("approved?").is_err());
    }
}
