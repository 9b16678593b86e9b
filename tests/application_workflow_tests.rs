mod common;

use common::TestDb;
use rentals::{
    Error,
    codec::Money,
    models::{
        applications::{ApplicationDetails, ApplicationFilter, ApplicationStatus},
        requests::{CreateApplicationRequest, UpdateApplicationStatusRequest},
    },
    queries::{applications as application_queries, tenants as tenant_queries},
    services::{
        applications::{
            create_application, get_application, list_applications, update_application_status,
        },
        leases::lease_end_date,
    },
};

/// Seeds a manager, a tenant and one property renting at 1500.00 with a 3000.00 deposit.
async fn setup(test_db: &TestDb) -> i64 {
    test_db.seed_manager("mgr-1").await;
    test_db.seed_tenant("ten-1").await;
    test_db.seed_property("mgr-1", "1500", "3000").await
}

async fn submit(test_db: &TestDb, property_id: i64, tenant: &str) -> ApplicationDetails {
    create_application(
        &test_db.pool,
        CreateApplicationRequest {
            application_date: None,
            property_id,
            tenant_cognito_id: tenant.to_string(),
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone_number: "555-0300".to_string(),
            message: Some("Looking forward to it".to_string()),
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_new_application_is_pending_without_lease() {
    let test_db = TestDb::new().await;
    let property_id = setup(&test_db).await;

    let details = submit(&test_db, property_id, "ten-1").await;

    assert_eq!(details.application.status, ApplicationStatus::Pending);
    assert!(details.application.lease_id.is_none());
    assert!(details.lease.is_none());
    assert_eq!(details.property.id, property_id);
    assert_eq!(details.manager.cognito_id, "mgr-1");
    assert_eq!(details.tenant.cognito_id, "ten-1");
    assert_eq!(test_db.count("lease").await, 0);
}

#[tokio::test]
async fn test_application_for_unknown_property_is_not_found() {
    let test_db = TestDb::new().await;
    setup(&test_db).await;

    let result = create_application(
        &test_db.pool,
        CreateApplicationRequest {
            application_date: None,
            property_id: 9999,
            tenant_cognito_id: "ten-1".to_string(),
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone_number: "555-0300".to_string(),
            message: None,
        },
    )
    .await;

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(test_db.count("application").await, 0);
}

#[tokio::test]
async fn test_approval_creates_one_lease_from_price_snapshot() {
    let test_db = TestDb::new().await;
    let property_id = setup(&test_db).await;
    let application = submit(&test_db, property_id, "ten-1").await;

    let request = UpdateApplicationStatusRequest {
        status: "Approved".to_string(),
    };
    let approved = update_application_status(
        &test_db.pool,
        application.application.id,
        request.parsed_status().unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(approved.application.status, ApplicationStatus::Approved);
    let lease = approved.lease.as_ref().expect("Approved application should carry its lease");
    assert_eq!(approved.application.lease_id, Some(lease.lease.id));
    let snapshot = application.property.pricing();
    assert_eq!(lease.lease.rent, snapshot.price_per_month);
    assert_eq!(lease.lease.deposit, snapshot.security_deposit);
    assert_eq!(lease.lease.rent, Money::parse("1500").unwrap());
    assert_eq!(lease.lease.property_id, property_id);
    assert_eq!(lease.lease.tenant_cognito_id, "ten-1");
    assert_eq!(lease.lease.end_date, lease_end_date(lease.lease.start_date).unwrap());
    assert!(lease.next_payment_date > lease.lease.start_date);

    assert_eq!(test_db.count("lease").await, 1);
    assert_eq!(test_db.count("tenant_properties").await, 1);

    // Later price changes do not reach the lease
    test_db.execute("UPDATE property SET price_per_month = 99900").await;
    let reread = get_application(&test_db.pool, application.application.id).await.unwrap();
    assert_eq!(reread.lease.unwrap().lease.rent, Money::parse("1500").unwrap());
}

#[tokio::test]
async fn test_second_approval_is_rejected() {
    let test_db = TestDb::new().await;
    let property_id = setup(&test_db).await;
    let application = submit(&test_db, property_id, "ten-1").await;
    let id = application.application.id;

    update_application_status(&test_db.pool, id, ApplicationStatus::Approved)
        .await
        .unwrap();
    let second = update_application_status(&test_db.pool, id, ApplicationStatus::Approved).await;

    assert!(matches!(second, Err(Error::Conflict(_))));
    assert_eq!(test_db.count("lease").await, 1, "No second lease may be created");
}

#[tokio::test]
async fn test_concurrent_approvals_create_one_lease() {
    let test_db = TestDb::new().await;
    let property_id = setup(&test_db).await;
    let id = submit(&test_db, property_id, "ten-1").await.application.id;

    // Both pass the pending check; the conditional update decides the race
    let (a, b) = tokio::join!(
        update_application_status(&test_db.pool, id, ApplicationStatus::Approved),
        update_application_status(&test_db.pool, id, ApplicationStatus::Approved)
    );

    let conflicts = [&a, &b]
        .iter()
        .filter(|result| matches!(result, Err(Error::Conflict(_))))
        .count();
    assert_eq!(conflicts, 1, "Exactly one approval must lose, got {:?} and {:?}", a, b);

    let winner = a.or(b).unwrap();
    assert_eq!(winner.application.status, ApplicationStatus::Approved);
    assert_eq!(test_db.count("lease").await, 1, "The losing lease must be rolled back");
    assert_eq!(test_db.count("tenant_properties").await, 1);

    let details = get_application(&test_db.pool, id).await.unwrap();
    assert_eq!(details.application.lease_id, Some(winner.lease.unwrap().lease.id));
}

#[tokio::test]
async fn test_conditional_update_only_matches_pending() {
    let test_db = TestDb::new().await;
    let property_id = setup(&test_db).await;
    let id = submit(&test_db, property_id, "ten-1").await.application.id;

    let (first, second) = test_db
        .pool
        .with_connection(move |conn| {
            Box::pin(async move {
                let first = application_queries::update_status_if_pending(
                    conn,
                    id,
                    ApplicationStatus::Denied,
                    None,
                )
                .await?;
                let second = application_queries::update_status_if_pending(
                    conn,
                    id,
                    ApplicationStatus::Approved,
                    None,
                )
                .await?;
                Ok((first, second))
            })
        })
        .await
        .unwrap();

    assert!(first);
    assert!(!second, "A decided application must not match again");
}

#[tokio::test]
async fn test_failed_lease_insert_keeps_application_pending() {
    let test_db = TestDb::new().await;
    let property_id = setup(&test_db).await;
    let id = submit(&test_db, property_id, "ten-1").await.application.id;

    test_db.fail_inserts_into("lease").await;
    let result = update_application_status(&test_db.pool, id, ApplicationStatus::Approved).await;
    assert!(matches!(result, Err(Error::Sqlx(_))), "got {:?}", result.err());

    let details = get_application(&test_db.pool, id).await.unwrap();
    assert_eq!(details.application.status, ApplicationStatus::Pending);
    assert!(details.application.lease_id.is_none());
    assert_eq!(test_db.count("lease").await, 0);
    assert_eq!(test_db.count("tenant_properties").await, 0);
}

#[tokio::test]
async fn test_denial_changes_status_only() {
    let test_db = TestDb::new().await;
    let property_id = setup(&test_db).await;
    let id = submit(&test_db, property_id, "ten-1").await.application.id;

    let denied = update_application_status(&test_db.pool, id, ApplicationStatus::Denied)
        .await
        .unwrap();

    assert_eq!(denied.application.status, ApplicationStatus::Denied);
    assert!(denied.application.lease_id.is_none());
    assert!(denied.lease.is_none());
    assert_eq!(test_db.count("lease").await, 0);
    assert_eq!(test_db.count("tenant_properties").await, 0);

    let approve_after_deny =
        update_application_status(&test_db.pool, id, ApplicationStatus::Approved).await;
    assert!(matches!(approve_after_deny, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn test_approval_with_existing_residence_is_a_no_op_upsert() {
    let test_db = TestDb::new().await;
    let property_id = setup(&test_db).await;
    let id = submit(&test_db, property_id, "ten-1").await.application.id;

    let inserted = test_db
        .pool
        .with_connection(move |conn| {
            Box::pin(async move { tenant_queries::upsert_residence(conn, "ten-1", property_id).await })
        })
        .await
        .unwrap();
    assert!(inserted);

    update_application_status(&test_db.pool, id, ApplicationStatus::Approved)
        .await
        .unwrap();

    assert_eq!(test_db.count("tenant_properties").await, 1);
}

#[tokio::test]
async fn test_unknown_status_is_rejected() {
    let request = UpdateApplicationStatusRequest {
        status: "Maybe".to_string(),
    };
    assert!(matches!(request.parsed_status(), Err(Error::Validation(_))));
}

#[tokio::test]
async fn test_missing_application_is_not_found() {
    let test_db = TestDb::new().await;
    setup(&test_db).await;

    let result = update_application_status(&test_db.pool, 4242, ApplicationStatus::Approved).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(test_db.count("lease").await, 0);
}

#[tokio::test]
async fn test_list_applications_by_tenant_and_manager() {
    let test_db = TestDb::new().await;
    let property_id = setup(&test_db).await;
    test_db.seed_tenant("ten-2").await;

    let first = submit(&test_db, property_id, "ten-1").await.application.id;
    submit(&test_db, property_id, "ten-2").await;
    update_application_status(&test_db.pool, first, ApplicationStatus::Approved)
        .await
        .unwrap();

    let all = list_applications(&test_db.pool, ApplicationFilter::All).await.unwrap();
    assert_eq!(all.len(), 2);

    let for_tenant = list_applications(&test_db.pool, ApplicationFilter::Tenant("ten-1".to_string()))
        .await
        .unwrap();
    assert_eq!(for_tenant.len(), 1);
    assert!(for_tenant[0].lease.is_some(), "Approved application lists its lease");

    let for_manager = list_applications(&test_db.pool, ApplicationFilter::Manager("mgr-1".to_string()))
        .await
        .unwrap();
    assert_eq!(for_manager.len(), 2);

    let for_other = list_applications(&test_db.pool, ApplicationFilter::Manager("mgr-9".to_string()))
        .await
        .unwrap();
    assert!(for_other.is_empty());
}
