mod common;

use std::time::Duration;

use common::TestDb;
use rentals::{
    Error, PoolHandle,
    models::managers::NewManager,
    queries::managers,
};

fn new_manager(cognito_id: &str) -> NewManager {
    NewManager {
        cognito_id: cognito_id.to_string(),
        name: "Pat Manager".to_string(),
        email: "pat@example.com".to_string(),
        phone_number: "555-0100".to_string(),
    }
}

#[tokio::test]
async fn test_concurrent_first_use_creates_one_pool() {
    let test_db = TestDb::new().await;
    let handle = PoolHandle::new(test_db.pool.config().clone()).unwrap();
    assert!(!handle.is_initialized().await);

    let (first, second) = tokio::join!(handle.initialize(), handle.initialize());
    let first = first.unwrap();
    let second = second.unwrap();
    assert!(handle.is_initialized().await);

    // Closing one closes the other only when both are the same pool
    first.close().await;
    assert!(second.is_closed(), "Concurrent first callers must share one pool");
}

#[tokio::test]
async fn test_pool_is_reinitialized_after_close() {
    let test_db = TestDb::new().await;
    assert!(test_db.pool.is_initialized().await);

    test_db.pool.close().await;
    assert!(!test_db.pool.is_initialized().await, "Close should discard the pool");

    // The next unit of work brings the pool back, data is still there
    assert_eq!(test_db.count("manager").await, 0);
    assert!(test_db.pool.is_initialized().await);
}

#[tokio::test]
async fn test_transaction_commits_on_success() {
    let test_db = TestDb::new().await;

    let manager = test_db
        .pool
        .with_transaction(|conn| {
            Box::pin(async move { managers::create_manager(conn, new_manager("mgr-commit")).await })
        })
        .await
        .unwrap();

    assert_eq!(manager.cognito_id, "mgr-commit");
    assert_eq!(test_db.count("manager").await, 1);
}

#[tokio::test]
async fn test_transaction_rolls_back_and_returns_original_error() {
    let test_db = TestDb::new().await;

    let result: rentals::Result<()> = test_db
        .pool
        .with_transaction(|conn| {
            Box::pin(async move {
                managers::create_manager(conn, new_manager("mgr-rollback")).await?;
                Err(Error::Validation("abort after insert".to_string()))
            })
        })
        .await;

    match result {
        Err(Error::Validation(msg)) => assert_eq!(msg, "abort after insert"),
        other => panic!("Expected the original validation error, got {:?}", other),
    }
    assert_eq!(test_db.count("manager").await, 0, "Insert should be rolled back");
}

#[tokio::test]
async fn test_statement_failure_rolls_back_earlier_statements() {
    let test_db = TestDb::new().await;

    let result = test_db
        .pool
        .with_transaction(|conn| {
            Box::pin(async move {
                managers::create_manager(conn, new_manager("mgr-dup")).await?;
                managers::create_manager(conn, new_manager("mgr-dup")).await
            })
        })
        .await;

    assert!(matches!(result, Err(Error::Conflict(_))));
    assert_eq!(test_db.count("manager").await, 0);
}

#[tokio::test]
async fn test_connection_is_released_when_work_fails() {
    let test_db = TestDb::new().await;

    // More failing units of work than the pool has connections
    for _ in 0..8 {
        let result: rentals::Result<()> = test_db
            .pool
            .with_connection(|_conn| {
                Box::pin(async move { Err(Error::NotFound("nothing here".to_string())) })
            })
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    assert_eq!(test_db.count("manager").await, 0);
}

#[tokio::test]
async fn test_cancelled_transaction_is_not_committed() {
    let test_db = TestDb::new().await;

    let pool = test_db.pool.clone();
    let work = pool.with_transaction(|conn| {
        Box::pin(async move {
            managers::create_manager(conn, new_manager("mgr-cancelled")).await?;
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
    });

    let outcome = tokio::time::timeout(Duration::from_millis(200), work).await;
    assert!(outcome.is_err(), "Unit of work should have been cancelled");

    assert_eq!(test_db.count("manager").await, 0);
}
