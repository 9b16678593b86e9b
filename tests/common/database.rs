use chrono::Utc;
use rentals::{
    codec::Money,
    config::DatabaseConfig,
    models::{
        leases::{Lease, NewLease},
        managers::{Manager, NewManager},
        properties::{Coordinates, NewLocation, NewProperty},
        tenants::{NewTenant, Tenant},
    },
    queries::{leases, locations, managers, properties, tenants},
    PoolHandle,
};
use secrecy::SecretString;
use tempfile::TempDir;

const SCHEMA: &str = include_str!("schema.sql");

/// A throwaway SQLite database in its own temporary directory.
///
/// Each test gets a fresh file, so tests never share rows and can run in
/// parallel. The directory is removed when the `TestDb` is dropped.
pub struct TestDb {
    pub pool: PoolHandle,
    _dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("rentals.db");

        let config = DatabaseConfig {
            user: "rentals_test".to_string(),
            password: SecretString::from("rentals_test".to_string()),
            connect_string: format!("sqlite://{}?mode=rwc", path.display()),
            pool_min: 1,
            pool_max: 4,
            ..DatabaseConfig::default()
        };
        let pool = PoolHandle::new(config).expect("Failed to create pool handle");

        let test_db = Self { pool, _dir: dir };
        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            test_db.execute(statement).await;
        }
        test_db
    }

    /// Runs a single SQL statement outside any transaction.
    pub async fn execute(&self, sql: &'static str) {
        self.pool
            .with_connection(move |conn| {
                Box::pin(async move {
                    sqlx::query(sql).execute(&mut *conn).await?;
                    Ok(())
                })
            })
            .await
            .expect("Failed to execute SQL");
    }

    /// Makes every insert into `table` fail with `injected failure`.
    pub async fn fail_inserts_into(&self, table: &'static str) {
        let sql = match table {
            "lease" => "CREATE TRIGGER fail_lease BEFORE INSERT ON lease BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
            "property" => "CREATE TRIGGER fail_property BEFORE INSERT ON property BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
            other => panic!("No failure trigger for table {}", other),
        };
        self.execute(sql).await;
    }

    pub async fn count(&self, table: &str) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        self.pool
            .with_connection(move |conn| {
                Box::pin(async move {
                    let count = sqlx::query_scalar::<_, i64>(&sql).fetch_one(&mut *conn).await?;
                    Ok(count)
                })
            })
            .await
            .expect("Failed to count rows")
    }

    pub async fn seed_manager(&self, cognito_id: &str) -> Manager {
        let new_manager = NewManager {
            cognito_id: cognito_id.to_string(),
            name: format!("Manager {}", cognito_id),
            email: format!("{}@managers.example.com", cognito_id),
            phone_number: "555-0100".to_string(),
        };
        self.pool
            .with_connection(move |conn| {
                Box::pin(async move { managers::create_manager(conn, new_manager).await })
            })
            .await
            .expect("Failed to seed manager")
    }

    pub async fn seed_tenant(&self, cognito_id: &str) -> Tenant {
        let new_tenant = NewTenant {
            cognito_id: cognito_id.to_string(),
            name: format!("Tenant {}", cognito_id),
            email: format!("{}@tenants.example.com", cognito_id),
            phone_number: "555-0200".to_string(),
        };
        self.pool
            .with_connection(move |conn| {
                Box::pin(async move { tenants::create_tenant(conn, new_tenant).await })
            })
            .await
            .expect("Failed to seed tenant")
    }

    /// Inserts a property with a location, returning its id.
    pub async fn seed_property(&self, manager_cognito_id: &str, rent: &str, deposit: &str) -> i64 {
        let new_location = NewLocation {
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            country: "US".to_string(),
            postal_code: "62701".to_string(),
            coordinates: Coordinates {
                latitude: 39.78,
                longitude: -89.65,
            },
        };
        let new_property = NewProperty {
            name: "Maple Court".to_string(),
            description: "Two bedroom flat".to_string(),
            price_per_month: Money::parse(rent).expect("valid rent"),
            security_deposit: Money::parse(deposit).expect("valid deposit"),
            application_fee: Money::parse("50").expect("valid fee"),
            photo_urls: Vec::new(),
            amenities: vec!["wifi".to_string(), "pool".to_string()],
            highlights: vec!["quiet".to_string()],
            is_pets_allowed: true,
            is_parking_included: false,
            beds: 2,
            baths: 1.5,
            square_feet: 850,
            property_type: "Apartment".to_string(),
            posted_date: Utc::now(),
            location_id: 0,
            manager_cognito_id: manager_cognito_id.to_string(),
        };

        self.pool
            .with_transaction(move |conn| {
                Box::pin(async move {
                    let location_id = locations::create_location(conn, new_location).await?;
                    properties::create_property(
                        conn,
                        NewProperty {
                            location_id,
                            ..new_property
                        },
                    )
                    .await
                })
            })
            .await
            .expect("Failed to seed property")
    }

    pub async fn seed_lease(&self, new_lease: NewLease) -> Lease {
        self.pool
            .with_connection(move |conn| {
                Box::pin(async move { leases::create_lease(conn, new_lease).await })
            })
            .await
            .expect("Failed to seed lease")
    }
}
