//! Connection pool lifecycle and scoped units of work.
//!
//! A [`PoolHandle`] is constructed explicitly from [`DatabaseConfig`] and
//! injected wherever database access is needed. The pool behind it is created
//! lazily on first use, can be closed, and is recreated by the next request
//! after a close.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use secrecy::ExposeSecret;
use sqlx::any::AnyPoolOptions;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::error::Result;

/// Database connection pool type
pub type DbPool = sqlx::AnyPool;

/// Database connection type - supports both pool connections and transactions
/// Use `&mut *conn` for pool connections, `&mut *tx` for transactions
pub type DbConn = sqlx::AnyConnection;

/// Shared, cloneable handle to the process connection pool.
#[derive(Clone)]
pub struct PoolHandle {
    inner: Arc<PoolHandleInner>,
}

struct PoolHandleInner {
    config: DatabaseConfig,
    pool: Mutex<Option<DbPool>>,
}

impl PoolHandle {
    /// Creates a handle without connecting.
    ///
    /// Missing credentials or inconsistent pool bounds fail here, before any
    /// connection attempt is made.
    pub fn new(config: DatabaseConfig) -> Result<Self> {
        config.validate()?;
        // Make sure the connect string is well-formed up front as well
        config.connection_string()?;

        Ok(Self {
            inner: Arc::new(PoolHandleInner {
                config,
                pool: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.inner.config
    }

    /// Returns the pool, creating it if this is the first use.
    ///
    /// Concurrent first callers serialize on the handle's lock, so exactly one
    /// pool is created.
    pub async fn initialize(&self) -> Result<DbPool> {
        let mut slot = self.inner.pool.lock().await;
        if let Some(pool) = slot.as_ref() {
            return Ok(pool.clone());
        }

        sqlx::any::install_default_drivers();

        let config = &self.inner.config;
        let pool = AnyPoolOptions::new()
            .min_connections(config.pool_min)
            .max_connections(config.pool_max)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(config.connection_string()?.expose_secret())
            .await?;

        info!(
            pool_min = config.pool_min,
            pool_max = config.pool_max,
            pool_increment = config.pool_increment,
            "Database pool initialized"
        );

        *slot = Some(pool.clone());
        Ok(pool)
    }

    /// Drains and discards the pool. The next unit of work re-initializes it.
    pub async fn close(&self) {
        let pool = self.inner.pool.lock().await.take();
        if let Some(pool) = pool {
            pool.close().await;
            info!("Database pool closed");
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.inner.pool.lock().await.is_some()
    }

    /// Runs `f` on one pooled connection, returning the connection on every exit path.
    ///
    /// Statements issued by `f` autocommit individually. Use this for reads and
    /// single-statement writes.
    ///
    /// ```ignore
    /// let tenant = pool
    ///     .with_connection(move |conn| Box::pin(async move {
    ///         queries::tenants::get_tenant_optional(conn, &cognito_id).await
    ///     }))
    ///     .await?;
    /// ```
    pub async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut DbConn) -> BoxFuture<'c, Result<T>> + Send,
        T: Send,
    {
        let pool = self.initialize().await?;
        let mut conn = pool.acquire().await?;

        let result = f(&mut *conn).await;

        // Dropping the guard hands the connection back to the pool; the pool
        // closes it instead if it is no longer usable.
        drop(conn);
        debug!("Connection released");

        result
    }

    /// Runs `f` inside one transaction: commit when it succeeds, roll back when it fails.
    ///
    /// The original error is returned after a rollback; a failing rollback is
    /// logged and never replaces it. If the returned future is dropped before
    /// completion the transaction is rolled back when the connection returns
    /// to the pool, so nothing is committed on cancellation.
    pub async fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut DbConn) -> BoxFuture<'c, Result<T>> + Send,
        T: Send,
    {
        let pool = self.initialize().await?;
        let mut tx = pool.begin().await?;

        match f(&mut *tx).await {
            Ok(value) => {
                tx.commit().await?;
                debug!("Transaction committed");
                Ok(value)
            }
            Err(err) => {
                match tx.rollback().await {
                    Ok(()) => debug!(error = %err, "Transaction rolled back"),
                    Err(rollback_err) => warn!(
                        error = %err,
                        rollback_error = %rollback_err,
                        "Failed to roll back transaction"
                    ),
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolHandle")
            .field("connect_string", &self.inner.config.connect_string)
            .finish_non_exhaustive()
    }
}
