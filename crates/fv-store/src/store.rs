//! SQLite store: pool management and schema

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use tracing::{debug, info};

/// SQLite-backed topology store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given database URL
    ///
    /// URL format: `sqlite:/path/to/db.sqlite?mode=rwc` or `sqlite::memory:`
    pub async fn new(url: &str) -> Result<Self> {
        info!("Initializing SQLite topology store: {}", url);

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.initialize_schema().await?;

        info!("SQLite topology store initialized successfully");
        Ok(store)
    }

    /// Create an in-memory store for testing
    pub async fn in_memory() -> Result<Self> {
        // Every connection to sqlite::memory: is its own database, so the
        // pool must stay at a single connection.
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    /// Begin a transaction. All row-level operations take a connection so
    /// they participate in the unit of work the caller opened here.
    pub async fn begin(&self) -> Result<Transaction<'_, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// The underlying pool, for one-off reads outside a transaction.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize database schema
    async fn initialize_schema(&self) -> Result<()> {
        debug!("Initializing database schema");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS networks (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                admin_state_up INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ports (
                id TEXT PRIMARY KEY,
                network_id TEXT NOT NULL
                    REFERENCES networks(id) ON DELETE CASCADE,
                mac_address TEXT NOT NULL,
                admin_state_up INTEGER NOT NULL DEFAULT 1,
                device_owner TEXT NOT NULL DEFAULT '',
                device_id TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subnets (
                id TEXT PRIMARY KEY,
                network_id TEXT NOT NULL
                    REFERENCES networks(id) ON DELETE CASCADE,
                cidr TEXT NOT NULL,
                gateway_ip TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS network_controller_info (
                network_id TEXT PRIMARY KEY
                    REFERENCES networks(id) ON DELETE CASCADE,
                controller_host TEXT,
                controller_port INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_ports_network ON ports(network_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_subnets_network ON subnets(network_id)")
            .execute(&self.pool)
            .await?;

        debug!("Database schema initialized");
        Ok(())
    }
}
