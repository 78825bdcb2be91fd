// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Per-connection pragmas. `busy_timeout` makes concurrent writers queue on
/// the database lock instead of failing immediately, which is what serializes
/// two simultaneous checkouts; foreign keys back the cascade deletes the data
/// model relies on.
#[derive(Debug)]
struct ConnectionPragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA busy_timeout = 5000; \
             PRAGMA foreign_keys = ON; \
             PRAGMA journal_mode = WAL; \
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Handle to the on-device store: a pooled SQLite database with migrations
/// applied. Constructed explicitly and passed into each component; there is
/// no process-global instance.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub fn open(config: &DatabaseConfig) -> StoreResult<Self> {
        Self::open_at(&config.path, config.max_connections)
    }

    pub fn open_at(path: &str, max_connections: u32) -> StoreResult<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(path);
        let pool = Pool::builder()
            .max_size(max_connections)
            .connection_customizer(Box::new(ConnectionPragmas))
            .build(manager)?;

        let db = Self { pool };
        db.initialize()?;
        info!(path, "store opened");
        Ok(db)
    }

    /// An isolated in-memory store, one connection wide so every caller sees
    /// the same database. Intended for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(":memory:");
        let pool = Pool::builder()
            .max_size(1)
            .connection_customizer(Box::new(ConnectionPragmas))
            .build(manager)?;

        let db = Self { pool };
        db.initialize()?;
        Ok(db)
    }

    fn initialize(&self) -> StoreResult<()> {
        let mut conn = self.conn()?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        info!("store migrations applied");
        Ok(())
    }

    /// Get a database connection from the pool
    pub fn conn(&self) -> StoreResult<DbConnection> {
        Ok(self.pool.get()?)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}
