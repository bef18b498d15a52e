//! Shared fixtures for the in-crate tests.

use crate::db_migration::run_migrations;
use crate::domains::rotary_year::repository::{RotaryYearRepository, SqliteRotaryYearRepository};
use crate::domains::rotary_year::types::{NewRotaryYear, RotaryYear};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Fresh in-memory database without any schema. A single connection that is
/// never recycled keeps the database alive for the pool's lifetime.
pub async fn bare_memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap()
}

/// Fresh in-memory database with every migration applied
pub async fn memory_pool() -> SqlitePool {
    let pool = bare_memory_pool().await;
    run_migrations(&pool).await.unwrap();
    pool
}

/// Insert a rotary year row for `label`
pub async fn provision_year(pool: &SqlitePool, label: &str) -> RotaryYear {
    SqliteRotaryYearRepository::new(pool.clone())
        .create(&NewRotaryYear {
            label: label.to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
}
