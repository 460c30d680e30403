use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::info;

use crate::config::{CoreConfig, Environment};
use crate::errors::Result;

/// Connection limits applied when opening the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PoolSettings {
    /// Live services get a wider pool in production; tooling and dev stay small.
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self {
                max_connections: 20,
                acquire_timeout: Duration::from_secs(10),
            },
            Environment::Staging => Self {
                max_connections: 10,
                acquire_timeout: Duration::from_secs(5),
            },
            Environment::Development => Self::default(),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Postgres pool shared by the timeline store and the host-table directory.
#[derive(Clone)]
pub struct DatabasePool {
    pool: Pool<Postgres>,
}

impl DatabasePool {
    pub async fn connect(config: &CoreConfig) -> Result<Self> {
        Self::connect_with(
            config.database_url(),
            PoolSettings::for_environment(config.environment),
        )
        .await
    }

    pub async fn connect_with(database_url: &str, settings: PoolSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(database_url)
            .await?;
        info!(
            max_connections = settings.max_connections,
            "database pool connected"
        );

        Ok(Self { pool })
    }

    /// Wraps a pool that was configured elsewhere.
    pub fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn inner(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

/// Implemented by components that own their schema migrations.
#[async_trait]
pub trait DatabaseMigrator {
    async fn run_migrations(&self, pool: &DatabasePool) -> Result<()>;
}
