use deadpool_redis::{Runtime, redis::AsyncCommands};
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{ENV, api::error};

pub async fn connect_database() -> Result<PgPool, error::SystemError> {
    let database_url = &ENV.database_url;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_slow_threshold(std::time::Duration::from_secs(3))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Key/value cache seam. The service layer only depends on this trait so
/// tests can swap in an in-memory map.
#[async_trait::async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, error::SystemError>;
    async fn set(&self, key: &str, value: &str, expiration: u64) -> Result<(), error::SystemError>;
    async fn delete(&self, key: &str) -> Result<(), error::SystemError>;
}

pub struct RedisCache {
    pool: deadpool_redis::Pool,
}

impl RedisCache {
    pub async fn new() -> Result<Self, error::SystemError> {
        let mut cfg = deadpool_redis::Config::from_url(&ENV.redis_url);
        cfg.pool = Some(deadpool_redis::PoolConfig { max_size: 16, ..Default::default() });
        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, error::SystemError> {
        let mut conn = self.pool.get().await?;

        let value: Option<String> = conn.get(key).await?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, expiration: u64) -> Result<(), error::SystemError> {
        let mut conn = self.pool.get().await?;

        conn.set_ex::<_, _, ()>(key, value, expiration).await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), error::SystemError> {
        let mut conn = self.pool.get().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}
