//! Integration tests for the infrastructure components
//!
//! These tests verify that the PostgreSQL database and Redis counters
//! are properly configured and accessible. They need live services and are
//! ignored by default: `cargo test -- --ignored`.

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool},
};
use sqlx::Row;

#[tokio::test]
#[ignore = "requires running PostgreSQL and Redis"]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i32 = row.get("result");
    assert_eq!(result, 1, "PostgreSQL simple query test failed");

    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;

    assert!(
        redis_pool.health_check().await?,
        "Redis health check failed"
    );

    // A version counter starts at zero and only ever grows
    let key = "integration_test_version";
    redis_pool.delete(key).await?;
    let before = redis_pool.counter(key).await?;
    let after = redis_pool.incr(key).await?;
    assert_eq!(before, 0);
    assert_eq!(after, 1, "Redis INCR test failed");

    redis_pool.delete(key).await?;
    assert_eq!(redis_pool.counter(key).await?, 0, "Redis delete operation failed");

    Ok(())
}
