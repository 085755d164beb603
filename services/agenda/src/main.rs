use std::sync::Arc;

use agenda::{
    AgendaContext,
    collections::{MemoryVersions, RedisVersions, VersionStore},
    config::{AppConfig, StoreBackend, VersionBackend},
    middleware::TokenVerifier,
    notify::TracingNotifier,
    routes,
    state::AppState,
    store::{EntityStore, MemoryStore, PgStore},
};
use anyhow::Result;
use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool},
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting agenda service");

    let store: Arc<dyn EntityStore> = match config.store {
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = init_pool(&db_config).await?;

            if health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }

            let store = PgStore::new(pool);
            store.migrate().await?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let versions: Arc<dyn VersionStore> = match config.versions {
        VersionBackend::Memory => Arc::new(MemoryVersions::new()),
        VersionBackend::Redis => {
            let redis_config = RedisConfig::from_env()?;
            let redis_pool = RedisPool::new(&redis_config).await?;
            if !redis_pool.health_check().await? {
                anyhow::bail!("Failed to connect to Redis");
            }
            Arc::new(RedisVersions::new(redis_pool))
        }
    };

    let verifier = match config.jwt_public_key_pem()? {
        Some(pem) => Some(TokenVerifier::from_rsa_pem(&pem)?),
        None => {
            warn!("AGENDA__JWT_PUBLIC_KEY is not set; every request is anonymous");
            None
        }
    };

    let ctx = AgendaContext::new(store, Arc::new(TracingNotifier), versions);
    let app = routes::create_router(AppState::new(ctx, verifier));

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("Agenda service listening on {}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
