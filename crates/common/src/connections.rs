//! Backing store connections for the dispatch job.

use std::time::Duration;

use redis::aio::ConnectionManager;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Open the PostgreSQL pool described by `config`.
///
/// The job is sequential; `db_max_connections` defaults to a handful.
pub async fn connect_postgres(config: &AppConfig) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await?;

    tracing::info!(
        url = %redact_url(&config.database_url),
        max_connections = config.db_max_connections,
        "Connected to PostgreSQL"
    );
    Ok(pool)
}

/// Open the Redis connection used by the Redis campaign state backend.
pub async fn connect_redis(config: &AppConfig) -> AppResult<ConnectionManager> {
    let redis_url = config.redis_url.as_deref().ok_or_else(|| {
        AppError::Config("REDIS_URL is required when CAMPAIGN_STATE_BACKEND=redis".to_string())
    })?;
    let client = redis::Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;

    tracing::info!(url = %redact_url(redis_url), "Connected to Redis");
    Ok(manager)
}

/// Hide the password part of a connection URL for logging.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.rsplit_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{}://{}:***@{}", scheme, user, host)
        }
        None => url.to_string(),
    }
}
