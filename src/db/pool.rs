use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;

use crate::config::Config;
use crate::utils::error::AppResult;

pub async fn get_db_pool(config: &Config, database_url: &str) -> AppResult<Pool<Postgres>> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(1)
        .idle_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await?;

    if config.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!().run(&pool).await?;
    }

    Ok(pool)
}
