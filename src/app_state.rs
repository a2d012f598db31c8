use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::db::memory::MemoryRepository;
use crate::db::pool::get_db_pool;
use crate::db::postgres::PgRepository;
use crate::db::repository::Repository;
use crate::services::RequestService;
use crate::utils::error::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub requests: RequestService,
}

impl AppState {
    pub fn new(config: Config, repo: Arc<dyn Repository>) -> Self {
        Self {
            config: Arc::new(config),
            requests: RequestService::new(repo),
        }
    }

    /// Build state for the configured storage backend.
    pub async fn from_config(config: Config) -> AppResult<Self> {
        let repo: Arc<dyn Repository> = match config.storage_backend {
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .clone()
                    .ok_or_else(|| AppError::internal("DATABASE_URL must be set"))?;
                Arc::new(PgRepository::new(get_db_pool(&config, &url).await?))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on shutdown");
                Arc::new(MemoryRepository::new())
            }
        };
        Ok(Self::new(config, repo))
    }
}
