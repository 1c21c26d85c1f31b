//! Application state - shared across all handlers.

use std::sync::Arc;

use blogicum_core::ports::UserRepository;
use blogicum_core::{BlogService, Repositories};
use blogicum_infra::{DatabaseConfig, InMemoryStore};

#[cfg(feature = "postgres")]
use blogicum_infra::BlogDatabase;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: Arc<BlogService>,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    /// Build the state on PostgreSQL when configured and reachable,
    /// otherwise on the in-memory store.
    pub async fn new(db_config: Option<&DatabaseConfig>) -> Self {
        #[cfg(feature = "postgres")]
        let repos = match db_config {
            Some(config) => match BlogDatabase::init(config).await {
                Ok(database) => database.repositories(),
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    InMemoryStore::new().repositories()
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                InMemoryStore::new().repositories()
            }
        };

        #[cfg(not(feature = "postgres"))]
        let repos = {
            if db_config.is_some() {
                tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
            }
            tracing::info!("Running without postgres feature - using in-memory repositories");
            InMemoryStore::new().repositories()
        };

        tracing::info!("Application state initialized");
        Self::from_repositories(repos)
    }

    pub fn from_repositories(repos: Repositories) -> Self {
        Self {
            users: repos.users.clone(),
            blog: Arc::new(BlogService::new(repos)),
        }
    }
}
