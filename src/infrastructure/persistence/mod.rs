//! Persistence adapters for campaign content and sync records
//!
//! Two backends implement `CampaignRepositoryPort`: an in-memory store and
//! SQLite. The backend is chosen from configuration at startup.

mod memory_repository;
mod sqlite_repository;

pub use memory_repository::InMemoryCampaignRepository;
pub use sqlite_repository::SqliteCampaignRepository;

use std::sync::Arc;

use anyhow::Result;

use crate::application::ports::outbound::CampaignRepositoryPort;
use crate::infrastructure::config::{PersistenceBackend, PersistenceConfig};

/// Create the repository selected by `config.backend`
pub async fn create_repository(config: &PersistenceConfig) -> Result<Arc<dyn CampaignRepositoryPort>> {
    match config.backend {
        PersistenceBackend::Memory => {
            tracing::info!("Using in-memory campaign repository");
            Ok(Arc::new(InMemoryCampaignRepository::new()))
        }
        PersistenceBackend::Sqlite => {
            let repository = SqliteCampaignRepository::connect(&config.sqlite_path).await?;
            Ok(Arc::new(repository))
        }
    }
}
