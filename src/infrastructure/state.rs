//! Shared application state

use std::sync::Arc;

use anyhow::Result;

use crate::application::ports::outbound::{CampaignRepositoryPort, VttPort};
use crate::application::services::{CampaignServiceImpl, SyncService};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::persistence::create_repository;
use crate::infrastructure::vtt_client::VttClient;

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub repository: Arc<dyn CampaignRepositoryPort>,
    pub vtt: Arc<dyn VttPort>,
    // Application services
    pub campaign_service: CampaignServiceImpl,
    pub sync_service: SyncService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let repository = create_repository(&config.persistence).await?;
        let vtt: Arc<dyn VttPort> = Arc::new(VttClient::new(&config.vtt)?);
        Ok(Self::from_parts(config, repository, vtt))
    }

    /// Wire services over already-built adapters
    pub fn from_parts(
        config: AppConfig,
        repository: Arc<dyn CampaignRepositoryPort>,
        vtt: Arc<dyn VttPort>,
    ) -> Self {
        let campaign_service = CampaignServiceImpl::new(repository.clone());
        let sync_service = SyncService::new(repository.clone(), vtt.clone(), config.sync.clone());

        Self {
            config,
            repository,
            vtt,
            campaign_service,
            sync_service,
        }
    }
}
