//! Application services - Use case implementations
//!
//! `vtt` holds the pure translation layer (normalizer, compilers, token
//! placement). `campaign_service` ingests AI content and `sync_service`
//! reconciles it against the VTT.

pub mod campaign_service;
pub mod sync_lock;
pub mod sync_service;
pub mod vtt;

// Re-export campaign service types
pub use campaign_service::{
    CampaignService, CampaignServiceError, CampaignServiceImpl, CreateCampaignRequest,
    CreateMapRequest, CreateNpcRequest, CreateSessionRequest,
};

// Re-export sync service types
pub use sync_service::{SyncError, SyncService};
