//! Repository port - Campaign content and sync record persistence
//!
//! Entity `save_*` calls store content only. Sync state lives in the sync
//! record store, written exclusively by the sync orchestrator, and is joined
//! back onto `MapEntity::sync` / `NpcEntity::sync` when entities are loaded.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::{Campaign, MapEntity, NpcEntity, Session};
use crate::domain::value_objects::{CampaignId, MapId, NpcId, SessionId, SyncKey, SyncRecord};

#[async_trait]
pub trait CampaignRepositoryPort: Send + Sync {
    // Campaigns

    /// Insert or replace a campaign
    async fn save_campaign(&self, campaign: &Campaign) -> Result<()>;

    async fn get_campaign(&self, id: CampaignId) -> Result<Option<Campaign>>;

    /// All campaigns, oldest first
    async fn list_campaigns(&self) -> Result<Vec<Campaign>>;

    // Sessions

    async fn save_session(&self, session: &Session) -> Result<()>;

    async fn get_session(&self, id: SessionId) -> Result<Option<Session>>;

    /// Sessions of a campaign in creation order
    async fn list_sessions(&self, campaign_id: CampaignId) -> Result<Vec<Session>>;

    // Maps

    /// Insert or replace map content; `map.sync` is ignored
    async fn save_map(&self, map: &MapEntity) -> Result<()>;

    async fn get_map(&self, id: MapId) -> Result<Option<MapEntity>>;

    /// Maps of a campaign in creation order
    async fn list_maps(&self, campaign_id: CampaignId) -> Result<Vec<MapEntity>>;

    // NPCs

    /// Insert or replace NPC content; `npc.sync` is ignored
    async fn save_npc(&self, npc: &NpcEntity) -> Result<()>;

    async fn get_npc(&self, id: NpcId) -> Result<Option<NpcEntity>>;

    /// NPCs of a campaign in creation order
    async fn list_npcs(&self, campaign_id: CampaignId) -> Result<Vec<NpcEntity>>;

    // Sync records

    async fn get_sync_record(&self, key: &SyncKey) -> Result<Option<SyncRecord>>;

    /// Insert or replace the record for `record.key`
    async fn save_sync_record(&self, record: &SyncRecord) -> Result<()>;
}
