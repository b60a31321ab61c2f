//! Response DTOs for campaign content and sync badges

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Campaign, GridDimensions, MapEntity, MapSizeTier, NpcEntity, Session};
use crate::domain::value_objects::{SyncRecord, SyncStatus};

/// Sync badge shown next to every synced entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncBadgeDto {
    pub status: SyncStatus,
    pub external_id: Option<String>,
    pub last_synced_at: Option<String>,
    pub last_error: Option<String>,
}

impl From<&SyncRecord> for SyncBadgeDto {
    fn from(record: &SyncRecord) -> Self {
        Self {
            status: record.status,
            external_id: record.external_id.clone(),
            last_synced_at: record.last_synced_at.map(|t| t.to_rfc3339()),
            last_error: record.last_error.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignResponseDto {
    pub id: String,
    pub name: String,
    pub lore: Option<serde_json::Value>,
    pub created_at: String,
}

impl From<Campaign> for CampaignResponseDto {
    fn from(campaign: Campaign) -> Self {
        Self {
            id: campaign.id.to_string(),
            name: campaign.name,
            lore: campaign.lore,
            created_at: campaign.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponseDto {
    pub id: String,
    pub campaign_id: String,
    pub name: String,
    pub scenario: Option<String>,
    pub map_id: Option<String>,
    pub npc_ids: Vec<String>,
}

impl From<Session> for SessionResponseDto {
    fn from(session: Session) -> Self {
        Self {
            id: session.id.to_string(),
            campaign_id: session.campaign_id.to_string(),
            name: session.name,
            scenario: session.scenario,
            map_id: session.map_id.map(|id| id.to_string()),
            npc_ids: session.npc_ids.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapResponseDto {
    pub id: String,
    pub campaign_id: String,
    pub session_id: Option<String>,
    pub name: String,
    pub map_type: String,
    pub size_tier: MapSizeTier,
    pub grid_size: u32,
    pub dimensions: GridDimensions,
    pub sync: SyncBadgeDto,
}

impl From<MapEntity> for MapResponseDto {
    fn from(map: MapEntity) -> Self {
        Self {
            id: map.id.to_string(),
            campaign_id: map.campaign_id.to_string(),
            session_id: map.session_id.map(|id| id.to_string()),
            dimensions: map.grid_extent(),
            sync: SyncBadgeDto::from(&map.sync),
            name: map.name,
            map_type: map.map_type,
            size_tier: map.size_tier,
            grid_size: map.grid_size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcResponseDto {
    pub id: String,
    pub campaign_id: String,
    pub name: String,
    pub role: Option<String>,
    pub sync: SyncBadgeDto,
}

impl From<NpcEntity> for NpcResponseDto {
    fn from(npc: NpcEntity) -> Self {
        Self {
            id: npc.id.to_string(),
            campaign_id: npc.campaign_id.to_string(),
            sync: SyncBadgeDto::from(&npc.sync),
            name: npc.name,
            role: npc.role,
        }
    }
}

/// Badge of one named entity in a status listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityBadgeDto {
    pub id: String,
    pub name: String,
    pub sync: SyncBadgeDto,
}

/// Sync status of a whole campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSyncStatusDto {
    pub campaign_id: String,
    pub in_flight: bool,
    pub maps: Vec<EntityBadgeDto>,
    pub npcs: Vec<EntityBadgeDto>,
    /// `None` when the campaign has no lore
    pub lore: Option<SyncBadgeDto>,
}
