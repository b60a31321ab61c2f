//! Campaign and session entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CampaignId, MapId, NpcId, SessionId};

/// A campaign: the unit of ownership and of sync single-flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    /// Raw AI-generated world lore, normalized only when compiled
    pub lore: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CampaignId::new(),
            name: name.into(),
            lore: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_lore(mut self, lore: serde_json::Value) -> Self {
        self.lore = Some(lore);
        self
    }
}

/// A play session within a campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub campaign_id: CampaignId,
    pub name: String,
    /// Scenario text, synced as its own journal entry
    pub scenario: Option<String>,
    /// The map whose scene this session plays on
    pub map_id: Option<MapId>,
    /// NPCs taking part, placed as tokens on the session's scene
    pub npc_ids: Vec<NpcId>,
}

impl Session {
    pub fn new(campaign_id: CampaignId, name: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            campaign_id,
            name: name.into(),
            scenario: None,
            map_id: None,
            npc_ids: Vec::new(),
        }
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }

    pub fn with_map(mut self, map_id: MapId) -> Self {
        self.map_id = Some(map_id);
        self
    }

    pub fn with_npc(mut self, npc_id: NpcId) -> Self {
        self.npc_ids.push(npc_id);
        self
    }
}
