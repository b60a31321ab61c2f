//! NPC entity - An AI-generated character or monster awaiting export as a VTT actor

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CampaignId, NpcId, SyncKey, SyncRecord};

/// An NPC or monster with its raw AI stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcEntity {
    pub id: NpcId,
    pub campaign_id: CampaignId,
    pub name: String,
    /// Narrative role ("commoner", "villain", ...)
    pub role: Option<String>,
    pub personality: Option<String>,
    pub motivation: Option<String>,
    /// Raw AI stats: absent, ability scores, or a monster stat block
    pub stats: Option<serde_json::Value>,
    /// Path or URL of the token art
    pub token_image: Option<String>,
    pub disposition: Option<TokenDisposition>,
    pub vision: Option<VisionConfig>,
    pub sync: SyncRecord,
}

impl NpcEntity {
    pub fn new(campaign_id: CampaignId, name: impl Into<String>) -> Self {
        let id = NpcId::new();
        Self {
            id,
            campaign_id,
            name: name.into(),
            role: None,
            personality: None,
            motivation: None,
            stats: None,
            token_image: None,
            disposition: None,
            vision: None,
            sync: SyncRecord::never(SyncKey::actor(id)),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_stats(mut self, stats: serde_json::Value) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_personality(mut self, personality: impl Into<String>) -> Self {
        self.personality = Some(personality.into());
        self
    }

    pub fn with_motivation(mut self, motivation: impl Into<String>) -> Self {
        self.motivation = Some(motivation.into());
        self
    }

    pub fn with_token_image(mut self, path: impl Into<String>) -> Self {
        self.token_image = Some(path.into());
        self
    }

    pub fn sync_key(&self) -> SyncKey {
        SyncKey::actor(self.id)
    }
}

/// Token attitude toward the players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenDisposition {
    Hostile,
    #[default]
    Neutral,
    Friendly,
}

impl TokenDisposition {
    /// Numeric value used by the VTT token schema
    pub fn vtt_value(&self) -> i8 {
        match self {
            TokenDisposition::Hostile => -1,
            TokenDisposition::Neutral => 0,
            TokenDisposition::Friendly => 1,
        }
    }
}

/// Token vision override
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionConfig {
    pub range: u32,
    pub angle: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            range: 60,
            angle: 360,
        }
    }
}
