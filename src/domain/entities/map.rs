//! Map entity - An AI-generated battle map awaiting export as a VTT scene

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CampaignId, MapId, SessionId, SyncKey, SyncRecord};

/// Default grid square size in pixels
pub const DEFAULT_GRID_SIZE: u32 = 100;

/// Largest scene side in pixels the VTT is asked to render
pub const MAX_SCENE_PIXELS: u32 = 65_536;

/// A battle map with its raw AI details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapEntity {
    pub id: MapId,
    pub campaign_id: CampaignId,
    pub session_id: Option<SessionId>,
    pub name: String,
    /// Free-form type tag from generation ("dungeon", "tavern", ...)
    pub map_type: String,
    pub size_tier: MapSizeTier,
    /// Pixels per grid cell
    pub grid_size: u32,
    /// Explicit extent in cells; overrides the size tier
    pub dimensions: Option<GridDimensions>,
    /// Raw AI payload: rooms, points of interest, encounters, hazards, atmosphere
    pub details: serde_json::Value,
    pub sync: SyncRecord,
}

impl MapEntity {
    pub fn new(campaign_id: CampaignId, name: impl Into<String>, size_tier: MapSizeTier) -> Self {
        let id = MapId::new();
        Self {
            id,
            campaign_id,
            session_id: None,
            name: name.into(),
            map_type: "dungeon".to_string(),
            size_tier,
            grid_size: DEFAULT_GRID_SIZE,
            dimensions: None,
            details: serde_json::Value::Null,
            sync: SyncRecord::never(SyncKey::scene(id)),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_map_type(mut self, map_type: impl Into<String>) -> Self {
        self.map_type = map_type.into();
        self
    }

    pub fn with_grid_size(mut self, grid_size: u32) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_dimensions(mut self, columns: u32, rows: u32) -> Self {
        self.dimensions = Some(GridDimensions { columns, rows });
        self
    }

    pub fn sync_key(&self) -> SyncKey {
        SyncKey::scene(self.id)
    }

    /// Extent in cells, from explicit dimensions or the size tier
    pub fn grid_extent(&self) -> GridDimensions {
        self.dimensions.unwrap_or_else(|| {
            let units = self.size_tier.grid_units_per_side();
            GridDimensions {
                columns: units,
                rows: units,
            }
        })
    }

    /// Scene size in pixels, `None` when a side is empty or exceeds [`MAX_SCENE_PIXELS`]
    pub fn pixel_extent(&self) -> Option<(u32, u32)> {
        let extent = self.grid_extent();
        let side = |cells: u32| {
            cells
                .checked_mul(self.grid_size)
                .filter(|pixels| (1..=MAX_SCENE_PIXELS).contains(pixels))
        };
        Some((side(extent.columns)?, side(extent.rows)?))
    }
}

/// Map extent in grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub columns: u32,
    pub rows: u32,
}

/// Coarse map size chosen at generation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapSizeTier {
    Small,
    #[default]
    Medium,
    Large,
}

impl MapSizeTier {
    pub fn grid_units_per_side(&self) -> u32 {
        match self {
            MapSizeTier::Small => 20,
            MapSizeTier::Medium => 30,
            MapSizeTier::Large => 40,
        }
    }
}

impl std::str::FromStr for MapSizeTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" => Ok(MapSizeTier::Small),
            "medium" | "" => Ok(MapSizeTier::Medium),
            "large" => Ok(MapSizeTier::Large),
            _ => Err(anyhow::anyhow!("Invalid map size: {}", s)),
        }
    }
}
