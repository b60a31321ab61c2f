//! Domain entities - Campaign content with identity

mod campaign;
mod map;
mod npc;

pub use campaign::{Campaign, Session};
pub use map::{GridDimensions, MapEntity, MapSizeTier, DEFAULT_GRID_SIZE, MAX_SCENE_PIXELS};
pub use npc::{NpcEntity, TokenDisposition, VisionConfig};
