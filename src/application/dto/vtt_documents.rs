//! VTT wire documents
//!
//! These mirror the VTT's native document schemas field for field. The scene
//! document produced for API sync is the same value served as the scene
//! export file, so nothing outside the native schema may serialize here.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::RoomBounds;

/// Square grid
pub const GRID_TYPE_SQUARE: u8 = 1;

/// Wall sense/movement restriction for a blocking wall
pub const WALL_SENSE_NORMAL: u8 = 20;

/// Wall door classification
pub const DOOR_NONE: u8 = 0;
pub const DOOR_NORMAL: u8 = 1;
pub const DOOR_SECRET: u8 = 2;

// =============================================================================
// Scene
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub grid: GridConfig,
    pub walls: Vec<WallDocument>,
    pub lights: Vec<LightDocument>,
    /// Room geometry kept for token placement; never sent to the VTT
    #[serde(skip)]
    pub layout: SceneLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(rename = "type")]
    pub grid_type: u8,
    pub size: u32,
    pub color: String,
    pub alpha: f64,
}

impl GridConfig {
    pub fn square(size: u32) -> Self {
        Self {
            grid_type: GRID_TYPE_SQUARE,
            size,
            color: "#000000".to_string(),
            alpha: 0.2,
        }
    }
}

/// A wall line in pixel space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallDocument {
    /// `[x1, y1, x2, y2]`
    pub c: [u32; 4],
    #[serde(rename = "move")]
    pub movement: u8,
    pub sight: u8,
    pub sound: u8,
    pub door: u8,
    /// Door state (0 = closed)
    pub ds: u8,
}

impl WallDocument {
    pub fn solid(c: [u32; 4]) -> Self {
        Self {
            c,
            movement: WALL_SENSE_NORMAL,
            sight: WALL_SENSE_NORMAL,
            sound: WALL_SENSE_NORMAL,
            door: DOOR_NONE,
            ds: 0,
        }
    }

    pub fn door(c: [u32; 4], door: u8) -> Self {
        Self {
            door,
            ..Self::solid(c)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightDocument {
    pub x: u32,
    pub y: u32,
    pub rotation: u32,
    pub walls: bool,
    pub config: LightConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    pub bright: f64,
    pub dim: f64,
    pub angle: u32,
    pub color: String,
    pub alpha: f64,
    pub animation: LightAnimation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightAnimation {
    #[serde(rename = "type")]
    pub animation_type: Option<String>,
    pub speed: u8,
    pub intensity: u8,
}

/// Room geometry of a compiled scene, in grid cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneLayout {
    pub columns: u32,
    pub rows: u32,
    pub rooms: Vec<SceneRoom>,
    pub encounters: Vec<SceneEncounter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneRoom {
    pub name: String,
    pub bounds: RoomBounds,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneEncounter {
    pub name: String,
    /// Index into `SceneLayout::rooms`
    pub room: Option<usize>,
    pub enemies: Vec<String>,
}

// =============================================================================
// Actor
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub actor_type: String,
    pub img: Option<String>,
    pub system: ActorSystem,
    pub items: Vec<ActorItem>,
    #[serde(rename = "prototypeToken")]
    pub prototype_token: PrototypeToken,
}

/// Actor system data; the variant decides which schema the VTT receives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActorSystem {
    Monster(MonsterSystem),
    Abilities(AbilitySystem),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilitySystem {
    pub abilities: AbilityBlock,
    pub details: ActorDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterSystem {
    pub abilities: AbilityBlock,
    pub attributes: MonsterAttributes,
    pub details: ActorDetails,
    pub traits: ActorTraits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityValue {
    pub value: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityBlock {
    pub str: AbilityValue,
    pub dex: AbilityValue,
    pub con: AbilityValue,
    pub int: AbilityValue,
    pub wis: AbilityValue,
    pub cha: AbilityValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorDetails {
    pub biography: HtmlValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtmlValue {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterAttributes {
    pub hp: HitPoints,
    pub ac: ArmorClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub value: i32,
    pub max: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorClass {
    pub flat: i32,
    pub calc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorTraits {
    pub size: String,
}

/// Embedded item; special abilities become `feat` items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorItem {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub system: ItemSystem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSystem {
    pub description: HtmlValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrototypeToken {
    pub name: String,
    #[serde(rename = "actorLink")]
    pub actor_link: bool,
    pub disposition: i8,
    pub width: u32,
    pub height: u32,
    pub texture: TokenTexture,
    pub sight: TokenSight,
    pub bar1: TokenBar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenTexture {
    pub src: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSight {
    pub enabled: bool,
    pub range: u32,
    pub angle: u32,
    #[serde(rename = "visionMode")]
    pub vision_mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBar {
    pub attribute: Option<String>,
}

// =============================================================================
// Journal
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalDocument {
    pub name: String,
    pub pages: Vec<JournalPage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalPage {
    pub name: String,
    #[serde(rename = "type")]
    pub page_type: String,
    pub text: PageText,
}

/// Page body; format 1 is HTML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    pub content: String,
    pub format: u8,
}

impl JournalPage {
    pub fn html(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            page_type: "text".to_string(),
            text: PageText {
                content: content.into(),
                format: 1,
            },
        }
    }
}

// =============================================================================
// Token
// =============================================================================

/// A placed actor on a scene, in pixel coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDocument {
    pub name: String,
    #[serde(rename = "actorId")]
    pub actor_id: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub disposition: i8,
    pub hidden: bool,
    pub texture: TokenTexture,
}
