//! Canonical shapes for AI-authored campaign content
//!
//! The AI service returns loosely-typed JSON. `ShapeNormalizer` resolves it
//! once into these types; compilers only ever see these.

use serde::{Deserialize, Serialize};

/// A field the AI may render either as bare text or as a named object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldValue {
    Text {
        value: String,
    },
    Structured {
        name: String,
        description: Option<String>,
    },
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text {
            value: value.into(),
        }
    }

    pub fn structured(name: impl Into<String>, description: Option<String>) -> Self {
        FieldValue::Structured {
            name: name.into(),
            description,
        }
    }

    /// All human-readable text of this value, for keyword scans
    pub fn searchable_text(&self) -> String {
        match self {
            FieldValue::Text { value } => value.clone(),
            FieldValue::Structured { name, description } => match description {
                Some(d) => format!("{} {}", name, d),
                None => name.clone(),
            },
        }
    }

    /// Short label, used for light and journal entry names
    pub fn label(&self) -> &str {
        match self {
            FieldValue::Text { value } => value,
            FieldValue::Structured { name, .. } => name,
        }
    }
}

/// World lore in canonical form. `None` means the AI supplied no such field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLore {
    pub world_description: Option<String>,
    pub history: Option<String>,
    pub factions: Option<Vec<FieldValue>>,
    pub locations: Option<Vec<FieldValue>>,
    pub hooks: Option<Vec<FieldValue>>,
}

/// Rectangle in grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RoomBounds {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn contains_block(&self, x: u32, y: u32, size: u32) -> bool {
        x >= self.x && y >= self.y && x + size <= self.right() && y + size <= self.bottom()
    }

    /// Center point in cell units (may be fractional)
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }
}

/// How a connection between two rooms is closed off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorKind {
    /// Open passage: no wall at all on the shared boundary
    Open,
    Door,
    Secret,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConnection {
    /// Target room, as named by the AI
    pub to: String,
    pub door: DoorKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRoom {
    pub name: String,
    pub description: Option<String>,
    pub bounds: Option<RoomBounds>,
    pub connections: Vec<RoomConnection>,
}

/// Grid cell coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub feature: FieldValue,
    pub room: Option<String>,
    pub position: Option<GridPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEncounter {
    pub name: String,
    pub room: Option<String>,
    pub enemies: Vec<String>,
    pub description: Option<String>,
    pub connections: Vec<RoomConnection>,
}

/// Map details in canonical form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMapDetails {
    pub description: Option<String>,
    pub rooms: Option<Vec<NormalizedRoom>>,
    pub points_of_interest: Option<Vec<PointOfInterest>>,
    pub encounters: Option<Vec<NormalizedEncounter>>,
    pub hazards: Option<Vec<FieldValue>>,
    pub atmosphere: Option<Vec<FieldValue>>,
}

/// Creature size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatureSize {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
    Gargantuan,
}

impl CreatureSize {
    /// Token footprint in grid cells per side
    pub fn footprint(&self) -> u32 {
        match self {
            CreatureSize::Tiny | CreatureSize::Small | CreatureSize::Medium => 1,
            CreatureSize::Large => 2,
            CreatureSize::Huge => 3,
            CreatureSize::Gargantuan => 4,
        }
    }

    /// Abbreviation used in the VTT actor schema
    pub fn vtt_code(&self) -> &'static str {
        match self {
            CreatureSize::Tiny => "tiny",
            CreatureSize::Small => "sm",
            CreatureSize::Medium => "med",
            CreatureSize::Large => "lg",
            CreatureSize::Huge => "huge",
            CreatureSize::Gargantuan => "grg",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tiny" | "t" => Some(CreatureSize::Tiny),
            "small" | "s" | "sm" => Some(CreatureSize::Small),
            "medium" | "m" | "med" => Some(CreatureSize::Medium),
            "large" | "l" | "lg" => Some(CreatureSize::Large),
            "huge" | "h" => Some(CreatureSize::Huge),
            "gargantuan" | "g" | "grg" => Some(CreatureSize::Gargantuan),
            _ => None,
        }
    }
}

/// Six ability scores; each may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: Option<i32>,
    pub dexterity: Option<i32>,
    pub constitution: Option<i32>,
    pub intelligence: Option<i32>,
    pub wisdom: Option<i32>,
    pub charisma: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterStatBlock {
    pub hit_points: i32,
    pub armor_class: Option<i32>,
    pub challenge_rating: Option<f64>,
    pub size: Option<CreatureSize>,
    pub abilities: Vec<FieldValue>,
    pub scores: AbilityScores,
}

/// NPC stats in canonical form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ActorStats {
    Abilities(AbilityScores),
    Monster(MonsterStatBlock),
}

impl ActorStats {
    pub fn size(&self) -> CreatureSize {
        match self {
            ActorStats::Abilities(_) => CreatureSize::Medium,
            ActorStats::Monster(block) => block.size.unwrap_or_default(),
        }
    }
}
