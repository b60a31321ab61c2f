//! Shape Normalizer - Resolves AI-authored JSON into canonical shapes
//!
//! The AI service names the same field several ways (`locations`,
//! `notable_locations`, ...) and renders union fields either as a bare string
//! or as an object. Every variant is resolved here, once, so compilers never
//! inspect raw JSON.
//!
//! Rules:
//! - each canonical field has a fixed precedence list of source names; the
//!   first *populated* candidate wins, an empty candidate is kept only when no
//!   populated one exists
//! - multi-part fields are joined with a blank line
//! - a missing field is `None`, never an empty default

use serde_json::{Map, Value};

use crate::application::services::vtt::{contains_words, words};
use crate::domain::value_objects::{
    AbilityScores, ActorStats, CreatureSize, DoorKind, FieldValue, GridPoint, MonsterStatBlock,
    NormalizedEncounter, NormalizedLore, NormalizedMapDetails, NormalizedRoom, PointOfInterest,
    RoomBounds, RoomConnection,
};

/// AI output that fits none of the known shapes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{context}: expected {expected}, found {found}")]
pub struct ValidationError {
    pub context: &'static str,
    pub expected: &'static str,
    pub found: &'static str,
}

impl ValidationError {
    fn new(context: &'static str, expected: &'static str, value: &Value) -> Self {
        Self {
            context,
            expected,
            found: json_type(value),
        }
    }
}

// Lore
const WORLD_DESCRIPTION: &[&str] = &[
    "worldDescription",
    "world_description",
    "description",
    "overview",
    "setting",
];
const WORLD_DESCRIPTION_CONTINUED: &[&str] =
    &["worldDescription2", "world_description_2", "world_description2"];
const HISTORY: &[&str] = &["history", "worldHistory", "world_history", "timeline", "backstory"];
const FACTIONS: &[&str] = &["factions", "organizations", "groups"];
const LOCATIONS: &[&str] = &[
    "locations",
    "notable_locations",
    "notableLocations",
    "key_locations",
    "keyLocations",
    "places",
];
const HOOKS: &[&str] = &[
    "hooks",
    "adventure_hooks",
    "adventureHooks",
    "plot_hooks",
    "plotHooks",
    "rumors",
];

// Shared object keys
const NAME_KEYS: &[&str] = &["name", "title", "label", "era", "period"];
const DESCRIPTION_KEYS: &[&str] = &["description", "summary", "details", "effect", "text", "hook"];

// Map details
const MAP_DESCRIPTION: &[&str] = &["description", "overview", "summary"];
const ROOMS: &[&str] = &["rooms", "areas", "chambers", "locations"];
const POINTS_OF_INTEREST: &[&str] = &[
    "pointsOfInterest",
    "points_of_interest",
    "features",
    "poi",
    "landmarks",
];
const ENCOUNTERS: &[&str] = &["encounters", "combatEncounters", "combat_encounters"];
const HAZARDS: &[&str] = &["hazards", "traps", "dangers"];
const ATMOSPHERE: &[&str] = &["atmosphere", "ambience", "ambiance", "mood", "lighting"];
const CONNECTIONS: &[&str] = &["connections", "exits", "doors", "connectsTo", "connects_to"];
const CONNECTION_TARGET: &[&str] = &["to", "room", "target", "destination", "name"];
const CONNECTION_KIND: &[&str] = &["type", "kind", "door"];
const ROOM_REF: &[&str] = &["room", "location", "area"];
const DOORWAY_WORDS: &[&str] = &[
    "door", "doors", "doorway", "secret", "hidden", "archway", "arch", "passage", "opening",
    "leads", "gate", "exit",
];
const ENEMIES: &[&str] = &["enemies", "monsters", "creatures", "foes"];

// NPC stats
const HIT_POINTS: &[&str] = &["hitPoints", "hit_points", "hp", "maxHp", "max_hp"];
const ARMOR_CLASS: &[&str] = &["armorClass", "armor_class", "ac"];
const CHALLENGE_RATING: &[&str] = &["challengeRating", "challenge_rating", "cr"];
const SPECIAL_ABILITIES: &[&str] = &[
    "specialAbilities",
    "special_abilities",
    "abilities",
    "traits",
    "features",
    "actions",
];
const SCORE_CONTAINERS: &[&str] = &["abilityScores", "ability_scores", "scores", "abilities", "stats"];
const NUMERIC_KEYS: &[&str] = &["value", "average", "max", "score", "flat"];

/// Stateless normalizer for every AI payload the engine ingests
pub struct ShapeNormalizer;

impl ShapeNormalizer {
    /// Normalize world lore. A bare string is taken as the world description.
    pub fn normalize_lore(raw: &Value) -> Result<NormalizedLore, ValidationError> {
        match raw {
            Value::Null => Ok(NormalizedLore::default()),
            Value::String(s) => Ok(NormalizedLore {
                world_description: Some(s.trim().to_string()),
                ..Default::default()
            }),
            Value::Object(obj) => Ok(NormalizedLore {
                world_description: joined_text(obj, &[WORLD_DESCRIPTION, WORLD_DESCRIPTION_CONTINUED]),
                history: pick(obj, HISTORY).and_then(text_of),
                factions: pick(obj, FACTIONS).map(list_of),
                locations: pick(obj, LOCATIONS).map(list_of),
                hooks: pick(obj, HOOKS).map(list_of),
            }),
            other => Err(ValidationError::new("lore", "object or string", other)),
        }
    }

    /// Normalize a map's `details` payload
    pub fn normalize_map_details(raw: &Value) -> Result<NormalizedMapDetails, ValidationError> {
        match raw {
            Value::Null => Ok(NormalizedMapDetails::default()),
            Value::String(s) => Ok(NormalizedMapDetails {
                description: Some(s.trim().to_string()),
                ..Default::default()
            }),
            Value::Object(obj) => {
                let mut details = NormalizedMapDetails {
                    description: pick(obj, MAP_DESCRIPTION).and_then(text_of),
                    rooms: pick(obj, ROOMS).map(rooms_of),
                    points_of_interest: pick(obj, POINTS_OF_INTEREST).map(points_of_interest_of),
                    encounters: pick(obj, ENCOUNTERS).map(encounters_of),
                    hazards: pick(obj, HAZARDS).map(list_of),
                    atmosphere: pick(obj, ATMOSPHERE).map(list_of),
                };
                add_described_connections(&mut details);
                Ok(details)
            }
            other => Err(ValidationError::new("map details", "object or string", other)),
        }
    }

    /// Normalize NPC stats. Hit points select the monster stat block shape.
    pub fn normalize_actor_stats(raw: Option<&Value>) -> Result<ActorStats, ValidationError> {
        let obj = match raw {
            None | Some(Value::Null) => return Ok(ActorStats::Abilities(AbilityScores::default())),
            // Prose-only stats ("uses commoner stats") carry no numbers
            Some(Value::String(_)) => return Ok(ActorStats::Abilities(AbilityScores::default())),
            Some(Value::Object(obj)) => obj,
            Some(other) => return Err(ValidationError::new("stats", "object", other)),
        };

        let scores = scores_of(obj);
        let Some(hp) = pick(obj, HIT_POINTS) else {
            return Ok(ActorStats::Abilities(scores));
        };
        let hit_points =
            int_of(hp).ok_or_else(|| ValidationError::new("stats.hitPoints", "number", hp))?;

        Ok(ActorStats::Monster(MonsterStatBlock {
            hit_points,
            armor_class: pick(obj, ARMOR_CLASS).and_then(int_of),
            challenge_rating: pick(obj, CHALLENGE_RATING).and_then(challenge_rating_of),
            size: lookup(obj, "size")
                .and_then(text_of)
                .and_then(|s| CreatureSize::parse(&s)),
            abilities: special_abilities_of(obj),
            scores,
        }))
    }
}

// =============================================================================
// Field lookup
// =============================================================================

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Exact key first, then a case-insensitive match
fn lookup<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).or_else(|| {
        obj.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        _ => true,
    }
}

/// First populated candidate; an empty candidate only if nothing is populated
fn pick<'a>(obj: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    let mut empty = None;
    for key in candidates {
        match lookup(obj, key) {
            Some(value) if is_populated(value) => return Some(value),
            Some(value) if !value.is_null() => {
                empty.get_or_insert(value);
            }
            _ => {}
        }
    }
    empty
}

fn has_any(obj: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().any(|k| lookup(obj, k).is_some_and(is_populated))
}

// =============================================================================
// Text and lists
// =============================================================================

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Prose rendering of any value; `None` only for null
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(text_of)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
        ),
        Value::Object(_) => Some(
            list_of(value)
                .iter()
                .map(|item| match item {
                    FieldValue::Text { value } => value.clone(),
                    FieldValue::Structured {
                        name,
                        description: Some(d),
                    } => format!("{}: {}", name, d),
                    FieldValue::Structured { name, .. } => name.clone(),
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
        ),
    }
}

/// Join multi-part text fields with a blank line
fn joined_text(obj: &Map<String, Value>, parts: &[&[&str]]) -> Option<String> {
    let found: Vec<String> = parts
        .iter()
        .filter_map(|candidates| pick(obj, candidates).and_then(text_of))
        .collect();
    if found.is_empty() {
        return None;
    }
    Some(
        found
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"),
    )
}

fn field_value_of(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Null | Value::Array(_) => None,
        Value::Object(obj) => {
            let name = pick(obj, NAME_KEYS).and_then(text_of).and_then(non_empty);
            let description = pick(obj, DESCRIPTION_KEYS)
                .and_then(text_of)
                .and_then(non_empty);
            match (name, description) {
                (Some(name), description) => Some(FieldValue::structured(name, description)),
                (None, Some(description)) => Some(FieldValue::text(description)),
                (None, None) => None,
            }
        }
        other => text_of(other).and_then(non_empty).map(FieldValue::text),
    }
}

/// A list field: bare string, array, single named object, or `{name: description}` map
fn list_of(value: &Value) -> Vec<FieldValue> {
    match value {
        Value::Array(items) => items
            .iter()
            .flat_map(|item| match item {
                Value::Array(_) => list_of(item),
                other => field_value_of(other).into_iter().collect(),
            })
            .collect(),
        Value::Object(obj) if has_any(obj, NAME_KEYS) || has_any(obj, DESCRIPTION_KEYS) => {
            field_value_of(value).into_iter().collect()
        }
        Value::Object(obj) => obj
            .iter()
            .map(|(name, v)| FieldValue::structured(name.clone(), text_of(v).and_then(non_empty)))
            .collect(),
        other => field_value_of(other).into_iter().collect(),
    }
}

// =============================================================================
// Numbers
// =============================================================================

/// Leading integer of a number, a decorated string ("27 (5d8+5)"), or `{value}`
fn int_of(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .and_then(|i| i32::try_from(i).ok()),
        Value::String(s) => {
            let trimmed = s.trim_start();
            let end = trimmed
                .char_indices()
                .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
                .map(|(i, _)| i)
                .unwrap_or(trimmed.len());
            trimmed[..end].parse().ok()
        }
        Value::Object(obj) => pick(obj, NUMERIC_KEYS).and_then(int_of),
        _ => None,
    }
}

fn cell_of(obj: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    pick(obj, keys)
        .and_then(int_of)
        .and_then(|i| u32::try_from(i).ok())
}

/// Challenge rating from `2`, `0.25`, `"1/4"` or `"CR 2 (450 XP)"`
fn challenge_rating_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let lowered = s.trim().to_lowercase();
            let token = lowered
                .trim_start_matches("cr")
                .split_whitespace()
                .next()?;
            match token.split_once('/') {
                Some((num, den)) => {
                    let num: f64 = num.parse().ok()?;
                    let den: f64 = den.parse().ok()?;
                    (den != 0.0).then(|| num / den)
                }
                None => token.parse().ok(),
            }
        }
        Value::Object(obj) => pick(obj, NUMERIC_KEYS).and_then(challenge_rating_of),
        _ => None,
    }
}

// =============================================================================
// Map details
// =============================================================================

fn door_kind_of(text: &str) -> DoorKind {
    let lowered = text.to_lowercase();
    if lowered.contains("secret") || lowered.contains("hidden") {
        DoorKind::Secret
    } else if ["open", "archway", "passage", "opening"]
        .iter()
        .any(|w| lowered.contains(w))
    {
        DoorKind::Open
    } else {
        DoorKind::Door
    }
}

fn connection_of(value: &Value) -> Option<RoomConnection> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(RoomConnection {
            to: s.trim().to_string(),
            door: door_kind_of(s),
        }),
        Value::Object(obj) => {
            let to = pick(obj, CONNECTION_TARGET)
                .and_then(text_of)
                .and_then(non_empty)?;
            let door = if lookup(obj, "secret").and_then(Value::as_bool) == Some(true) {
                DoorKind::Secret
            } else {
                match pick(obj, CONNECTION_KIND) {
                    Some(Value::Bool(false)) => DoorKind::Open,
                    Some(Value::String(kind)) => door_kind_of(kind),
                    _ => DoorKind::Door,
                }
            };
            Some(RoomConnection { to, door })
        }
        _ => None,
    }
}

fn connections_of(value: &Value) -> Vec<RoomConnection> {
    match value {
        Value::Array(items) => items.iter().filter_map(connection_of).collect(),
        other => connection_of(other).into_iter().collect(),
    }
}

fn bounds_of(obj: &Map<String, Value>) -> Option<RoomBounds> {
    let rect = lookup(obj, "bounds").and_then(Value::as_object).unwrap_or(obj);
    let position = lookup(rect, "position")
        .and_then(Value::as_object)
        .unwrap_or(rect);
    let size = lookup(rect, "size").and_then(Value::as_object).unwrap_or(rect);

    let x = cell_of(position, &["x", "left", "col"])?;
    let y = cell_of(position, &["y", "top", "row"])?;
    let width = cell_of(size, &["width", "w"])?;
    let height = cell_of(size, &["height", "h"])?;
    (width > 0 && height > 0).then(|| RoomBounds::new(x, y, width, height))
}

fn room_of(value: &Value, index: usize) -> Option<NormalizedRoom> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(NormalizedRoom {
            name: s.trim().to_string(),
            description: None,
            bounds: None,
            connections: Vec::new(),
        }),
        Value::Object(obj) => Some(NormalizedRoom {
            name: pick(obj, NAME_KEYS)
                .and_then(text_of)
                .and_then(non_empty)
                .unwrap_or_else(|| format!("Room {}", index + 1)),
            description: pick(obj, DESCRIPTION_KEYS).and_then(text_of),
            bounds: bounds_of(obj),
            connections: pick(obj, CONNECTIONS)
                .map(connections_of)
                .unwrap_or_default(),
        }),
        _ => None,
    }
}

fn rooms_of(value: &Value) -> Vec<NormalizedRoom> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| room_of(item, i))
            .collect(),
        Value::Object(obj) if has_any(obj, NAME_KEYS) => room_of(value, 0).into_iter().collect(),
        // `{ "Guard Room": {...} | "description" }`
        Value::Object(obj) => obj
            .iter()
            .enumerate()
            .filter_map(|(i, (name, body))| {
                let mut room = room_of(body, i).unwrap_or(NormalizedRoom {
                    name: String::new(),
                    description: None,
                    bounds: None,
                    connections: Vec::new(),
                });
                if body.is_string() {
                    room.description = text_of(body);
                }
                room.name = name.clone();
                Some(room)
            })
            .collect(),
        other => room_of(other, 0).into_iter().collect(),
    }
}

fn point_of_interest_of(value: &Value) -> Option<PointOfInterest> {
    let feature = field_value_of(value)?;
    let (room, position) = match value {
        Value::Object(obj) => {
            let room = pick(obj, ROOM_REF).and_then(text_of).and_then(non_empty);
            let position = match (cell_of(obj, &["x"]), cell_of(obj, &["y"])) {
                (Some(x), Some(y)) => Some(GridPoint { x, y }),
                _ => None,
            };
            (room, position)
        }
        _ => (None, None),
    };
    Some(PointOfInterest {
        feature,
        room,
        position,
    })
}

fn points_of_interest_of(value: &Value) -> Vec<PointOfInterest> {
    match value {
        Value::Array(items) => items.iter().filter_map(point_of_interest_of).collect(),
        Value::Object(obj) if !has_any(obj, NAME_KEYS) && !has_any(obj, DESCRIPTION_KEYS) => {
            list_of(value)
                .into_iter()
                .map(|feature| PointOfInterest {
                    feature,
                    room: None,
                    position: None,
                })
                .collect()
        }
        other => point_of_interest_of(other).into_iter().collect(),
    }
}

fn enemy_names_of(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(obj) => pick(obj, &["name", "type", "creature", "monster"])
                    .and_then(text_of)
                    .and_then(non_empty),
                other => text_of(other).and_then(non_empty),
            })
            .collect(),
        // `{ "Goblin": 3 }`
        Value::Object(obj) => obj.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

fn encounter_of(value: &Value, index: usize) -> Option<NormalizedEncounter> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(NormalizedEncounter {
            name: s.trim().to_string(),
            room: None,
            enemies: Vec::new(),
            description: None,
            connections: Vec::new(),
        }),
        Value::Object(obj) => Some(NormalizedEncounter {
            name: pick(obj, NAME_KEYS)
                .and_then(text_of)
                .and_then(non_empty)
                .unwrap_or_else(|| format!("Encounter {}", index + 1)),
            room: pick(obj, ROOM_REF).and_then(text_of).and_then(non_empty),
            enemies: pick(obj, ENEMIES).map(enemy_names_of).unwrap_or_default(),
            description: pick(obj, DESCRIPTION_KEYS).and_then(text_of),
            connections: pick(obj, CONNECTIONS)
                .map(connections_of)
                .unwrap_or_default(),
        }),
        _ => None,
    }
}

/// Connections written as prose: a sentence with doorway wording that names
/// another room. Rooms already connected by an earlier entry are skipped.
fn described_connections(
    description: &str,
    own_room: Option<&str>,
    room_names: &[(String, Vec<String>)],
    declared: &[RoomConnection],
) -> Vec<RoomConnection> {
    let own = own_room.map(words);
    let mut found: Vec<RoomConnection> = Vec::new();

    for sentence in description.split(['.', '!', '?', ';', '\n']) {
        let sentence_words = words(sentence);
        if !sentence_words
            .iter()
            .any(|w| DOORWAY_WORDS.contains(&w.as_str()))
        {
            continue;
        }
        for (name, name_words) in room_names {
            if own.as_ref() == Some(name_words) || !contains_words(&sentence_words, name_words) {
                continue;
            }
            let known = declared
                .iter()
                .chain(found.iter())
                .any(|c| words(&c.to) == *name_words);
            if !known {
                found.push(RoomConnection {
                    to: name.clone(),
                    door: door_kind_of(sentence),
                });
            }
        }
    }
    found
}

fn add_described_connections(details: &mut NormalizedMapDetails) {
    let room_names: Vec<(String, Vec<String>)> = details
        .rooms
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|room| (room.name.clone(), words(&room.name)))
        .filter(|(_, name_words)| !name_words.is_empty())
        .collect();
    if room_names.is_empty() {
        return;
    }

    for room in details.rooms.iter_mut().flatten() {
        if let Some(description) = &room.description {
            let described = described_connections(
                description,
                Some(room.name.as_str()),
                &room_names,
                &room.connections,
            );
            room.connections.extend(described);
        }
    }
    for encounter in details.encounters.iter_mut().flatten() {
        if let Some(description) = &encounter.description {
            let described = described_connections(
                description,
                encounter.room.as_deref(),
                &room_names,
                &encounter.connections,
            );
            encounter.connections.extend(described);
        }
    }
}

fn encounters_of(value: &Value) -> Vec<NormalizedEncounter> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| encounter_of(item, i))
            .collect(),
        other => encounter_of(other, 0).into_iter().collect(),
    }
}

// =============================================================================
// NPC stats
// =============================================================================

fn scores_of(obj: &Map<String, Value>) -> AbilityScores {
    let container = SCORE_CONTAINERS
        .iter()
        .filter_map(|key| lookup(obj, key).and_then(Value::as_object))
        .find(|o| !o.is_empty())
        .unwrap_or(obj);
    let score = |keys: &[&str]| pick(container, keys).and_then(int_of);

    AbilityScores {
        strength: score(&["strength", "str"]),
        dexterity: score(&["dexterity", "dex"]),
        constitution: score(&["constitution", "con"]),
        intelligence: score(&["intelligence", "int"]),
        wisdom: score(&["wisdom", "wis"]),
        charisma: score(&["charisma", "cha"]),
    }
}

fn special_abilities_of(obj: &Map<String, Value>) -> Vec<FieldValue> {
    SPECIAL_ABILITIES
        .iter()
        .filter_map(|key| lookup(obj, key))
        .find(|v| (v.is_array() || v.is_string()) && is_populated(v))
        .map(list_of)
        .unwrap_or_default()
}
