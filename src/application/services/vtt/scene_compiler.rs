//! Scene Compiler - MapEntity to VTT scene document
//!
//! Rooms are axis-aligned rectangles in grid cells. Each room contributes its
//! four edges as walls (top, right, bottom, left). Where two connected rooms
//! share a boundary, the overlap is cut out of both rooms' edges and replaced
//! with one door segment, or with nothing for an open passage.

use std::collections::HashSet;

use crate::application::dto::{
    GridConfig, LightAnimation, LightConfig, LightDocument, SceneDocument, SceneEncounter,
    SceneLayout, SceneRoom, WallDocument, DOOR_NORMAL, DOOR_SECRET,
};
use crate::application::services::vtt::{ShapeNormalizer, ValidationError};
use crate::domain::entities::{GridDimensions, MapEntity};
use crate::domain::value_objects::{
    DoorKind, FieldValue, NormalizedMapDetails, NormalizedRoom, PointOfInterest, RoomBounds,
    RoomConnection,
};

/// Side length of an auto-laid-out room, in cells
const AUTO_ROOM_SIZE: u32 = 6;
/// First cell of the auto-layout row
const AUTO_ORIGIN: u32 = 1;

/// Light presets selected by keyword; first match wins
const LIGHT_CUES: &[(&str, LightPreset)] = &[
    ("candle", LightPreset::Candle),
    ("bonfire", LightPreset::Bonfire),
    ("campfire", LightPreset::Bonfire),
    ("hearth", LightPreset::Bonfire),
    ("glow", LightPreset::Glow),
    ("luminous", LightPreset::Glow),
    ("torch", LightPreset::Torch),
    ("brazier", LightPreset::Torch),
    ("lantern", LightPreset::Torch),
    ("lamp", LightPreset::Torch),
    ("sconce", LightPreset::Torch),
    ("fire", LightPreset::Bonfire),
    ("light", LightPreset::Torch),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LightPreset {
    Torch,
    Candle,
    Bonfire,
    Glow,
}

impl LightPreset {
    fn config(&self) -> LightConfig {
        let (bright, dim, color, animation) = match self {
            LightPreset::Torch => (20.0, 40.0, "#ff9329", "torch"),
            LightPreset::Candle => (5.0, 10.0, "#ffb347", "torch"),
            LightPreset::Bonfire => (30.0, 60.0, "#ff6a00", "fire"),
            LightPreset::Glow => (10.0, 20.0, "#7fb3ff", "pulse"),
        };
        LightConfig {
            bright,
            dim,
            angle: 360,
            color: color.to_string(),
            alpha: 0.5,
            animation: LightAnimation {
                animation_type: Some(animation.to_string()),
                speed: 5,
                intensity: 5,
            },
        }
    }

    fn for_text(text: &str) -> Option<Self> {
        let lowered = text.to_lowercase();
        LIGHT_CUES
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword))
            .map(|(_, preset)| *preset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    Horizontal(u32),
    Vertical(u32),
}

/// A shared boundary between two connected rooms
#[derive(Debug, Clone, Copy)]
struct Opening {
    line: Line,
    from: u32,
    to: u32,
    rooms: (usize, usize),
    door: DoorKind,
}

struct PlacedRoom<'a> {
    room: &'a NormalizedRoom,
    bounds: RoomBounds,
    key: String,
}

pub struct SceneCompiler;

impl SceneCompiler {
    /// Compile a map into the VTT's native scene document
    pub fn compile(map: &MapEntity) -> Result<SceneDocument, ValidationError> {
        let (width, height) = map.pixel_extent().ok_or(ValidationError {
            context: "map dimensions",
            expected: "between 1 and 65536 pixels per side",
            found: "a larger scene",
        })?;
        let details = ShapeNormalizer::normalize_map_details(&map.details)?;
        let extent = map.grid_extent();
        let grid = map.grid_size;

        let rooms = place_rooms(details.rooms.as_deref().unwrap_or_default(), extent);
        let walls = if rooms.is_empty() {
            boundary_walls(width, height)
        } else {
            room_walls(&rooms, &openings(&rooms, &details), grid)
        };
        let lights = lights(&details, &rooms, extent, grid);

        let encounters = details
            .encounters
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|encounter| SceneEncounter {
                name: encounter.name.clone(),
                room: encounter
                    .room
                    .as_deref()
                    .and_then(|name| find_room(&rooms, name, None)),
                enemies: encounter.enemies.clone(),
            })
            .collect();

        Ok(SceneDocument {
            name: map.name.clone(),
            width,
            height,
            grid: GridConfig::square(grid),
            walls,
            lights,
            layout: SceneLayout {
                columns: extent.columns,
                rows: extent.rows,
                rooms: rooms
                    .iter()
                    .map(|placed| SceneRoom {
                        name: placed.room.name.clone(),
                        bounds: placed.bounds,
                    })
                    .collect(),
                encounters,
            },
        })
    }
}

// =============================================================================
// Rooms
// =============================================================================

fn clamp_bounds(bounds: RoomBounds, extent: GridDimensions) -> Option<RoomBounds> {
    if bounds.x >= extent.columns || bounds.y >= extent.rows {
        return None;
    }
    let width = bounds.width.min(extent.columns - bounds.x);
    let height = bounds.height.min(extent.rows - bounds.y);
    (width > 0 && height > 0).then(|| RoomBounds::new(bounds.x, bounds.y, width, height))
}

fn next_auto_bounds(cursor: &mut (u32, u32), extent: GridDimensions) -> Option<RoomBounds> {
    if cursor.0 + AUTO_ROOM_SIZE > extent.columns {
        *cursor = (AUTO_ORIGIN, cursor.1 + AUTO_ROOM_SIZE);
    }
    if cursor.0 + AUTO_ROOM_SIZE > extent.columns || cursor.1 + AUTO_ROOM_SIZE > extent.rows {
        return None;
    }
    let bounds = RoomBounds::new(cursor.0, cursor.1, AUTO_ROOM_SIZE, AUTO_ROOM_SIZE);
    cursor.0 += AUTO_ROOM_SIZE;
    Some(bounds)
}

/// Rooms that do not fit on the map are dropped
fn place_rooms(rooms: &[NormalizedRoom], extent: GridDimensions) -> Vec<PlacedRoom<'_>> {
    let mut cursor = (AUTO_ORIGIN, AUTO_ORIGIN);
    rooms
        .iter()
        .filter_map(|room| {
            let bounds = match room.bounds {
                Some(bounds) => clamp_bounds(bounds, extent)?,
                None => next_auto_bounds(&mut cursor, extent)?,
            };
            Some(PlacedRoom {
                room,
                bounds,
                key: room.name.trim().to_lowercase(),
            })
        })
        .collect()
}

/// Exact case-insensitive name first, then containment either way
fn find_room(rooms: &[PlacedRoom<'_>], name: &str, exclude: Option<usize>) -> Option<usize> {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    let eligible = |i: usize, room: &PlacedRoom<'_>| Some(i) != exclude && !room.key.is_empty();
    rooms
        .iter()
        .enumerate()
        .find(|(i, room)| eligible(*i, room) && room.key == wanted)
        .or_else(|| {
            rooms.iter().enumerate().find(|(i, room)| {
                eligible(*i, room)
                    && (wanted.contains(room.key.as_str()) || room.key.contains(wanted.as_str()))
            })
        })
        .map(|(i, _)| i)
}

// =============================================================================
// Walls
// =============================================================================

fn shared_boundary(a: &RoomBounds, b: &RoomBounds) -> Option<(Line, u32, u32)> {
    let overlap = |lo1: u32, hi1: u32, lo2: u32, hi2: u32| {
        let lo = lo1.max(lo2);
        let hi = hi1.min(hi2);
        (lo < hi).then_some((lo, hi))
    };

    let vertical = if a.right() == b.x {
        Some(b.x)
    } else if b.right() == a.x {
        Some(a.x)
    } else {
        None
    };
    if let Some(x) = vertical {
        if let Some((lo, hi)) = overlap(a.y, a.bottom(), b.y, b.bottom()) {
            return Some((Line::Vertical(x), lo, hi));
        }
    }

    let horizontal = if a.bottom() == b.y {
        Some(b.y)
    } else if b.bottom() == a.y {
        Some(a.y)
    } else {
        None
    };
    let y = horizontal?;
    overlap(a.x, a.right(), b.x, b.right()).map(|(lo, hi)| (Line::Horizontal(y), lo, hi))
}

/// Openings between connected rooms, in connection order. A pair is opened once.
fn openings(rooms: &[PlacedRoom<'_>], details: &NormalizedMapDetails) -> Vec<Opening> {
    let mut declared: Vec<(usize, &RoomConnection)> = rooms
        .iter()
        .enumerate()
        .flat_map(|(i, placed)| placed.room.connections.iter().map(move |c| (i, c)))
        .collect();

    // Encounter connections attach to the encounter's room
    for encounter in details.encounters.as_deref().unwrap_or_default() {
        let Some(room) = encounter
            .room
            .as_deref()
            .and_then(|name| find_room(rooms, name, None))
        else {
            continue;
        };
        declared.extend(encounter.connections.iter().map(|c| (room, c)));
    }

    let mut seen = HashSet::new();
    declared
        .into_iter()
        .filter_map(|(from, connection)| {
            let to = find_room(rooms, &connection.to, Some(from))?;
            let pair = (from.min(to), from.max(to));
            if !seen.insert(pair) {
                return None;
            }
            let (line, lo, hi) = shared_boundary(&rooms[from].bounds, &rooms[to].bounds)?;
            Some(Opening {
                line,
                from: lo,
                to: hi,
                rooms: pair,
                door: connection.door,
            })
        })
        .collect()
}

fn segment(line: Line, from: u32, to: u32, grid: u32) -> [u32; 4] {
    match line {
        Line::Horizontal(y) => [from * grid, y * grid, to * grid, y * grid],
        Line::Vertical(x) => [x * grid, from * grid, x * grid, to * grid],
    }
}

/// `[from, to)` minus the given cuts, in ascending order
fn subtract(from: u32, to: u32, mut cuts: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    cuts.sort_unstable();
    let mut pieces = Vec::new();
    let mut cursor = from;
    for (lo, hi) in cuts {
        if hi <= cursor {
            continue;
        }
        if lo > cursor {
            pieces.push((cursor, lo.min(to)));
        }
        cursor = cursor.max(hi);
        if cursor >= to {
            break;
        }
    }
    if cursor < to {
        pieces.push((cursor, to));
    }
    pieces
}

fn room_walls(rooms: &[PlacedRoom<'_>], openings: &[Opening], grid: u32) -> Vec<WallDocument> {
    let mut walls = Vec::new();

    for (index, placed) in rooms.iter().enumerate() {
        let b = placed.bounds;
        let edges = [
            (Line::Horizontal(b.y), b.x, b.right()),
            (Line::Vertical(b.right()), b.y, b.bottom()),
            (Line::Horizontal(b.bottom()), b.x, b.right()),
            (Line::Vertical(b.x), b.y, b.bottom()),
        ];
        for (line, from, to) in edges {
            let cuts = openings
                .iter()
                .filter(|o| o.line == line && (o.rooms.0 == index || o.rooms.1 == index))
                .map(|o| (o.from, o.to))
                .collect();
            walls.extend(
                subtract(from, to, cuts)
                    .into_iter()
                    .map(|(lo, hi)| WallDocument::solid(segment(line, lo, hi, grid))),
            );
        }
    }

    walls.extend(openings.iter().filter_map(|o| {
        let door = match o.door {
            DoorKind::Open => return None,
            DoorKind::Door => DOOR_NORMAL,
            DoorKind::Secret => DOOR_SECRET,
        };
        Some(WallDocument::door(segment(o.line, o.from, o.to, grid), door))
    }));

    walls
}

fn boundary_walls(w: u32, h: u32) -> Vec<WallDocument> {
    [[0, 0, w, 0], [w, 0, w, h], [0, h, w, h], [0, 0, 0, h]]
        .into_iter()
        .map(WallDocument::solid)
        .collect()
}

// =============================================================================
// Lights
// =============================================================================

fn light_at(x: f64, y: f64, preset: LightPreset) -> LightDocument {
    LightDocument {
        x: x.round() as u32,
        y: y.round() as u32,
        rotation: 0,
        walls: true,
        config: preset.config(),
    }
}

fn lights(
    details: &NormalizedMapDetails,
    rooms: &[PlacedRoom<'_>],
    extent: GridDimensions,
    grid: u32,
) -> Vec<LightDocument> {
    let g = grid as f64;
    let centroid = (extent.columns as f64 * g / 2.0, extent.rows as f64 * g / 2.0);

    let atmosphere = details
        .atmosphere
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|item: &FieldValue| {
            let preset = LightPreset::for_text(&item.searchable_text())?;
            Some(light_at(centroid.0, centroid.1, preset))
        });

    let features = details
        .points_of_interest
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|poi: &PointOfInterest| {
            let preset = LightPreset::for_text(&poi.feature.searchable_text())?;
            let (x, y) = match (poi.position, poi.room.as_deref()) {
                (Some(cell), _) => (
                    (cell.x.min(extent.columns.saturating_sub(1)) as f64 + 0.5) * g,
                    (cell.y.min(extent.rows.saturating_sub(1)) as f64 + 0.5) * g,
                ),
                (None, Some(name)) => match find_room(rooms, name, None) {
                    Some(i) => {
                        let (cx, cy) = rooms[i].bounds.center();
                        (cx * g, cy * g)
                    }
                    None => centroid,
                },
                (None, None) => centroid,
            };
            Some(light_at(x, y, preset))
        });

    let mut lights: Vec<LightDocument> = atmosphere.chain(features).collect();
    if lights.is_empty() {
        lights.push(light_at(centroid.0, centroid.1, LightPreset::Torch));
    }
    lights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MapSizeTier;
    use crate::domain::value_objects::CampaignId;
    use serde_json::json;

    fn map(details: serde_json::Value) -> MapEntity {
        MapEntity::new(CampaignId::new(), "Goblin Warren", MapSizeTier::Small).with_details(details)
    }

    fn doors(scene: &SceneDocument) -> Vec<&WallDocument> {
        scene.walls.iter().filter(|w| w.door != 0).collect()
    }

    #[test]
    fn test_two_connected_rooms_share_one_door() {
        let scene = SceneCompiler::compile(&map(json!({
            "rooms": [
                {"name": "Hall", "x": 0, "y": 0, "width": 4, "height": 4, "connections": ["Kitchen"]},
                {"name": "Kitchen", "x": 4, "y": 0, "width": 4, "height": 4}
            ]
        })))
        .unwrap();

        assert_eq!(scene.walls.len(), 7);
        let doors = doors(&scene);
        assert_eq!(doors.len(), 1);
        assert_eq!(doors[0].door, DOOR_NORMAL);
        assert_eq!(doors[0].c, [400, 0, 400, 400]);
        // Door segments follow the room walls
        assert_eq!(scene.walls.last().unwrap().door, DOOR_NORMAL);
    }

    #[test]
    fn test_doorway_described_in_prose_becomes_a_door() {
        let scene = SceneCompiler::compile(&map(json!({
            "rooms": [
                {"name": "Hall", "x": 0, "y": 0, "width": 4, "height": 4,
                 "description": "A wooden door leads to the Kitchen."},
                {"name": "Kitchen", "x": 4, "y": 0, "width": 4, "height": 4}
            ]
        })))
        .unwrap();
        assert_eq!(scene.walls.len(), 7);
        let doors = doors(&scene);
        assert_eq!(doors.len(), 1);
        assert_eq!(doors[0].c, [400, 0, 400, 400]);
        assert_eq!(doors[0].door, DOOR_NORMAL);
    }

    #[test]
    fn test_unconnected_shared_boundary_keeps_both_walls() {
        let scene = SceneCompiler::compile(&map(json!({
            "rooms": [
                {"name": "Hall", "x": 0, "y": 0, "width": 4, "height": 4},
                {"name": "Kitchen", "x": 4, "y": 0, "width": 4, "height": 4}
            ]
        })))
        .unwrap();
        assert_eq!(scene.walls.len(), 8);
        assert!(doors(&scene).is_empty());
    }

    #[test]
    fn test_partial_overlap_splits_edges() {
        let scene = SceneCompiler::compile(&map(json!({
            "rooms": [
                {"name": "Hall", "x": 0, "y": 0, "width": 6, "height": 2,
                 "connections": [{"to": "Vault", "type": "secret door"}]},
                {"name": "Vault", "x": 2, "y": 2, "width": 2, "height": 2}
            ]
        })))
        .unwrap();

        // Hall bottom splits into two pieces; vault top is fully cut
        assert_eq!(scene.walls.len(), 4 + 1 + 3 + 1);
        let doors = doors(&scene);
        assert_eq!(doors.len(), 1);
        assert_eq!(doors[0].door, DOOR_SECRET);
        assert_eq!(doors[0].c, [200, 200, 400, 200]);
        assert!(scene.walls.iter().any(|w| w.c == [0, 200, 200, 200]));
        assert!(scene.walls.iter().any(|w| w.c == [400, 200, 600, 200]));
    }

    #[test]
    fn test_open_passage_removes_shared_wall() {
        let scene = SceneCompiler::compile(&map(json!({
            "rooms": [
                {"name": "Hall", "x": 0, "y": 0, "width": 4, "height": 4,
                 "connections": [{"to": "Kitchen", "type": "open archway"}]},
                {"name": "Kitchen", "x": 4, "y": 0, "width": 4, "height": 4,
                 "connections": ["Hall"]}
            ]
        })))
        .unwrap();
        assert_eq!(scene.walls.len(), 6);
        assert!(doors(&scene).is_empty());
    }

    #[test]
    fn test_no_rooms_yields_boundary_walls() {
        for details in [json!(null), json!({"rooms": []}), json!("A quiet glade")] {
            let scene = SceneCompiler::compile(&map(details)).unwrap();
            assert_eq!(scene.walls.len(), 4);
            assert!(scene.walls.iter().all(|w| w.door == 0));
        }
        let scene = SceneCompiler::compile(&map(json!(null))).unwrap();
        assert_eq!(scene.width, 2000);
        assert_eq!(scene.walls[1].c, [2000, 0, 2000, 2000]);
    }

    #[test]
    fn test_rooms_without_bounds_are_auto_laid_out() {
        let scene = SceneCompiler::compile(&map(json!({
            "rooms": ["Gate", "Yard", "Keep", "Cellar"]
        })))
        .unwrap();
        let bounds: Vec<RoomBounds> = scene.layout.rooms.iter().map(|r| r.bounds).collect();
        assert_eq!(
            bounds,
            vec![
                RoomBounds::new(1, 1, 6, 6),
                RoomBounds::new(7, 1, 6, 6),
                RoomBounds::new(13, 1, 6, 6),
                RoomBounds::new(1, 7, 6, 6),
            ]
        );
    }

    #[test]
    fn test_bounds_are_clamped_to_the_map() {
        let scene = SceneCompiler::compile(&map(json!({
            "rooms": [{"name": "Cavern", "x": 16, "y": 18, "width": 10, "height": 10},
                      {"name": "Void", "x": 40, "y": 0, "width": 2, "height": 2}]
        })))
        .unwrap();
        assert_eq!(scene.layout.rooms.len(), 1);
        assert_eq!(scene.layout.rooms[0].bounds, RoomBounds::new(16, 18, 4, 2));
    }

    #[test]
    fn test_explicit_dimensions_override_tier() {
        let scene =
            SceneCompiler::compile(&map(json!(null)).with_dimensions(12, 8).with_grid_size(50))
                .unwrap();
        assert_eq!((scene.width, scene.height), (600, 400));
        assert_eq!(scene.grid.size, 50);
        assert_eq!(scene.grid.grid_type, 1);
    }

    #[test]
    fn test_oversized_scene_is_rejected() {
        let err = SceneCompiler::compile(
            &map(json!(null))
                .with_grid_size(100)
                .with_dimensions(50_000_000, 10),
        )
        .unwrap_err();
        assert_eq!(err.context, "map dimensions");

        assert!(SceneCompiler::compile(&map(json!(null)).with_grid_size(u32::MAX)).is_err());
        assert!(SceneCompiler::compile(&map(json!(null)).with_grid_size(0)).is_err());
    }

    #[test]
    fn test_light_cues_and_positions() {
        let scene = SceneCompiler::compile(&map(json!({
            "rooms": [{"name": "Shrine", "x": 2, "y": 2, "width": 4, "height": 4}],
            "atmosphere": ["Flickering torchlight", "Cold drafts"],
            "pointsOfInterest": [
                {"name": "Altar candles", "room": "Shrine"},
                {"name": "Glowing runes", "x": 10, "y": 10},
                {"name": "Collapsed pillar"}
            ]
        })))
        .unwrap();

        assert_eq!(scene.lights.len(), 3);
        assert_eq!((scene.lights[0].x, scene.lights[0].y), (1000, 1000));
        assert_eq!(scene.lights[0].config.color, "#ff9329");
        assert_eq!(scene.lights[0].config.bright, 20.0);
        assert_eq!((scene.lights[1].x, scene.lights[1].y), (400, 400));
        assert_eq!(scene.lights[1].config.bright, 5.0);
        assert_eq!((scene.lights[2].x, scene.lights[2].y), (1050, 1050));
    }

    #[test]
    fn test_ambient_light_without_cues() {
        let scene = SceneCompiler::compile(&map(json!({"atmosphere": "Silent"}))).unwrap();
        assert_eq!(scene.lights.len(), 1);
        assert_eq!((scene.lights[0].x, scene.lights[0].y), (1000, 1000));
        assert_eq!(scene.lights[0].config.dim, 40.0);
    }

    #[test]
    fn test_encounter_connections_and_layout() {
        let scene = SceneCompiler::compile(&map(json!({
            "rooms": [
                {"name": "Guard Post", "x": 0, "y": 0, "width": 3, "height": 3},
                {"name": "Barracks", "x": 0, "y": 3, "width": 3, "height": 3}
            ],
            "encounters": [{"name": "Sentries", "room": "guard post", "enemies": ["Orc"],
                            "connections": ["Barracks"]}]
        })))
        .unwrap();
        assert_eq!(doors(&scene).len(), 1);
        assert_eq!(scene.layout.encounters[0].room, Some(0));
        assert_eq!(scene.layout.encounters[0].enemies, vec!["Orc".to_string()]);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let entity = map(json!({
            "rooms": [
                {"name": "A", "connections": ["B"]}, {"name": "B", "connections": ["C"]}, "C"
            ],
            "atmosphere": ["torches", "a roaring hearth"]
        }));
        let first = SceneCompiler::compile(&entity).unwrap();
        let second = SceneCompiler::compile(&entity).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_serialized_scene_has_native_fields_only() {
        let scene = SceneCompiler::compile(&map(json!({"rooms": ["A"]}))).unwrap();
        let value = serde_json::to_value(&scene).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["grid", "height", "lights", "name", "walls", "width"]);
        assert_eq!(value["walls"][0]["move"], 20);
        assert_eq!(value["grid"]["type"], 1);
    }

    #[test]
    fn test_invalid_details_are_rejected() {
        assert!(SceneCompiler::compile(&map(json!([1, 2, 3]))).is_err());
    }
}
