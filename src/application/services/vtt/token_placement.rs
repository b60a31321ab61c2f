//! Token Placement Engine - Non-overlapping grid placements for actors
//!
//! Encounter enemies are placed first, preferring their encounter's room, and
//! are flagged hostile. Everyone else scans rooms in declaration order. Within
//! a room the first free, wall-free block in row-major order wins. Occupancy
//! lives only for one `place` call.

use std::collections::HashSet;

use crate::application::dto::{SceneDocument, SceneLayout, TokenDocument, TokenTexture, WallDocument};
use crate::application::services::vtt::{contains_words, words, ShapeNormalizer, ValidationError};
use crate::domain::entities::{NpcEntity, TokenDisposition};
use crate::domain::value_objects::{CreatureSize, NpcId, RoomBounds};

/// Actor to be placed on a scene
#[derive(Debug, Clone, PartialEq)]
pub struct ActorRef {
    pub npc_id: NpcId,
    pub name: String,
    pub size: CreatureSize,
    pub disposition: TokenDisposition,
    pub token_image: Option<String>,
}

impl ActorRef {
    pub fn from_npc(npc: &NpcEntity) -> Result<Self, ValidationError> {
        let stats = ShapeNormalizer::normalize_actor_stats(npc.stats.as_ref())?;
        Ok(Self {
            npc_id: npc.id,
            name: npc.name.clone(),
            size: stats.size(),
            disposition: npc.disposition.unwrap_or_default(),
            token_image: npc.token_image.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenPlacement {
    pub npc_id: NpcId,
    /// Top-left cell of the footprint
    pub grid_x: u32,
    pub grid_y: u32,
    /// Cells per side
    pub footprint: u32,
    /// `None` when the scene has no rooms and the whole map was used
    pub room: Option<String>,
    pub hostile: bool,
}

impl TokenPlacement {
    /// Token document for this placement against a synced actor
    pub fn to_document(&self, actor: &ActorRef, actor_external_id: &str, grid_size: u32) -> TokenDocument {
        let disposition = if self.hostile {
            TokenDisposition::Hostile
        } else {
            actor.disposition
        };
        TokenDocument {
            name: actor.name.clone(),
            actor_id: actor_external_id.to_string(),
            x: self.grid_x.saturating_mul(grid_size),
            y: self.grid_y.saturating_mul(grid_size),
            width: self.footprint,
            height: self.footprint,
            disposition: disposition.vtt_value(),
            hidden: false,
            texture: TokenTexture {
                src: actor.token_image.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementFailure {
    #[error("no free {footprint}x{footprint} block for {name}")]
    NoSpace { name: String, footprint: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacementResult {
    pub npc_id: NpcId,
    pub outcome: Result<TokenPlacement, PlacementFailure>,
}

struct Region<'a> {
    name: Option<&'a str>,
    bounds: RoomBounds,
}

pub struct TokenPlacementEngine;

impl TokenPlacementEngine {
    /// One result per actor, in input order
    pub fn place(scene: &SceneDocument, actors: &[ActorRef]) -> Vec<PlacementResult> {
        let layout = &scene.layout;
        let regions: Vec<Region<'_>> = if layout.rooms.is_empty() {
            vec![Region {
                name: None,
                bounds: RoomBounds::new(0, 0, layout.columns, layout.rows),
            }]
        } else {
            layout
                .rooms
                .iter()
                .map(|room| Region {
                    name: Some(room.name.as_str()),
                    bounds: room.bounds,
                })
                .collect()
        };

        let matches: Vec<Option<Option<usize>>> = actors
            .iter()
            .map(|actor| encounter_room(layout, &actor.name))
            .collect();

        let mut occupied = HashSet::new();
        let mut results: Vec<Option<PlacementResult>> = vec![None; actors.len()];

        for hostile_pass in [true, false] {
            for (index, actor) in actors.iter().enumerate() {
                if matches[index].is_some() != hostile_pass {
                    continue;
                }
                let preferred = matches[index].flatten();
                let footprint = actor.size.footprint();
                let order = preferred
                    .into_iter()
                    .chain((0..regions.len()).filter(|r| Some(*r) != preferred));

                let found = order.into_iter().find_map(|r| {
                    first_fit(regions[r].bounds, footprint, &occupied, &scene.walls, scene.grid.size)
                        .map(|(x, y)| (r, x, y))
                });

                let outcome = match found {
                    Some((r, x, y)) => {
                        for dy in 0..footprint {
                            for dx in 0..footprint {
                                occupied.insert((x + dx, y + dy));
                            }
                        }
                        Ok(TokenPlacement {
                            npc_id: actor.npc_id,
                            grid_x: x,
                            grid_y: y,
                            footprint,
                            room: regions[r].name.map(str::to_string),
                            hostile: hostile_pass,
                        })
                    }
                    None => Err(PlacementFailure::NoSpace {
                        name: actor.name.clone(),
                        footprint,
                    }),
                };
                results[index] = Some(PlacementResult {
                    npc_id: actor.npc_id,
                    outcome,
                });
            }
        }

        results.into_iter().flatten().collect()
    }
}

/// `Some(room)` when the actor is an enemy of some encounter. Names match on
/// whole words either way, so "Goblin 2" and "Goblin Boss" both match "Goblin".
fn encounter_room(layout: &SceneLayout, actor_name: &str) -> Option<Option<usize>> {
    let name = words(actor_name);
    if name.is_empty() {
        return None;
    }
    layout
        .encounters
        .iter()
        .find(|encounter| {
            encounter.enemies.iter().any(|enemy| {
                let enemy = words(enemy);
                contains_words(&name, &enemy) || contains_words(&enemy, &name)
            })
        })
        .map(|encounter| encounter.room)
}

fn first_fit(
    bounds: RoomBounds,
    size: u32,
    occupied: &HashSet<(u32, u32)>,
    walls: &[WallDocument],
    grid: u32,
) -> Option<(u32, u32)> {
    if size > bounds.width || size > bounds.height {
        return None;
    }
    (bounds.y..=bounds.bottom() - size)
        .flat_map(|y| (bounds.x..=bounds.right() - size).map(move |x| (x, y)))
        .find(|&(x, y)| {
            bounds.contains_block(x, y, size)
                && (0..size).all(|dy| (0..size).all(|dx| !occupied.contains(&(x + dx, y + dy))))
                && !walls.iter().any(|wall| crosses_block(wall.c, x, y, size, grid))
        })
}

/// Whether the segment enters the block's open interior
fn crosses_block(c: [u32; 4], x: u32, y: u32, size: u32, grid: u32) -> bool {
    // Shrink the block so segments on its boundary do not count
    const INSET: f64 = 0.5;
    let g = grid as f64;
    let min = (x as f64 * g + INSET, y as f64 * g + INSET);
    let max = ((x + size) as f64 * g - INSET, (y + size) as f64 * g - INSET);

    let (x1, y1, x2, y2) = (c[0] as f64, c[1] as f64, c[2] as f64, c[3] as f64);
    let (dx, dy) = (x2 - x1, y2 - y1);
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    for (p, q) in [
        (-dx, x1 - min.0),
        (dx, max.0 - x1),
        (-dy, y1 - min.1),
        (dy, max.1 - y1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return false;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return false;
                }
                t1 = t1.min(r);
            }
        }
    }
    t0 <= t1
}
