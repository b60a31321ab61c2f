//! Value objects - Immutable objects defined by their attributes

mod ids;
mod normalized;
mod settings;
mod sync;

pub use ids::*;
pub use normalized::{
    AbilityScores, ActorStats, CreatureSize, DoorKind, FieldValue, GridPoint, MonsterStatBlock,
    NormalizedEncounter, NormalizedLore, NormalizedMapDetails, NormalizedRoom, PointOfInterest,
    RoomBounds, RoomConnection,
};
pub use settings::SyncSettings;
pub use sync::{ResourceKind, SyncKey, SyncRecord, SyncStateError, SyncStatus};
