//! Domain layer - Campaign content and sync state
//!
//! This layer contains:
//! - Entities: Campaign, Session, MapEntity, NpcEntity
//! - Value Objects: ids, sync records, normalized AI content shapes, settings

pub mod entities;
pub mod value_objects;
