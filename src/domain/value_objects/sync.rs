//! Sync state value objects
//!
//! A `SyncRecord` tracks how one internal entity reconciles against its
//! counterpart document in the VTT. Records move through a small state
//! machine; only a successful round trip may produce `Synced`, and an
//! external id, once assigned, is never dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The VTT resource category an entity is synced as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Scene,
    Actor,
    Journal,
    Token,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Scene => "scene",
            ResourceKind::Actor => "actor",
            ResourceKind::Journal => "journal",
            ResourceKind::Token => "token",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scene" => Ok(ResourceKind::Scene),
            "actor" => Ok(ResourceKind::Actor),
            "journal" => Ok(ResourceKind::Journal),
            "token" => Ok(ResourceKind::Token),
            _ => Err(anyhow::anyhow!("Invalid resource kind: {}", s)),
        }
    }
}

/// Reconciliation state shown as the entity's sync badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Never,
    Pending,
    Synced,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Never => "never",
            SyncStatus::Pending => "pending",
            SyncStatus::Synced => "synced",
            SyncStatus::Error => "error",
        }
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" | "" => Ok(SyncStatus::Never),
            "pending" => Ok(SyncStatus::Pending),
            "synced" => Ok(SyncStatus::Synced),
            "error" => Ok(SyncStatus::Error),
            _ => Err(anyhow::anyhow!("Invalid sync status: {}", s)),
        }
    }
}

/// Identity of a synced entity: (resource kind, entity id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncKey {
    pub kind: ResourceKind,
    pub entity_id: String,
}

impl SyncKey {
    pub fn new(kind: ResourceKind, entity_id: impl Into<String>) -> Self {
        Self {
            kind,
            entity_id: entity_id.into(),
        }
    }

    pub fn scene(map_id: impl std::fmt::Display) -> Self {
        Self::new(ResourceKind::Scene, map_id.to_string())
    }

    pub fn actor(npc_id: impl std::fmt::Display) -> Self {
        Self::new(ResourceKind::Actor, npc_id.to_string())
    }

    pub fn lore_journal(campaign_id: impl std::fmt::Display) -> Self {
        Self::new(ResourceKind::Journal, format!("lore:{}", campaign_id))
    }

    pub fn scenario_journal(session_id: impl std::fmt::Display) -> Self {
        Self::new(ResourceKind::Journal, format!("scenario:{}", session_id))
    }

    pub fn token(session_id: impl std::fmt::Display, npc_id: impl std::fmt::Display) -> Self {
        Self::new(ResourceKind::Token, format!("{}:{}", session_id, npc_id))
    }
}

impl std::fmt::Display for SyncKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.entity_id)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SyncStateError {
    #[error("cannot mark {key} synced from status {from}")]
    NotPending { key: String, from: &'static str },
}

/// Sync state of one entity against the VTT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub key: SyncKey,
    pub external_id: Option<String>,
    pub status: SyncStatus,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl SyncRecord {
    /// A fresh record for a newly generated entity
    pub fn never(key: SyncKey) -> Self {
        Self {
            key,
            external_id: None,
            status: SyncStatus::Never,
            last_synced_at: None,
            last_error: None,
        }
    }

    /// Start a sync attempt. Allowed from every state.
    pub fn begin(&mut self) {
        self.status = SyncStatus::Pending;
    }

    /// Record a successful round trip.
    ///
    /// An existing external id is kept; `external_id` only fills an empty slot.
    pub fn succeed(&mut self, external_id: impl Into<String>) -> Result<(), SyncStateError> {
        if self.status != SyncStatus::Pending {
            return Err(SyncStateError::NotPending {
                key: self.key.to_string(),
                from: self.status.as_str(),
            });
        }
        if self.external_id.is_none() {
            self.external_id = Some(external_id.into());
        }
        self.status = SyncStatus::Synced;
        self.last_synced_at = Some(Utc::now());
        self.last_error = None;
        Ok(())
    }

    /// Record a failed attempt, retaining any prior external id
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = SyncStatus::Error;
        self.last_error = Some(error.into());
    }

    pub fn is_synced(&self) -> bool {
        self.status == SyncStatus::Synced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_never_synced() {
        let record = SyncRecord::never(SyncKey::scene("map-1"));
        assert_eq!(record.status, SyncStatus::Never);
        assert!(record.external_id.is_none());
        assert!(record.last_synced_at.is_none());
    }

    #[test]
    fn test_success_requires_pending() {
        let mut record = SyncRecord::never(SyncKey::actor("npc-1"));
        assert!(record.succeed("ext-1").is_err());

        record.begin();
        record.succeed("ext-1").unwrap();
        assert_eq!(record.status, SyncStatus::Synced);
        assert_eq!(record.external_id.as_deref(), Some("ext-1"));
        assert!(record.last_synced_at.is_some());

        // Synced cannot be re-confirmed without a new attempt
        assert!(record.succeed("ext-1").is_err());
    }

    #[test]
    fn test_failure_keeps_external_id() {
        let mut record = SyncRecord::never(SyncKey::scene("map-1"));
        record.begin();
        record.succeed("scene-abc").unwrap();

        record.begin();
        record.fail("VTT rejected the request");
        assert_eq!(record.status, SyncStatus::Error);
        assert_eq!(record.external_id.as_deref(), Some("scene-abc"));
        assert_eq!(record.last_error.as_deref(), Some("VTT rejected the request"));
    }

    #[test]
    fn test_error_to_pending_to_synced_reuses_id() {
        let mut record = SyncRecord::never(SyncKey::scene("map-1"));
        record.begin();
        record.succeed("scene-abc").unwrap();
        record.begin();
        record.fail("timeout");

        record.begin();
        assert_eq!(record.status, SyncStatus::Pending);
        record.succeed("scene-other").unwrap();
        assert_eq!(record.status, SyncStatus::Synced);
        assert_eq!(record.external_id.as_deref(), Some("scene-abc"));
        assert!(record.last_error.is_none());
    }

    #[test]
    fn test_key_formats() {
        assert_eq!(SyncKey::lore_journal("c1").entity_id, "lore:c1");
        assert_eq!(SyncKey::scenario_journal("s1").entity_id, "scenario:s1");
        assert_eq!(SyncKey::token("s1", "n1").entity_id, "s1:n1");
        assert_eq!(SyncKey::token("s1", "n1").to_string(), "token/s1:n1");
    }
}
