use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CampaignId, SessionId};

/// What a bulk sync run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum SyncScope {
    Campaign(CampaignId),
    Session(SessionId),
}

/// Per-category outcome of a bulk run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub success: usize,
    pub failed: usize,
}

impl CategoryTally {
    pub fn record(&mut self, succeeded: bool) {
        if succeeded {
            self.success += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.failed
    }
}

/// Aggregate result of `sync_scope`, reported even when entities failed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub scenes: CategoryTally,
    pub actors: CategoryTally,
    pub journals: CategoryTally,
    pub tokens: CategoryTally,
    /// Set when the run was cancelled before every entity was attempted
    pub cancelled: bool,
}

impl SyncReport {
    pub fn failed(&self) -> usize {
        self.scenes.failed + self.actors.failed + self.journals.failed + self.tokens.failed
    }
}
