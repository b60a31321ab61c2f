//! Per-campaign single-flight lock for sync operations
//!
//! Holding a `SyncGuard` is what "currently syncing" means for a campaign.
//! The guard carries the run's cancel flag and releases the campaign on drop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::value_objects::CampaignId;

type LockTable = Arc<Mutex<HashMap<CampaignId, Arc<AtomicBool>>>>;

#[derive(Clone, Default)]
pub struct SyncLocks {
    held: LockTable,
}

impl SyncLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the campaign, or `None` if a sync already holds it
    pub fn try_acquire(&self, campaign_id: CampaignId) -> Option<SyncGuard> {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        if held.contains_key(&campaign_id) {
            return None;
        }
        let cancelled = Arc::new(AtomicBool::new(false));
        held.insert(campaign_id, cancelled.clone());
        Some(SyncGuard {
            held: self.held.clone(),
            campaign_id,
            cancelled,
        })
    }

    /// Request cancellation of the campaign's running sync
    pub fn cancel(&self, campaign_id: CampaignId) -> bool {
        let held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        match held.get(&campaign_id) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    pub fn is_held(&self, campaign_id: CampaignId) -> bool {
        self.held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&campaign_id)
    }
}

pub struct SyncGuard {
    held: LockTable,
    campaign_id: CampaignId,
    cancelled: Arc<AtomicBool>,
}

impl SyncGuard {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for SyncGuard {
    fn drop(&mut self) {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        held.remove(&self.campaign_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected_until_release() {
        let locks = SyncLocks::new();
        let campaign = CampaignId::new();

        let guard = locks.try_acquire(campaign).unwrap();
        assert!(locks.try_acquire(campaign).is_none());
        assert!(locks.is_held(campaign));
        assert!(locks.try_acquire(CampaignId::new()).is_some());

        drop(guard);
        assert!(!locks.is_held(campaign));
        assert!(locks.try_acquire(campaign).is_some());
    }

    #[test]
    fn test_cancel_sets_the_guard_flag() {
        let locks = SyncLocks::new();
        let campaign = CampaignId::new();
        assert!(!locks.cancel(campaign));

        let guard = locks.try_acquire(campaign).unwrap();
        assert!(!guard.is_cancelled());
        assert!(locks.cancel(campaign));
        assert!(guard.is_cancelled());
    }
}
