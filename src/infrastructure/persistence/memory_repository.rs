//! In-memory repository adapter
//!
//! Default backend for local runs and tests. Content is kept in insertion
//! order; sync records are keyed by `SyncKey` and joined onto maps and NPCs
//! on read.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::outbound::CampaignRepositoryPort;
use crate::domain::entities::{Campaign, MapEntity, NpcEntity, Session};
use crate::domain::value_objects::{CampaignId, MapId, NpcId, SessionId, SyncKey, SyncRecord};

#[derive(Default)]
struct Store {
    campaigns: Vec<Campaign>,
    sessions: Vec<Session>,
    maps: Vec<MapEntity>,
    npcs: Vec<NpcEntity>,
    sync_records: HashMap<SyncKey, SyncRecord>,
}

impl Store {
    fn record(&self, key: SyncKey) -> SyncRecord {
        self.sync_records
            .get(&key)
            .cloned()
            .unwrap_or_else(|| SyncRecord::never(key))
    }

    fn joined_map(&self, map: &MapEntity) -> MapEntity {
        let mut map = map.clone();
        map.sync = self.record(map.sync_key());
        map
    }

    fn joined_npc(&self, npc: &NpcEntity) -> NpcEntity {
        let mut npc = npc.clone();
        npc.sync = self.record(npc.sync_key());
        npc
    }
}

/// Replace the item with the same id, or append it
fn upsert<T: Clone, K: PartialEq>(items: &mut Vec<T>, item: &T, id: impl Fn(&T) -> K) {
    let key = id(item);
    match items.iter().position(|existing| id(existing) == key) {
        Some(index) => items[index] = item.clone(),
        None => items.push(item.clone()),
    }
}

#[derive(Default)]
pub struct InMemoryCampaignRepository {
    store: RwLock<Store>,
}

impl InMemoryCampaignRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignRepositoryPort for InMemoryCampaignRepository {
    async fn save_campaign(&self, campaign: &Campaign) -> Result<()> {
        upsert(&mut self.store.write().await.campaigns, campaign, |c| c.id);
        Ok(())
    }

    async fn get_campaign(&self, id: CampaignId) -> Result<Option<Campaign>> {
        let store = self.store.read().await;
        Ok(store.campaigns.iter().find(|c| c.id == id).cloned())
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        Ok(self.store.read().await.campaigns.clone())
    }

    async fn save_session(&self, session: &Session) -> Result<()> {
        upsert(&mut self.store.write().await.sessions, session, |s| s.id);
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<Session>> {
        let store = self.store.read().await;
        Ok(store.sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn list_sessions(&self, campaign_id: CampaignId) -> Result<Vec<Session>> {
        let store = self.store.read().await;
        Ok(store
            .sessions
            .iter()
            .filter(|s| s.campaign_id == campaign_id)
            .cloned()
            .collect())
    }

    async fn save_map(&self, map: &MapEntity) -> Result<()> {
        upsert(&mut self.store.write().await.maps, map, |m| m.id);
        Ok(())
    }

    async fn get_map(&self, id: MapId) -> Result<Option<MapEntity>> {
        let store = self.store.read().await;
        Ok(store
            .maps
            .iter()
            .find(|m| m.id == id)
            .map(|m| store.joined_map(m)))
    }

    async fn list_maps(&self, campaign_id: CampaignId) -> Result<Vec<MapEntity>> {
        let store = self.store.read().await;
        Ok(store
            .maps
            .iter()
            .filter(|m| m.campaign_id == campaign_id)
            .map(|m| store.joined_map(m))
            .collect())
    }

    async fn save_npc(&self, npc: &NpcEntity) -> Result<()> {
        upsert(&mut self.store.write().await.npcs, npc, |n| n.id);
        Ok(())
    }

    async fn get_npc(&self, id: NpcId) -> Result<Option<NpcEntity>> {
        let store = self.store.read().await;
        Ok(store
            .npcs
            .iter()
            .find(|n| n.id == id)
            .map(|n| store.joined_npc(n)))
    }

    async fn list_npcs(&self, campaign_id: CampaignId) -> Result<Vec<NpcEntity>> {
        let store = self.store.read().await;
        Ok(store
            .npcs
            .iter()
            .filter(|n| n.campaign_id == campaign_id)
            .map(|n| store.joined_npc(n))
            .collect())
    }

    async fn get_sync_record(&self, key: &SyncKey) -> Result<Option<SyncRecord>> {
        Ok(self.store.read().await.sync_records.get(key).cloned())
    }

    async fn save_sync_record(&self, record: &SyncRecord) -> Result<()> {
        self.store
            .write()
            .await
            .sync_records
            .insert(record.key.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MapSizeTier;
    use crate::domain::value_objects::SyncStatus;

    #[tokio::test]
    async fn test_maps_are_listed_in_insertion_order_with_sync_joined() {
        let repo = InMemoryCampaignRepository::new();
        let campaign = Campaign::new("Isles");
        repo.save_campaign(&campaign).await.unwrap();

        let first = MapEntity::new(campaign.id, "Harbor", MapSizeTier::Small);
        let second = MapEntity::new(campaign.id, "Cave", MapSizeTier::Medium);
        repo.save_map(&first).await.unwrap();
        repo.save_map(&second).await.unwrap();

        let mut record = SyncRecord::never(first.sync_key());
        record.begin();
        record.succeed("scene-1").unwrap();
        repo.save_sync_record(&record).await.unwrap();

        // Re-saving content keeps position and does not touch sync state
        repo.save_map(&first.clone().with_map_type("harbor")).await.unwrap();

        let maps = repo.list_maps(campaign.id).await.unwrap();
        assert_eq!(maps.len(), 2);
        assert_eq!(maps[0].name, "Harbor");
        assert_eq!(maps[0].map_type, "harbor");
        assert_eq!(maps[0].sync.status, SyncStatus::Synced);
        assert_eq!(maps[0].sync.external_id.as_deref(), Some("scene-1"));
        assert_eq!(maps[1].sync.status, SyncStatus::Never);
    }

    #[tokio::test]
    async fn test_listing_filters_by_campaign() {
        let repo = InMemoryCampaignRepository::new();
        let mine = CampaignId::new();
        repo.save_npc(&NpcEntity::new(mine, "Ada")).await.unwrap();
        repo.save_npc(&NpcEntity::new(CampaignId::new(), "Zed"))
            .await
            .unwrap();

        let npcs = repo.list_npcs(mine).await.unwrap();
        assert_eq!(npcs.len(), 1);
        assert_eq!(npcs[0].name, "Ada");
        assert!(repo.get_npc(NpcId::new()).await.unwrap().is_none());
    }
}
