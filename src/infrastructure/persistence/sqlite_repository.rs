//! SQLite repository adapter
//!
//! Entities are stored as JSON bodies keyed by id, with the owning campaign
//! as an indexed column. Sync records get their own table keyed by
//! `(kind, entity_id)`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::application::ports::outbound::CampaignRepositoryPort;
use crate::domain::entities::{Campaign, MapEntity, NpcEntity, Session};
use crate::domain::value_objects::{
    CampaignId, MapId, NpcId, ResourceKind, SessionId, SyncKey, SyncRecord, SyncStatus,
};

const TABLES: [&str; 4] = ["campaigns", "sessions", "maps", "npcs"];

type SyncRow = (
    String,
    String,
    Option<String>,
    String,
    Option<DateTime<Utc>>,
    Option<String>,
);

#[derive(Clone)]
pub struct SqliteCampaignRepository {
    pool: SqlitePool,
}

impl SqliteCampaignRepository {
    /// Wrap a pool, creating the schema if needed
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        for table in TABLES {
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    campaign_id TEXT NOT NULL,
                    body TEXT NOT NULL
                )
                "#
            ))
            .execute(&pool)
            .await
            .with_context(|| format!("Failed to create {} table", table))?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_campaign ON {table} (campaign_id)"
            ))
            .execute(&pool)
            .await?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sync_records (
                kind TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                external_id TEXT,
                status TEXT NOT NULL,
                last_synced_at TIMESTAMP,
                last_error TEXT,
                PRIMARY KEY (kind, entity_id)
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("Failed to create sync_records table")?;

        Ok(Self { pool })
    }

    /// Open (or create) the database file at `path`
    pub async fn connect(path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create database directory")?;
            }
        }

        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", path))
            .await
            .context("Failed to connect to SQLite database")?;
        tracing::info!("Connected to SQLite database: {}", path);
        Self::new(pool).await
    }

    // Rows keep their rowid on upsert, so rowid order is creation order.
    async fn upsert<T: Serialize>(
        &self,
        table: &str,
        id: String,
        campaign_id: String,
        entity: &T,
    ) -> Result<()> {
        let body = serde_json::to_string(entity)?;
        sqlx::query(&format!(
            r#"
            INSERT INTO {table} (id, campaign_id, body) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET campaign_id = excluded.campaign_id, body = excluded.body
            "#
        ))
        .bind(id)
        .bind(campaign_id)
        .bind(body)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to save row in {}", table))?;
        Ok(())
    }

    async fn fetch_one<T: DeserializeOwned>(&self, table: &str, id: String) -> Result<Option<T>> {
        let row: Option<(String,)> =
            sqlx::query_as(&format!("SELECT body FROM {table} WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(body,)| serde_json::from_str(&body).context("Corrupt entity body"))
            .transpose()
    }

    async fn fetch_for_campaign<T: DeserializeOwned>(
        &self,
        table: &str,
        campaign_id: CampaignId,
    ) -> Result<Vec<T>> {
        let rows: Vec<(String,)> = sqlx::query_as(&format!(
            "SELECT body FROM {table} WHERE campaign_id = ? ORDER BY rowid"
        ))
        .bind(campaign_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|(body,)| serde_json::from_str(&body).context("Corrupt entity body"))
            .collect()
    }

    async fn record_or_never(&self, key: SyncKey) -> Result<SyncRecord> {
        Ok(self
            .get_sync_record(&key)
            .await?
            .unwrap_or_else(|| SyncRecord::never(key)))
    }

    async fn join_map(&self, mut map: MapEntity) -> Result<MapEntity> {
        map.sync = self.record_or_never(map.sync_key()).await?;
        Ok(map)
    }

    async fn join_npc(&self, mut npc: NpcEntity) -> Result<NpcEntity> {
        npc.sync = self.record_or_never(npc.sync_key()).await?;
        Ok(npc)
    }
}

fn record_from_row(row: SyncRow) -> Result<SyncRecord> {
    let (kind, entity_id, external_id, status, last_synced_at, last_error) = row;
    Ok(SyncRecord {
        key: SyncKey::new(kind.parse::<ResourceKind>()?, entity_id),
        external_id,
        status: status.parse::<SyncStatus>()?,
        last_synced_at,
        last_error,
    })
}

#[async_trait]
impl CampaignRepositoryPort for SqliteCampaignRepository {
    async fn save_campaign(&self, campaign: &Campaign) -> Result<()> {
        let id = campaign.id.to_string();
        self.upsert("campaigns", id.clone(), id, campaign).await
    }

    async fn get_campaign(&self, id: CampaignId) -> Result<Option<Campaign>> {
        self.fetch_one("campaigns", id.to_string()).await
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT body FROM campaigns ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|(body,)| serde_json::from_str(&body).context("Corrupt campaign body"))
            .collect()
    }

    async fn save_session(&self, session: &Session) -> Result<()> {
        self.upsert(
            "sessions",
            session.id.to_string(),
            session.campaign_id.to_string(),
            session,
        )
        .await
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<Session>> {
        self.fetch_one("sessions", id.to_string()).await
    }

    async fn list_sessions(&self, campaign_id: CampaignId) -> Result<Vec<Session>> {
        self.fetch_for_campaign("sessions", campaign_id).await
    }

    async fn save_map(&self, map: &MapEntity) -> Result<()> {
        self.upsert("maps", map.id.to_string(), map.campaign_id.to_string(), map)
            .await
    }

    async fn get_map(&self, id: MapId) -> Result<Option<MapEntity>> {
        match self.fetch_one::<MapEntity>("maps", id.to_string()).await? {
            Some(map) => Ok(Some(self.join_map(map).await?)),
            None => Ok(None),
        }
    }

    async fn list_maps(&self, campaign_id: CampaignId) -> Result<Vec<MapEntity>> {
        let maps: Vec<MapEntity> = self.fetch_for_campaign("maps", campaign_id).await?;
        let mut joined = Vec::with_capacity(maps.len());
        for map in maps {
            joined.push(self.join_map(map).await?);
        }
        Ok(joined)
    }

    async fn save_npc(&self, npc: &NpcEntity) -> Result<()> {
        self.upsert("npcs", npc.id.to_string(), npc.campaign_id.to_string(), npc)
            .await
    }

    async fn get_npc(&self, id: NpcId) -> Result<Option<NpcEntity>> {
        match self.fetch_one::<NpcEntity>("npcs", id.to_string()).await? {
            Some(npc) => Ok(Some(self.join_npc(npc).await?)),
            None => Ok(None),
        }
    }

    async fn list_npcs(&self, campaign_id: CampaignId) -> Result<Vec<NpcEntity>> {
        let npcs: Vec<NpcEntity> = self.fetch_for_campaign("npcs", campaign_id).await?;
        let mut joined = Vec::with_capacity(npcs.len());
        for npc in npcs {
            joined.push(self.join_npc(npc).await?);
        }
        Ok(joined)
    }

    async fn get_sync_record(&self, key: &SyncKey) -> Result<Option<SyncRecord>> {
        let row: Option<SyncRow> = sqlx::query_as(
            r#"
            SELECT kind, entity_id, external_id, status, last_synced_at, last_error
            FROM sync_records WHERE kind = ? AND entity_id = ?
            "#,
        )
        .bind(key.kind.as_str())
        .bind(&key.entity_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load sync record")?;
        row.map(record_from_row).transpose()
    }

    async fn save_sync_record(&self, record: &SyncRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO sync_records
                (kind, entity_id, external_id, status, last_synced_at, last_error)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.key.kind.as_str())
        .bind(&record.key.entity_id)
        .bind(&record.external_id)
        .bind(record.status.as_str())
        .bind(record.last_synced_at)
        .bind(&record.last_error)
        .execute(&self.pool)
        .await
        .context("Failed to save sync record")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MapSizeTier;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn repository() -> SqliteCampaignRepository {
        // One connection, or every connection would get its own memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteCampaignRepository::new(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_entities_round_trip_in_creation_order() {
        let repo = repository().await;
        let campaign = Campaign::new("Isles").with_lore(serde_json::json!({"history": "Old"}));
        repo.save_campaign(&campaign).await.unwrap();

        let first = MapEntity::new(campaign.id, "Harbor", MapSizeTier::Small);
        let second = MapEntity::new(campaign.id, "Cave", MapSizeTier::Large);
        repo.save_map(&first).await.unwrap();
        repo.save_map(&second).await.unwrap();
        repo.save_map(&first.clone().with_grid_size(50)).await.unwrap();

        let maps = repo.list_maps(campaign.id).await.unwrap();
        assert_eq!(
            maps.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
            vec!["Harbor", "Cave"]
        );
        assert_eq!(maps[0].grid_size, 50);

        let loaded = repo.get_campaign(campaign.id).await.unwrap().unwrap();
        assert_eq!(loaded.lore, campaign.lore);
        assert!(repo.get_campaign(CampaignId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sync_record_upsert_is_joined_onto_npcs() {
        let repo = repository().await;
        let npc = NpcEntity::new(CampaignId::new(), "Ada");
        repo.save_npc(&npc).await.unwrap();
        assert_eq!(
            repo.get_npc(npc.id).await.unwrap().unwrap().sync.status,
            SyncStatus::Never
        );

        let mut record = SyncRecord::never(npc.sync_key());
        record.begin();
        repo.save_sync_record(&record).await.unwrap();
        record.fail("rejected");
        repo.save_sync_record(&record).await.unwrap();

        let loaded = repo.get_npc(npc.id).await.unwrap().unwrap();
        assert_eq!(loaded.sync.status, SyncStatus::Error);
        assert_eq!(loaded.sync.last_error.as_deref(), Some("rejected"));

        record.begin();
        record.succeed("actor-9").unwrap();
        repo.save_sync_record(&record).await.unwrap();
        let stored = repo.get_sync_record(&npc.sync_key()).await.unwrap().unwrap();
        assert_eq!(stored.external_id.as_deref(), Some("actor-9"));
        assert!(stored.last_synced_at.is_some());
    }
}
