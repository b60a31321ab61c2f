//! Campaign Service - Ingests AI-generated campaign content
//!
//! Content is validated against the shapes the compilers accept before it is
//! stored, so a bad payload is refused at ingestion instead of failing later
//! during sync.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::application::dto::SceneDocument;
use crate::application::ports::outbound::CampaignRepositoryPort;
use crate::application::services::vtt::{SceneCompiler, ShapeNormalizer, ValidationError};
use crate::domain::entities::{
    Campaign, MapEntity, MapSizeTier, NpcEntity, Session, TokenDisposition, VisionConfig,
    MAX_SCENE_PIXELS,
};
use crate::domain::value_objects::{CampaignId, MapId, NpcId, SessionId};

const MAX_NAME_LENGTH: usize = 255;

#[derive(Debug, thiserror::Error)]
pub enum CampaignServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Repository(#[from] anyhow::Error),
}

impl From<ValidationError> for CampaignServiceError {
    fn from(e: ValidationError) -> Self {
        CampaignServiceError::Validation(e.to_string())
    }
}

pub type ServiceResult<T> = std::result::Result<T, CampaignServiceError>;

#[derive(Debug, Clone)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub lore: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct CreateMapRequest {
    pub name: String,
    pub session_id: Option<SessionId>,
    pub map_type: Option<String>,
    pub size_tier: MapSizeTier,
    pub grid_size: Option<u32>,
    /// Explicit `(columns, rows)`
    pub dimensions: Option<(u32, u32)>,
    pub details: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct CreateNpcRequest {
    pub name: String,
    pub role: Option<String>,
    pub personality: Option<String>,
    pub motivation: Option<String>,
    pub stats: Option<serde_json::Value>,
    pub token_image: Option<String>,
    pub disposition: Option<TokenDisposition>,
    pub vision: Option<VisionConfig>,
}

#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub name: String,
    pub scenario: Option<String>,
    pub map_id: Option<MapId>,
    pub npc_ids: Vec<NpcId>,
}

#[async_trait]
pub trait CampaignService: Send + Sync {
    async fn create_campaign(&self, request: CreateCampaignRequest) -> ServiceResult<Campaign>;

    async fn get_campaign(&self, id: CampaignId) -> ServiceResult<Campaign>;

    async fn list_campaigns(&self) -> ServiceResult<Vec<Campaign>>;

    /// Replace the campaign's raw lore
    async fn update_lore(&self, id: CampaignId, lore: serde_json::Value) -> ServiceResult<Campaign>;

    async fn create_map(&self, campaign_id: CampaignId, request: CreateMapRequest) -> ServiceResult<MapEntity>;

    async fn get_map(&self, id: MapId) -> ServiceResult<MapEntity>;

    async fn list_maps(&self, campaign_id: CampaignId) -> ServiceResult<Vec<MapEntity>>;

    async fn create_npc(&self, campaign_id: CampaignId, request: CreateNpcRequest) -> ServiceResult<NpcEntity>;

    async fn list_npcs(&self, campaign_id: CampaignId) -> ServiceResult<Vec<NpcEntity>>;

    async fn create_session(
        &self,
        campaign_id: CampaignId,
        request: CreateSessionRequest,
    ) -> ServiceResult<Session>;

    async fn list_sessions(&self, campaign_id: CampaignId) -> ServiceResult<Vec<Session>>;

    /// The scene document API sync would send, for file export
    async fn export_scene(&self, map_id: MapId) -> ServiceResult<SceneDocument>;
}

pub struct CampaignServiceImpl {
    repository: Arc<dyn CampaignRepositoryPort>,
}

impl CampaignServiceImpl {
    pub fn new(repository: Arc<dyn CampaignRepositoryPort>) -> Self {
        Self { repository }
    }

    fn validate_name(kind: &str, name: &str) -> ServiceResult<()> {
        if name.trim().is_empty() {
            return Err(CampaignServiceError::Validation(format!("{} name cannot be empty", kind)));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(CampaignServiceError::Validation(format!(
                "{} name cannot exceed {} characters",
                kind, MAX_NAME_LENGTH
            )));
        }
        Ok(())
    }

    async fn require_campaign(&self, id: CampaignId) -> ServiceResult<Campaign> {
        self.repository
            .get_campaign(id)
            .await?
            .ok_or_else(|| CampaignServiceError::NotFound(format!("Campaign {}", id)))
    }
}

#[async_trait]
impl CampaignService for CampaignServiceImpl {
    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn create_campaign(&self, request: CreateCampaignRequest) -> ServiceResult<Campaign> {
        Self::validate_name("Campaign", &request.name)?;

        let mut campaign = Campaign::new(request.name.trim());
        if let Some(lore) = request.lore {
            ShapeNormalizer::normalize_lore(&lore)?;
            campaign = campaign.with_lore(lore);
        }

        self.repository.save_campaign(&campaign).await?;
        info!(campaign_id = %campaign.id, "Created campaign: {}", campaign.name);
        Ok(campaign)
    }

    #[instrument(skip(self))]
    async fn get_campaign(&self, id: CampaignId) -> ServiceResult<Campaign> {
        debug!(campaign_id = %id, "Fetching campaign");
        self.require_campaign(id).await
    }

    #[instrument(skip(self))]
    async fn list_campaigns(&self) -> ServiceResult<Vec<Campaign>> {
        Ok(self.repository.list_campaigns().await?)
    }

    #[instrument(skip(self, lore), fields(campaign_id = %id))]
    async fn update_lore(&self, id: CampaignId, lore: serde_json::Value) -> ServiceResult<Campaign> {
        ShapeNormalizer::normalize_lore(&lore)?;
        let campaign = self.require_campaign(id).await?.with_lore(lore);
        self.repository.save_campaign(&campaign).await?;
        info!(campaign_id = %id, "Updated campaign lore");
        Ok(campaign)
    }

    #[instrument(skip(self, request), fields(campaign_id = %campaign_id, name = %request.name))]
    async fn create_map(&self, campaign_id: CampaignId, request: CreateMapRequest) -> ServiceResult<MapEntity> {
        Self::validate_name("Map", &request.name)?;
        self.require_campaign(campaign_id).await?;
        ShapeNormalizer::normalize_map_details(&request.details)?;

        let mut map = MapEntity::new(campaign_id, request.name.trim(), request.size_tier)
            .with_details(request.details);
        if let Some(session_id) = request.session_id {
            let session = self
                .repository
                .get_session(session_id)
                .await?
                .filter(|s| s.campaign_id == campaign_id)
                .ok_or_else(|| CampaignServiceError::NotFound(format!("Session {}", session_id)))?;
            map = map.with_session(session.id);
        }
        if let Some(map_type) = request.map_type {
            map = map.with_map_type(map_type);
        }
        if let Some(grid_size) = request.grid_size {
            if grid_size == 0 {
                return Err(CampaignServiceError::Validation(
                    "Grid size must be positive".to_string(),
                ));
            }
            map = map.with_grid_size(grid_size);
        }
        if let Some((columns, rows)) = request.dimensions {
            if columns == 0 || rows == 0 {
                return Err(CampaignServiceError::Validation(
                    "Map dimensions must be positive".to_string(),
                ));
            }
            map = map.with_dimensions(columns, rows);
        }
        if map.pixel_extent().is_none() {
            return Err(CampaignServiceError::Validation(format!(
                "Map must be at most {} pixels per side",
                MAX_SCENE_PIXELS
            )));
        }

        self.repository.save_map(&map).await?;
        info!(map_id = %map.id, "Created map: {}", map.name);
        Ok(map)
    }

    #[instrument(skip(self))]
    async fn get_map(&self, id: MapId) -> ServiceResult<MapEntity> {
        self.repository
            .get_map(id)
            .await?
            .ok_or_else(|| CampaignServiceError::NotFound(format!("Map {}", id)))
    }

    #[instrument(skip(self))]
    async fn list_maps(&self, campaign_id: CampaignId) -> ServiceResult<Vec<MapEntity>> {
        self.require_campaign(campaign_id).await?;
        Ok(self.repository.list_maps(campaign_id).await?)
    }

    #[instrument(skip(self, request), fields(campaign_id = %campaign_id, name = %request.name))]
    async fn create_npc(&self, campaign_id: CampaignId, request: CreateNpcRequest) -> ServiceResult<NpcEntity> {
        Self::validate_name("NPC", &request.name)?;
        self.require_campaign(campaign_id).await?;
        ShapeNormalizer::normalize_actor_stats(request.stats.as_ref())?;

        let mut npc = NpcEntity::new(campaign_id, request.name.trim());
        if let Some(role) = request.role {
            npc = npc.with_role(role);
        }
        if let Some(personality) = request.personality {
            npc = npc.with_personality(personality);
        }
        if let Some(motivation) = request.motivation {
            npc = npc.with_motivation(motivation);
        }
        if let Some(stats) = request.stats {
            npc = npc.with_stats(stats);
        }
        if let Some(token_image) = request.token_image {
            npc = npc.with_token_image(token_image);
        }
        npc.disposition = request.disposition;
        npc.vision = request.vision;

        self.repository.save_npc(&npc).await?;
        info!(npc_id = %npc.id, "Created NPC: {}", npc.name);
        Ok(npc)
    }

    #[instrument(skip(self))]
    async fn list_npcs(&self, campaign_id: CampaignId) -> ServiceResult<Vec<NpcEntity>> {
        self.require_campaign(campaign_id).await?;
        Ok(self.repository.list_npcs(campaign_id).await?)
    }

    #[instrument(skip(self, request), fields(campaign_id = %campaign_id, name = %request.name))]
    async fn create_session(
        &self,
        campaign_id: CampaignId,
        request: CreateSessionRequest,
    ) -> ServiceResult<Session> {
        Self::validate_name("Session", &request.name)?;
        self.require_campaign(campaign_id).await?;

        let mut session = Session::new(campaign_id, request.name.trim());
        if let Some(scenario) = request.scenario {
            session = session.with_scenario(scenario);
        }
        if let Some(map_id) = request.map_id {
            self.repository
                .get_map(map_id)
                .await?
                .filter(|m| m.campaign_id == campaign_id)
                .ok_or_else(|| CampaignServiceError::NotFound(format!("Map {}", map_id)))?;
            session = session.with_map(map_id);
        }
        for npc_id in request.npc_ids {
            self.repository
                .get_npc(npc_id)
                .await?
                .filter(|n| n.campaign_id == campaign_id)
                .ok_or_else(|| CampaignServiceError::NotFound(format!("NPC {}", npc_id)))?;
            if !session.npc_ids.contains(&npc_id) {
                session = session.with_npc(npc_id);
            }
        }

        self.repository.save_session(&session).await?;
        info!(session_id = %session.id, "Created session: {}", session.name);
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn list_sessions(&self, campaign_id: CampaignId) -> ServiceResult<Vec<Session>> {
        self.require_campaign(campaign_id).await?;
        Ok(self.repository.list_sessions(campaign_id).await?)
    }

    #[instrument(skip(self))]
    async fn export_scene(&self, map_id: MapId) -> ServiceResult<SceneDocument> {
        let map = self.get_map(map_id).await?;
        debug!(map_id = %map_id, "Compiling scene for export");
        Ok(SceneCompiler::compile(&map)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::InMemoryCampaignRepository;
    use serde_json::json;

    fn service() -> CampaignServiceImpl {
        CampaignServiceImpl::new(Arc::new(InMemoryCampaignRepository::new()))
    }

    fn map_request(name: &str, details: serde_json::Value) -> CreateMapRequest {
        CreateMapRequest {
            name: name.to_string(),
            session_id: None,
            map_type: None,
            size_tier: MapSizeTier::Small,
            grid_size: None,
            dimensions: None,
            details,
        }
    }

    fn npc_request(name: &str, stats: Option<serde_json::Value>) -> CreateNpcRequest {
        CreateNpcRequest {
            name: name.to_string(),
            role: None,
            personality: None,
            motivation: None,
            stats,
            token_image: None,
            disposition: None,
            vision: None,
        }
    }

    #[tokio::test]
    async fn test_create_campaign_validates_name_and_lore() {
        let service = service();
        let err = service
            .create_campaign(CreateCampaignRequest {
                name: "  ".to_string(),
                lore: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignServiceError::Validation(_)));

        let err = service
            .create_campaign(CreateCampaignRequest {
                name: "Isles".to_string(),
                lore: Some(json!(12)),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignServiceError::Validation(_)));

        let campaign = service
            .create_campaign(CreateCampaignRequest {
                name: " Isles ".to_string(),
                lore: Some(json!({"worldDescription": "Islands"})),
            })
            .await
            .unwrap();
        assert_eq!(campaign.name, "Isles");
        assert_eq!(service.list_campaigns().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_map_and_export_scene() {
        let service = service();
        let campaign = service
            .create_campaign(CreateCampaignRequest {
                name: "Isles".to_string(),
                lore: None,
            })
            .await
            .unwrap();

        let map = service
            .create_map(campaign.id, map_request("Harbor", json!({"rooms": ["Dock"]})))
            .await
            .unwrap();
        assert_eq!(service.list_maps(campaign.id).await.unwrap().len(), 1);

        let scene = service.export_scene(map.id).await.unwrap();
        assert_eq!(scene.name, "Harbor");
        assert_eq!(scene.walls.len(), 4);

        let err = service
            .create_map(campaign.id, map_request("Bad", json!([1])))
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignServiceError::Validation(_)));

        let err = service
            .create_map(CampaignId::new(), map_request("Orphan", json!(null)))
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_map_rejects_oversized_scene() {
        let service = service();
        let campaign = service
            .create_campaign(CreateCampaignRequest {
                name: "Isles".to_string(),
                lore: None,
            })
            .await
            .unwrap();

        let mut huge_grid = map_request("Huge Grid", json!(null));
        huge_grid.grid_size = Some(u32::MAX);
        let err = service.create_map(campaign.id, huge_grid).await.unwrap_err();
        assert!(matches!(err, CampaignServiceError::Validation(_)));

        let mut huge_extent = map_request("Huge Extent", json!(null));
        huge_extent.grid_size = Some(100);
        huge_extent.dimensions = Some((50_000_000, 10));
        let err = service.create_map(campaign.id, huge_extent).await.unwrap_err();
        assert!(matches!(err, CampaignServiceError::Validation(_)));
        assert!(service.list_maps(campaign.id).await.unwrap().is_empty());

        let mut largest = map_request("Largest", json!(null));
        largest.grid_size = Some(64);
        largest.dimensions = Some((1024, 1024));
        let map = service.create_map(campaign.id, largest).await.unwrap();
        let scene = service.export_scene(map.id).await.unwrap();
        assert_eq!((scene.width, scene.height), (MAX_SCENE_PIXELS, MAX_SCENE_PIXELS));
    }

    #[tokio::test]
    async fn test_session_links_must_belong_to_campaign() {
        let service = service();
        let make = |name: &str| CreateCampaignRequest {
            name: name.to_string(),
            lore: None,
        };
        let mine = service.create_campaign(make("Mine")).await.unwrap();
        let other = service.create_campaign(make("Other")).await.unwrap();

        let npc = service
            .create_npc(mine.id, npc_request("Ada", None))
            .await
            .unwrap();
        let foreign = service
            .create_npc(other.id, npc_request("Zed", None))
            .await
            .unwrap();

        let session = service
            .create_session(
                mine.id,
                CreateSessionRequest {
                    name: "Session 1".to_string(),
                    scenario: Some("Meet at the docks".to_string()),
                    map_id: None,
                    npc_ids: vec![npc.id, npc.id],
                },
            )
            .await
            .unwrap();
        assert_eq!(session.npc_ids, vec![npc.id]);

        let err = service
            .create_session(
                mine.id,
                CreateSessionRequest {
                    name: "Session 2".to_string(),
                    scenario: None,
                    map_id: None,
                    npc_ids: vec![foreign.id],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_npc_rejects_unparsable_stats() {
        let service = service();
        let campaign = service
            .create_campaign(CreateCampaignRequest {
                name: "Isles".to_string(),
                lore: None,
            })
            .await
            .unwrap();
        let err = service
            .create_npc(campaign.id, npc_request("Ghost", Some(json!({"hp": "lots"}))))
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_npc_keeps_descriptive_fields() {
        let service = service();
        let campaign = service
            .create_campaign(CreateCampaignRequest {
                name: "Isles".to_string(),
                lore: None,
            })
            .await
            .unwrap();

        let mut request = npc_request(" Vex ", Some(json!({"hp": 12})));
        request.role = Some("Smuggler".to_string());
        request.personality = Some("Sly".to_string());
        request.motivation = Some("Pay off the harbor guild".to_string());
        request.token_image = Some("tokens/vex.webp".to_string());
        let npc = service.create_npc(campaign.id, request).await.unwrap();

        assert_eq!(npc.name, "Vex");
        assert_eq!(npc.role.as_deref(), Some("Smuggler"));
        assert_eq!(npc.personality.as_deref(), Some("Sly"));
        assert_eq!(npc.motivation.as_deref(), Some("Pay off the harbor guild"));
        assert_eq!(npc.stats, Some(json!({"hp": 12})));
        assert_eq!(npc.token_image.as_deref(), Some("tokens/vex.webp"));
        assert_eq!(service.list_npcs(campaign.id).await.unwrap()[0].motivation, npc.motivation);
    }
}
