//! Campaign content API routes
//!
//! Ingestion endpoints for AI-generated campaigns, maps, NPCs and sessions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::application::dto::{
    CampaignResponseDto, MapResponseDto, NpcResponseDto, SessionResponseDto,
};
use crate::application::services::{
    CampaignService, CampaignServiceError, CreateCampaignRequest, CreateMapRequest,
    CreateNpcRequest, CreateSessionRequest,
};
use crate::domain::entities::{GridDimensions, MapSizeTier, TokenDisposition, VisionConfig};
use crate::domain::value_objects::{CampaignId, MapId, NpcId, SessionId};
use crate::infrastructure::http::parse_uuid;
use crate::infrastructure::state::AppState;

type ApiError = (StatusCode, String);

pub(crate) fn service_error(e: CampaignServiceError) -> ApiError {
    match e {
        CampaignServiceError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        CampaignServiceError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        CampaignServiceError::Repository(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCampaignBody {
    pub name: String,
    #[serde(default)]
    pub lore: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLoreBody {
    pub lore: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct CreateMapBody {
    pub name: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub map_type: Option<String>,
    #[serde(default)]
    pub size: MapSizeTier,
    #[serde(default)]
    pub grid_size: Option<u32>,
    #[serde(default)]
    pub dimensions: Option<GridDimensions>,
    /// Raw AI map payload
    #[serde(default)]
    pub details: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct CreateNpcBody {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub personality: Option<String>,
    #[serde(default)]
    pub motivation: Option<String>,
    #[serde(default)]
    pub stats: Option<serde_json::Value>,
    #[serde(default)]
    pub token_image: Option<String>,
    #[serde(default)]
    pub disposition: Option<TokenDisposition>,
    #[serde(default)]
    pub vision: Option<VisionConfig>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionBody {
    pub name: String,
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub map_id: Option<String>,
    #[serde(default)]
    pub npc_ids: Vec<String>,
}

/// List all campaigns
pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CampaignResponseDto>>, ApiError> {
    let campaigns = state
        .campaign_service
        .list_campaigns()
        .await
        .map_err(service_error)?;

    Ok(Json(campaigns.into_iter().map(CampaignResponseDto::from).collect()))
}

/// Create a campaign, optionally with its lore
pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCampaignBody>,
) -> Result<(StatusCode, Json<CampaignResponseDto>), ApiError> {
    let campaign = state
        .campaign_service
        .create_campaign(CreateCampaignRequest {
            name: req.name,
            lore: req.lore,
        })
        .await
        .map_err(service_error)?;

    Ok((StatusCode::CREATED, Json(CampaignResponseDto::from(campaign))))
}

pub async fn get_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CampaignResponseDto>, ApiError> {
    let campaign_id = CampaignId::from_uuid(parse_uuid(&id, "campaign")?);
    let campaign = state
        .campaign_service
        .get_campaign(campaign_id)
        .await
        .map_err(service_error)?;

    Ok(Json(CampaignResponseDto::from(campaign)))
}

/// Replace a campaign's lore
pub async fn update_lore(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLoreBody>,
) -> Result<Json<CampaignResponseDto>, ApiError> {
    let campaign_id = CampaignId::from_uuid(parse_uuid(&id, "campaign")?);
    let campaign = state
        .campaign_service
        .update_lore(campaign_id, req.lore)
        .await
        .map_err(service_error)?;

    Ok(Json(CampaignResponseDto::from(campaign)))
}

pub async fn list_maps(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MapResponseDto>>, ApiError> {
    let campaign_id = CampaignId::from_uuid(parse_uuid(&id, "campaign")?);
    let maps = state
        .campaign_service
        .list_maps(campaign_id)
        .await
        .map_err(service_error)?;

    Ok(Json(maps.into_iter().map(MapResponseDto::from).collect()))
}

pub async fn create_map(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateMapBody>,
) -> Result<(StatusCode, Json<MapResponseDto>), ApiError> {
    let campaign_id = CampaignId::from_uuid(parse_uuid(&id, "campaign")?);
    let session_id = req
        .session_id
        .as_deref()
        .map(|raw| parse_uuid(raw, "session").map(SessionId::from_uuid))
        .transpose()?;

    let map = state
        .campaign_service
        .create_map(
            campaign_id,
            CreateMapRequest {
                name: req.name,
                session_id,
                map_type: req.map_type,
                size_tier: req.size,
                grid_size: req.grid_size,
                dimensions: req.dimensions.map(|d| (d.columns, d.rows)),
                details: req.details,
            },
        )
        .await
        .map_err(service_error)?;

    Ok((StatusCode::CREATED, Json(MapResponseDto::from(map))))
}

pub async fn list_npcs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<NpcResponseDto>>, ApiError> {
    let campaign_id = CampaignId::from_uuid(parse_uuid(&id, "campaign")?);
    let npcs = state
        .campaign_service
        .list_npcs(campaign_id)
        .await
        .map_err(service_error)?;

    Ok(Json(npcs.into_iter().map(NpcResponseDto::from).collect()))
}

pub async fn create_npc(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateNpcBody>,
) -> Result<(StatusCode, Json<NpcResponseDto>), ApiError> {
    let campaign_id = CampaignId::from_uuid(parse_uuid(&id, "campaign")?);
    let npc = state
        .campaign_service
        .create_npc(
            campaign_id,
            CreateNpcRequest {
                name: req.name,
                role: req.role,
                personality: req.personality,
                motivation: req.motivation,
                stats: req.stats,
                token_image: req.token_image,
                disposition: req.disposition,
                vision: req.vision,
            },
        )
        .await
        .map_err(service_error)?;

    Ok((StatusCode::CREATED, Json(NpcResponseDto::from(npc))))
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<SessionResponseDto>>, ApiError> {
    let campaign_id = CampaignId::from_uuid(parse_uuid(&id, "campaign")?);
    let sessions = state
        .campaign_service
        .list_sessions(campaign_id)
        .await
        .map_err(service_error)?;

    Ok(Json(sessions.into_iter().map(SessionResponseDto::from).collect()))
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateSessionBody>,
) -> Result<(StatusCode, Json<SessionResponseDto>), ApiError> {
    let campaign_id = CampaignId::from_uuid(parse_uuid(&id, "campaign")?);
    let map_id = req
        .map_id
        .as_deref()
        .map(|raw| parse_uuid(raw, "map").map(MapId::from_uuid))
        .transpose()?;
    let npc_ids = req
        .npc_ids
        .iter()
        .map(|raw| parse_uuid(raw, "NPC").map(NpcId::from_uuid))
        .collect::<Result<Vec<_>, _>>()?;

    let session = state
        .campaign_service
        .create_session(
            campaign_id,
            CreateSessionRequest {
                name: req.name,
                scenario: req.scenario,
                map_id,
                npc_ids,
            },
        )
        .await
        .map_err(service_error)?;

    Ok((StatusCode::CREATED, Json(SessionResponseDto::from(session))))
}
