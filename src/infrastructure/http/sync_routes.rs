//! VTT sync API routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::application::dto::{CampaignSyncStatusDto, SyncBadgeDto, SyncReport, SyncScope};
use crate::application::services::SyncError;
use crate::domain::value_objects::{CampaignId, MapId, NpcId, SessionId};
use crate::infrastructure::http::parse_uuid;
use crate::infrastructure::state::AppState;

type ApiError = (StatusCode, String);

fn sync_error(e: SyncError) -> ApiError {
    let status = match &e {
        SyncError::AlreadyInFlight(_) => StatusCode::CONFLICT,
        SyncError::ExternalUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        SyncError::NotFound(_) => StatusCode::NOT_FOUND,
        SyncError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    /// False when no sync was running for the campaign
    pub cancelled: bool,
}

#[derive(Debug, Serialize)]
pub struct VttStatusResponse {
    pub connected: bool,
}

/// Sync every map, NPC and the lore of a campaign
pub async fn sync_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SyncReport>, ApiError> {
    let campaign_id = CampaignId::from_uuid(parse_uuid(&id, "campaign")?);
    let report = state
        .sync_service
        .sync_scope(SyncScope::Campaign(campaign_id))
        .await
        .map_err(sync_error)?;

    Ok(Json(report))
}

/// Sync the maps, NPCs, scenario and tokens of one session
pub async fn sync_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SyncReport>, ApiError> {
    let session_id = SessionId::from_uuid(parse_uuid(&id, "session")?);
    let report = state
        .sync_service
        .sync_scope(SyncScope::Session(session_id))
        .await
        .map_err(sync_error)?;

    Ok(Json(report))
}

pub async fn cancel_sync(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let campaign_id = CampaignId::from_uuid(parse_uuid(&id, "campaign")?);
    Ok(Json(CancelResponse {
        cancelled: state.sync_service.cancel(campaign_id),
    }))
}

pub async fn sync_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CampaignSyncStatusDto>, ApiError> {
    let campaign_id = CampaignId::from_uuid(parse_uuid(&id, "campaign")?);
    let status = state
        .sync_service
        .sync_status(campaign_id)
        .await
        .map_err(sync_error)?;

    Ok(Json(status))
}

pub async fn sync_map(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SyncBadgeDto>, ApiError> {
    let map_id = MapId::from_uuid(parse_uuid(&id, "map")?);
    let record = state
        .sync_service
        .sync_map(map_id)
        .await
        .map_err(sync_error)?;

    Ok(Json(SyncBadgeDto::from(&record)))
}

pub async fn sync_npc(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SyncBadgeDto>, ApiError> {
    let npc_id = NpcId::from_uuid(parse_uuid(&id, "NPC")?);
    let record = state
        .sync_service
        .sync_npc(npc_id)
        .await
        .map_err(sync_error)?;

    Ok(Json(SyncBadgeDto::from(&record)))
}

pub async fn sync_lore(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SyncBadgeDto>, ApiError> {
    let campaign_id = CampaignId::from_uuid(parse_uuid(&id, "campaign")?);
    let record = state
        .sync_service
        .sync_campaign_lore(campaign_id)
        .await
        .map_err(sync_error)?;

    Ok(Json(SyncBadgeDto::from(&record)))
}

/// Whether the VTT answers its health check
pub async fn vtt_status(State(state): State<Arc<AppState>>) -> Json<VttStatusResponse> {
    let connected = state.vtt.health_check().await.unwrap_or(false);
    Json(VttStatusResponse { connected })
}
