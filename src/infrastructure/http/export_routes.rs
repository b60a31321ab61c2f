//! Export API routes

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

use crate::application::services::CampaignService;
use crate::domain::value_objects::MapId;
use crate::infrastructure::http::campaign_routes::service_error;
use crate::infrastructure::http::parse_uuid;
use crate::infrastructure::state::AppState;

/// Download a map's scene document for manual import into the VTT
pub async fn export_scene(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let map_id = MapId::from_uuid(parse_uuid(&id, "map")?);

    let scene = state
        .campaign_service
        .export_scene(map_id)
        .await
        .map_err(service_error)?;

    let json = serde_json::to_string_pretty(&scene)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let disposition = format!("attachment; filename=\"{}.json\"", file_stem(&scene.name));

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        json,
    ))
}

fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let stem = stem.trim_matches('-');
    if stem.is_empty() {
        "scene".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem_is_header_safe() {
        assert_eq!(file_stem("The \"Rusty\" Anchor"), "the--rusty--anchor");
        assert_eq!(file_stem("???"), "scene");
    }
}
