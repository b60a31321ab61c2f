//! HTTP REST API routes

mod campaign_routes;
mod export_routes;
mod sync_routes;

use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::infrastructure::state::AppState;

pub use campaign_routes::*;
pub use export_routes::*;
pub use sync_routes::*;

/// Parse a path or body id, answering 400 when it is not a UUID
pub(crate) fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, (StatusCode, String)> {
    Uuid::parse_str(raw).map_err(|_| (StatusCode::BAD_REQUEST, format!("Invalid {} ID", what)))
}

/// Create all API routes
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Campaign routes
        .route("/api/campaigns", get(campaign_routes::list_campaigns))
        .route("/api/campaigns", post(campaign_routes::create_campaign))
        .route("/api/campaigns/{id}", get(campaign_routes::get_campaign))
        .route("/api/campaigns/{id}/lore", put(campaign_routes::update_lore))
        .route("/api/campaigns/{id}/maps", get(campaign_routes::list_maps))
        .route("/api/campaigns/{id}/maps", post(campaign_routes::create_map))
        .route("/api/campaigns/{id}/npcs", get(campaign_routes::list_npcs))
        .route("/api/campaigns/{id}/npcs", post(campaign_routes::create_npc))
        .route(
            "/api/campaigns/{id}/sessions",
            get(campaign_routes::list_sessions),
        )
        .route(
            "/api/campaigns/{id}/sessions",
            post(campaign_routes::create_session),
        )
        // Sync routes
        .route("/api/campaigns/{id}/sync", post(sync_routes::sync_campaign))
        .route(
            "/api/campaigns/{id}/sync/cancel",
            post(sync_routes::cancel_sync),
        )
        .route(
            "/api/campaigns/{id}/sync/status",
            get(sync_routes::sync_status),
        )
        .route("/api/campaigns/{id}/lore/sync", post(sync_routes::sync_lore))
        .route("/api/sessions/{id}/sync", post(sync_routes::sync_session))
        .route("/api/maps/{id}/sync", post(sync_routes::sync_map))
        .route("/api/npcs/{id}/sync", post(sync_routes::sync_npc))
        .route("/api/vtt/status", get(sync_routes::vtt_status))
        // Export
        .route(
            "/api/maps/{id}/scene-export",
            get(export_routes::export_scene),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::application::ports::outbound::{VttCollection, VttError, VttPort};
    use crate::domain::value_objects::SyncSettings;
    use crate::infrastructure::config::{
        AppConfig, PersistenceBackend, PersistenceConfig, VttConfig,
    };
    use crate::infrastructure::persistence::InMemoryCampaignRepository;

    #[derive(Default)]
    struct CountingVtt {
        next_id: AtomicUsize,
    }

    #[async_trait]
    impl VttPort for CountingVtt {
        async fn health_check(&self) -> Result<bool, VttError> {
            Ok(true)
        }

        async fn create_document(
            &self,
            collection: &VttCollection,
            _body: &Value,
        ) -> Result<String, VttError> {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{}-{}", collection.path().replace('/', "-"), n))
        }

        async fn update_document(
            &self,
            _collection: &VttCollection,
            _external_id: &str,
            _body: &Value,
        ) -> Result<(), VttError> {
            Ok(())
        }
    }

    fn app() -> Router {
        let config = AppConfig {
            server_port: 0,
            persistence: PersistenceConfig {
                backend: PersistenceBackend::Memory,
                sqlite_path: String::new(),
            },
            vtt: VttConfig {
                base_url: "http://vtt.invalid".to_string(),
                api_key: None,
                request_timeout_ms: 1_000,
            },
            sync: SyncSettings::default(),
        };
        let state = AppState::from_parts(
            config,
            Arc::new(InMemoryCampaignRepository::new()),
            Arc::new(CountingVtt::default()),
        );
        create_routes().with_state(Arc::new(state))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_ingest_then_sync_campaign() {
        let app = app();

        let (status, campaign) = send(
            &app,
            "POST",
            "/api/campaigns",
            Some(json!({"name": "Isles", "lore": {"history": "Sunken kings"}})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let campaign_id = campaign["id"].as_str().unwrap().to_string();

        let (status, map) = send(
            &app,
            "POST",
            &format!("/api/campaigns/{}/maps", campaign_id),
            Some(json!({"name": "Harbor", "size": "small", "details": {"rooms": ["Dock"]}})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(map["sync"]["status"], "never");

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/campaigns/{}/npcs", campaign_id),
            Some(json!({"name": "Ada", "role": "Harbormaster"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, report) = send(
            &app,
            "POST",
            &format!("/api/campaigns/{}/sync", campaign_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["scenes"]["success"], 1);
        assert_eq!(report["actors"]["success"], 1);
        assert_eq!(report["journals"]["success"], 1);
        assert_eq!(report["cancelled"], false);

        let (status, sync) = send(
            &app,
            "GET",
            &format!("/api/campaigns/{}/sync/status", campaign_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sync["in_flight"], false);
        assert_eq!(sync["maps"][0]["sync"]["status"], "synced");
        assert_eq!(sync["lore"]["status"], "synced");
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app = app();

        let (status, _) = send(&app, "GET", "/api/campaigns/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let missing = Uuid::new_v4();
        let (status, _) = send(&app, "GET", &format!("/api/campaigns/{}", missing), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "POST", &format!("/api/maps/{}/sync", missing), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "POST",
            "/api/campaigns",
            Some(json!({"name": "Bad", "lore": 42})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(&app, "GET", "/api/vtt/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["connected"], true);
    }

    #[tokio::test]
    async fn test_scene_export_is_an_attachment() {
        let app = app();
        let (_, campaign) = send(&app, "POST", "/api/campaigns", Some(json!({"name": "Isles"}))).await;
        let (_, map) = send(
            &app,
            "POST",
            &format!("/api/campaigns/{}/maps", campaign["id"].as_str().unwrap()),
            Some(json!({"name": "Sea Cave", "details": "A dripping cave"})),
        )
        .await;

        let request = Request::builder()
            .uri(format!("/api/maps/{}/scene-export", map["id"].as_str().unwrap()))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"sea-cave.json\""
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let scene: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(scene["name"], "Sea Cave");
        assert!(scene.get("layout").is_none());
        assert_eq!(scene["walls"].as_array().unwrap().len(), 4);
    }
}
