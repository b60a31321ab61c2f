//! VTT REST client
//!
//! Talks to the virtual tabletop's document API:
//! `GET /api/status`, `POST /api/{collection}` and
//! `PUT /api/{collection}/{id}`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::outbound::{VttCollection, VttError, VttPort};
use crate::infrastructure::config::VttConfig;

/// Client for the VTT document API
pub struct VttClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl VttClient {
    pub fn new(config: &VttConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .context("Failed to build VTT HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/api/{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

/// Create responses carry the new id as `_id` or `id`
#[derive(Debug, Deserialize)]
struct DocumentResponse {
    #[serde(rename = "_id")]
    underscore_id: Option<String>,
    id: Option<String>,
}

fn transport_error(e: reqwest::Error) -> VttError {
    if e.is_decode() {
        VttError::InvalidResponse(e.to_string())
    } else {
        VttError::Unavailable(e.to_string())
    }
}

async fn rejection(response: Response) -> VttError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    match status {
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            VttError::Unavailable(format!("{}: {}", status, message))
        }
        _ => VttError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl VttPort for VttClient {
    async fn health_check(&self) -> Result<bool, VttError> {
        let response = self
            .request(Method::GET, "status")
            .send()
            .await
            .map_err(transport_error)?;

        Ok(response.status().is_success())
    }

    async fn create_document(
        &self,
        collection: &VttCollection,
        body: &serde_json::Value,
    ) -> Result<String, VttError> {
        let path = collection.path();
        debug!(collection = %path, "Creating VTT document");

        let response = self
            .request(Method::POST, &path)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let created: DocumentResponse = response.json().await.map_err(transport_error)?;
        created
            .underscore_id
            .or(created.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| VttError::InvalidResponse("create response has no document id".to_string()))
    }

    async fn update_document(
        &self,
        collection: &VttCollection,
        external_id: &str,
        body: &serde_json::Value,
    ) -> Result<(), VttError> {
        let path = format!("{}/{}", collection.path(), external_id);
        debug!(collection = %collection.path(), external_id, "Updating VTT document");

        let response = self
            .request(Method::PUT, &path)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(VttError::StaleReference(external_id.to_string())),
            _ => Err(rejection(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::{get, post, put},
        Json, Router,
    };
    use serde_json::json;

    async fn spawn_vtt() -> String {
        let app = Router::new()
            .route("/api/status", get(|| async { "ok" }))
            .route(
                "/api/scenes",
                post(|| async { Json(json!({"_id": "scene-1", "name": "Harbor"})) }),
            )
            .route(
                "/api/scenes/{id}",
                put(|Path(id): Path<String>| async move {
                    if id == "gone" {
                        AxumStatus::NOT_FOUND
                    } else {
                        AxumStatus::OK
                    }
                }),
            )
            .route(
                "/api/scenes/{id}/tokens",
                post(|| async { "not a document" }),
            )
            .route(
                "/api/actors",
                post(|| async { (AxumStatus::UNPROCESSABLE_ENTITY, "bad actor") }),
            )
            .route(
                "/api/journal",
                post(|headers: HeaderMap| async move {
                    let authorized = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        == Some("Bearer secret");
                    if authorized {
                        Ok(Json(json!({"id": "journal-1"})))
                    } else {
                        Err(AxumStatus::UNAUTHORIZED)
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    fn client(base_url: &str, api_key: Option<&str>) -> VttClient {
        VttClient::new(&VttConfig {
            base_url: base_url.to_string(),
            api_key: api_key.map(str::to_string),
            request_timeout_ms: 5_000,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_update_documents() {
        let base = spawn_vtt().await;
        let vtt = client(&base, None);

        assert!(vtt.health_check().await.unwrap());

        let id = vtt
            .create_document(&VttCollection::Scenes, &json!({"name": "Harbor"}))
            .await
            .unwrap();
        assert_eq!(id, "scene-1");

        vtt.update_document(&VttCollection::Scenes, &id, &json!({}))
            .await
            .unwrap();
        let err = vtt
            .update_document(&VttCollection::Scenes, "gone", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, VttError::StaleReference(ref id) if id == "gone"));
    }

    #[tokio::test]
    async fn test_error_responses_are_classified() {
        let base = spawn_vtt().await;
        let vtt = client(&base, None);

        let err = vtt
            .create_document(&VttCollection::Actors, &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, VttError::Rejected { status: 422, ref message } if message == "bad actor"));

        let tokens = VttCollection::Tokens {
            scene_id: "scene-1".to_string(),
        };
        let err = vtt.create_document(&tokens, &json!({})).await.unwrap_err();
        assert!(matches!(err, VttError::InvalidResponse(_)));

        let err = vtt
            .create_document(&VttCollection::JournalEntries, &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, VttError::Rejected { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_api_key_is_sent_as_bearer_token() {
        let base = spawn_vtt().await;
        let vtt = client(&base, Some("secret"));
        let id = vtt
            .create_document(&VttCollection::JournalEntries, &json!({"name": "Lore"}))
            .await
            .unwrap();
        assert_eq!(id, "journal-1");
    }

    #[tokio::test]
    async fn test_unreachable_vtt_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let vtt = client(&format!("http://{}", addr), None);
        assert!(matches!(
            vtt.health_check().await,
            Err(VttError::Unavailable(_))
        ));
    }
}
