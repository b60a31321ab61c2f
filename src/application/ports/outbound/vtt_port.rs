//! VTT port - The external virtual tabletop's document API
//!
//! The VTT exposes create/update calls per document collection and returns a
//! stable external id for each created document.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum VttError {
    /// The VTT could not be reached at all
    #[error("VTT unavailable: {0}")]
    Unavailable(String),
    /// The VTT answered but refused the request
    #[error("VTT rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// An update targeted an external id the VTT no longer knows
    #[error("VTT document {0} no longer exists")]
    StaleReference(String),
    #[error("Malformed VTT response: {0}")]
    InvalidResponse(String),
}

/// A document collection on the VTT
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VttCollection {
    Scenes,
    Actors,
    JournalEntries,
    /// Tokens are embedded in the scene they are placed on
    Tokens { scene_id: String },
}

impl VttCollection {
    /// Path below `/api/` for this collection
    pub fn path(&self) -> String {
        match self {
            VttCollection::Scenes => "scenes".to_string(),
            VttCollection::Actors => "actors".to_string(),
            VttCollection::JournalEntries => "journal".to_string(),
            VttCollection::Tokens { scene_id } => format!("scenes/{}/tokens", scene_id),
        }
    }
}

/// Outbound port for the VTT document API
#[async_trait]
pub trait VttPort: Send + Sync {
    /// Whether the VTT is reachable and accepting requests
    async fn health_check(&self) -> Result<bool, VttError>;

    /// Create a document and return its new external id
    async fn create_document(
        &self,
        collection: &VttCollection,
        body: &serde_json::Value,
    ) -> Result<String, VttError>;

    /// Replace the document with the given external id
    async fn update_document(
        &self,
        collection: &VttCollection,
        external_id: &str,
        body: &serde_json::Value,
    ) -> Result<(), VttError>;
}
