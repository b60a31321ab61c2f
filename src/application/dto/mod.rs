//! Data Transfer Objects - For API boundaries
//!
//! DTOs live in the application layer so infrastructure (HTTP, the VTT client)
//! can serialize/deserialize without pulling wire formats into the domain model.

pub mod campaign;
pub mod sync_report;
pub mod vtt_documents;

pub use campaign::*;
pub use sync_report::*;
pub use vtt_documents::*;
