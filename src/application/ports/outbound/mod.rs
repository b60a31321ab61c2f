//! Outbound ports - Interfaces that the application requires from external systems

mod repository_port;
mod vtt_port;

pub use repository_port::CampaignRepositoryPort;
pub use vtt_port::{VttCollection, VttError, VttPort};
