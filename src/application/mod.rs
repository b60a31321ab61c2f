//! Application layer - Use cases over campaign content
//!
//! This layer contains:
//! - DTOs: VTT wire documents, sync reports, API request/response shapes
//! - Ports: the VTT API and campaign persistence
//! - Services: shape normalization, document compilers, token placement,
//!   sync orchestration, campaign content ingestion

pub mod dto;
pub mod ports;
pub mod services;
