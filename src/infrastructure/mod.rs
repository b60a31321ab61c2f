//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Persistence: in-memory and SQLite repositories
//! - HTTP: REST API routes
//! - VTT client: the virtual tabletop's document API
//! - Config: Application configuration
//! - State: Shared application state

pub mod config;
pub mod http;
pub mod persistence;
pub mod state;
pub mod vtt_client;
