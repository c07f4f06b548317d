// src/models/mod.rs

//! Domain models for the sync application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod event;
mod record;
mod stage;

// Re-export all public types
pub use config::{Config, FilterMode, ImoviewConfig, RdStationConfig, SyncConfig};
pub use event::ConversionEvent;
pub use record::Record;
pub use stage::Stage;
