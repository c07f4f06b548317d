//! Clients for the external APIs.
//!
//! The orchestrator talks to both ends of the bridge through the traits
//! defined here, so tests can substitute in-memory fakes for the real
//! HTTP clients.

pub mod imoview;
pub mod rdstation;

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::error::Result;
use crate::models::{ConversionEvent, Record, Stage};

// Re-export for convenience
pub use imoview::ImoviewClient;
pub use rdstation::RdStationClient;

/// Delivery tier that ultimately accepted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPath {
    /// Current events API
    Events,
    /// Legacy API, JSON body
    Legacy,
    /// Legacy API, form-encoded body
    LegacyForm,
}

impl fmt::Display for DeliveryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeliveryPath::Events => "events API",
            DeliveryPath::Legacy => "legacy API",
            DeliveryPath::LegacyForm => "legacy API (form)",
        })
    }
}

/// Trait for deal record sources.
#[async_trait]
pub trait DealSource: Send + Sync {
    /// Cheap connectivity probe run before any stage is processed.
    async fn check_connection(&self) -> Result<()>;

    /// Fetch every available record for a stage.
    ///
    /// `since` asks the source to filter server-side; `None` requests the
    /// unfiltered set for client-side filtering.
    async fn fetch_deals(
        &self,
        stage: Stage,
        since: Option<NaiveDateTime>,
    ) -> Result<Vec<Record>>;
}

/// Trait for conversion event destinations.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one event, reporting which path accepted it.
    async fn deliver(&self, event: &ConversionEvent) -> Result<DeliveryPath>;
}
