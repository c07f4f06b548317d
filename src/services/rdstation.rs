// src/services/rdstation.rs

//! RD Station conversion event client.
//!
//! Delivery is tiered: the current events API first, then the legacy API
//! with a JSON body, then the legacy API with a form-encoded body as a
//! last resort. Sale events skip the events API and start at the legacy
//! tier. Every attempt is logged; the error of the last tier is the one
//! reported when all of them refuse.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{ConversionEvent, RdStationConfig, Stage};
use crate::services::{DeliveryPath, EventSink};
use crate::utils::http;

/// Client for the RD Station conversion APIs.
pub struct RdStationClient {
    config: RdStationConfig,
    public_token: String,
    client: Client,
}

impl RdStationClient {
    /// Create a client with its own bounded-timeout HTTP connection pool.
    pub fn new(config: RdStationConfig, public_token: impl Into<String>) -> Result<Self> {
        let client = http::create_client(config.timeout_secs)?;
        Ok(Self {
            config,
            public_token: public_token.into(),
            client,
        })
    }

    async fn attempt(&self, path: DeliveryPath, event: &ConversionEvent) -> Result<()> {
        let identifier = event.stage.conversion_identifier();
        log::info!("Sending event {identifier} for {} via {path}...", event.email);

        let response = match path {
            DeliveryPath::Events => {
                let payload = EventsPayload {
                    event_type: "CONVERSION",
                    event_family: "CDP",
                    payload: EventsInner {
                        conversion_identifier: identifier,
                        email: &event.email,
                        traffic_medium: event.medium.as_deref(),
                        traffic_campaign: event.campaign.as_deref(),
                    },
                };
                self.client
                    .post(&self.config.events_url)
                    .header("accept", "application/json")
                    .json(&payload)
                    .send()
                    .await?
            }
            DeliveryPath::Legacy => {
                let payload = self.legacy_payload(event, identifier);
                self.client
                    .post(&self.config.legacy_url)
                    .json(&payload)
                    .send()
                    .await?
            }
            DeliveryPath::LegacyForm => {
                let payload = self.legacy_payload(event, identifier);
                self.client
                    .post(&self.config.legacy_url)
                    .form(&payload)
                    .send()
                    .await?
            }
        };

        let status = response.status();
        if status.is_success() {
            log::debug!("{path} accepted event with status {status}");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::delivery(
            path.to_string(),
            format!("status {status}: {}", http::body_snippet(&body)),
        ))
    }

    fn legacy_payload<'a>(
        &'a self,
        event: &'a ConversionEvent,
        identifier: &'a str,
    ) -> LegacyPayload<'a> {
        LegacyPayload {
            token_rdstation: &self.public_token,
            identificador: identifier,
            email: &event.email,
            traffic_medium: event.medium.as_deref(),
            traffic_campaign: event.campaign.as_deref(),
        }
    }
}

#[async_trait]
impl EventSink for RdStationClient {
    async fn deliver(&self, event: &ConversionEvent) -> Result<DeliveryPath> {
        let identifier = event.stage.conversion_identifier();
        let mut last_error = None;

        for &path in tier_plan(event.stage) {
            match self.attempt(path, event).await {
                Ok(()) => {
                    log::info!(
                        "Event {identifier} delivered for {} via {path}",
                        event.email
                    );
                    return Ok(path);
                }
                Err(e) => {
                    log::warn!(
                        "Delivery via {path} failed for {} ({identifier}): {e}",
                        event.email
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::delivery(identifier, "no delivery tier attempted")))
    }
}

/// Delivery tiers attempted for a stage, in order.
fn tier_plan(stage: Stage) -> &'static [DeliveryPath] {
    match stage {
        Stage::Sale => &[DeliveryPath::Legacy, DeliveryPath::LegacyForm],
        Stage::Visit | Stage::Proposal => &[
            DeliveryPath::Events,
            DeliveryPath::Legacy,
            DeliveryPath::LegacyForm,
        ],
    }
}

/// Events API payload envelope.
#[derive(Debug, Serialize)]
struct EventsPayload<'a> {
    event_type: &'static str,
    event_family: &'static str,
    payload: EventsInner<'a>,
}

#[derive(Debug, Serialize)]
struct EventsInner<'a> {
    conversion_identifier: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    traffic_medium: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    traffic_campaign: Option<&'a str>,
}

/// Legacy API payload, shared by the JSON and form-encoded tiers.
#[derive(Debug, Serialize)]
struct LegacyPayload<'a> {
    token_rdstation: &'a str,
    identificador: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    traffic_medium: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    traffic_campaign: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_never_plans_the_events_api() {
        let plan = tier_plan(Stage::Sale);
        assert_eq!(plan, &[DeliveryPath::Legacy, DeliveryPath::LegacyForm]);
        assert!(!plan.contains(&DeliveryPath::Events));
    }

    #[test]
    fn test_visit_falls_back_from_events_to_legacy() {
        let plan = tier_plan(Stage::Visit);
        assert_eq!(plan[0], DeliveryPath::Events);
        assert_eq!(plan[1], DeliveryPath::Legacy);
        assert_eq!(plan[2], DeliveryPath::LegacyForm);
    }

    #[test]
    fn test_events_payload_shape() {
        let payload = EventsPayload {
            event_type: "CONVERSION",
            event_family: "CDP",
            payload: EventsInner {
                conversion_identifier: Stage::Visit.conversion_identifier(),
                email: "a@b.com",
                traffic_medium: Some("cpc"),
                traffic_campaign: None,
            },
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["event_type"], "CONVERSION");
        assert_eq!(value["event_family"], "CDP");
        assert_eq!(
            value["payload"]["conversion_identifier"],
            "imoview-update_Visita"
        );
        assert_eq!(value["payload"]["email"], "a@b.com");
        assert_eq!(value["payload"]["traffic_medium"], "cpc");
        assert!(value["payload"].get("traffic_campaign").is_none());
    }

    #[test]
    fn test_legacy_payload_shape() {
        let payload = LegacyPayload {
            token_rdstation: "tok",
            identificador: Stage::Sale.conversion_identifier(),
            email: "a@b.com",
            traffic_medium: None,
            traffic_campaign: Some("verao"),
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["token_rdstation"], "tok");
        assert_eq!(value["identificador"], "imoview-update_Venda");
        assert_eq!(value["email"], "a@b.com");
        assert!(value.get("traffic_medium").is_none());
        assert_eq!(value["traffic_campaign"], "verao");
    }
}
