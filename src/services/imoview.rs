// src/services/imoview.rs

//! Imoview CRM client.
//!
//! Fetches paginated deal listings per funnel stage. The listing endpoint
//! has answered in two shapes over time (a bare record array, or an
//! object with a `lista` array and a server-side total); both are
//! accepted. Pagination is bounded by the configured page cap so a
//! misreported total can never turn into an unbounded crawl.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{ImoviewConfig, Record, Stage};
use crate::services::DealSource;
use crate::utils::http;

/// Header carrying the API key on every Imoview request.
const API_KEY_HEADER: &str = "chave";

/// Deal listing endpoint, relative to the configured base URL.
const DEALS_PATH: &str = "/Atendimento/RetornarAtendimentos";

/// Version probe endpoint used by the connection check.
const VERSION_PATH: &str = "/versao";

/// Format of the server-side `dataInicio` filter parameter.
const SINCE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Client for the Imoview deal listing API.
pub struct ImoviewClient {
    config: ImoviewConfig,
    api_key: String,
    client: Client,
}

impl ImoviewClient {
    /// Create a client with its own bounded-timeout HTTP connection pool.
    pub fn new(config: ImoviewConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = http::create_client(config.timeout_secs)?;
        Ok(Self {
            config,
            api_key: api_key.into(),
            client,
        })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Fetch one listing page for a stage.
    async fn fetch_page(
        &self,
        stage: Stage,
        page: u32,
        since: Option<&str>,
    ) -> Result<DealResponse> {
        let url = format!("{}{DEALS_PATH}", self.base_url());
        let mut request = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("accept", "application/json")
            .query(&[
                ("numeroPagina", page.to_string()),
                ("numeroRegistros", self.config.page_size.to_string()),
                ("finalidade", self.config.purpose.to_string()),
                ("situacao", self.config.situation.to_string()),
                ("fase", stage.phase_code().to_string()),
            ]);
        if let Some(since) = since {
            request = request.query(&[("dataInicio", since)]);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AppError::fetch(
                format!("stage {stage} page {page}"),
                format!("status {status}: {}", http::body_snippet(&body)),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            AppError::fetch(
                format!("stage {stage} page {page}"),
                format!("{e}; body: {}", http::body_snippet(&body)),
            )
        })
    }

    /// Fetch a stage without a date filter, following the server-reported
    /// total for up to `max_pages` pages.
    async fn fetch_unfiltered(&self, stage: Stage) -> Result<Vec<Record>> {
        log::info!("Fetching stage {stage} deals, page 1...");
        let first = self.fetch_page(stage, 1, None).await?;
        let (mut records, total) = first.into_parts(stage, 1);

        let planned = page_plan(total, self.config.page_size, self.config.max_pages);
        log::info!(
            "Received {} of {} reported records for stage {stage}",
            records.len(),
            total
        );

        for page in 2..=planned {
            self.pause().await;
            log::info!("Fetching stage {stage} deals, page {page} of {planned}...");
            match self.fetch_page(stage, page, None).await {
                Ok(response) => {
                    let (more, _) = response.into_parts(stage, page);
                    records.extend(more);
                }
                Err(e) => log::warn!("Skipping stage {stage} page {page}: {e}"),
            }
        }

        Ok(records)
    }

    /// Fetch a stage with the server-side since filter, continuing while
    /// pages come back full.
    async fn fetch_since(&self, stage: Stage, cutoff: NaiveDateTime) -> Result<Vec<Record>> {
        let since = cutoff.format(SINCE_FORMAT).to_string();
        let mut records = Vec::new();
        let mut page = 1u32;

        loop {
            log::info!("Fetching stage {stage} deals since {since}, page {page}...");
            let response = match self.fetch_page(stage, page, Some(&since)).await {
                Ok(response) => response,
                Err(e) if page > 1 => {
                    log::warn!("Stopping stage {stage} pagination at page {page}: {e}");
                    break;
                }
                Err(e) => return Err(e),
            };

            let (more, _) = response.into_parts(stage, page);
            // Only an exactly-full page signals more data behind it.
            let full_page = more.len() == self.config.page_size as usize;
            records.extend(more);

            if !full_page || page >= self.config.max_pages {
                break;
            }
            page += 1;
            self.pause().await;
        }

        log::info!(
            "Received {} records for stage {stage} since {since}",
            records.len()
        );
        Ok(records)
    }

    async fn pause(&self) {
        let delay = Duration::from_millis(self.config.page_delay_ms);
        if delay.as_millis() > 0 {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl DealSource for ImoviewClient {
    async fn check_connection(&self) -> Result<()> {
        let url = format!("{}{VERSION_PATH}", self.base_url());
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        log::info!(
            "Imoview connection test: {status} ({})",
            http::body_snippet(&body)
        );

        if status.is_success() {
            Ok(())
        } else {
            Err(AppError::fetch("connection test", format!("status {status}")))
        }
    }

    async fn fetch_deals(
        &self,
        stage: Stage,
        since: Option<NaiveDateTime>,
    ) -> Result<Vec<Record>> {
        match since {
            None => self.fetch_unfiltered(stage).await,
            Some(cutoff) => self.fetch_since(stage, cutoff).await,
        }
    }
}

/// Wire shape of a deal listing response.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DealResponse {
    Paged {
        #[serde(default)]
        lista: Option<Vec<Record>>,
        #[serde(default, rename = "totalRegistros")]
        total_registros: u64,
    },
    Bare(Vec<Record>),
}

impl DealResponse {
    /// Normalize either response shape into records plus the reported
    /// total. Bare arrays carry no total and read as zero.
    fn into_parts(self, stage: Stage, page: u32) -> (Vec<Record>, u64) {
        match self {
            DealResponse::Paged {
                lista: Some(records),
                total_registros,
            } => (records, total_registros),
            DealResponse::Paged {
                lista: None,
                total_registros,
            } => {
                log::warn!("Stage {stage} page {page} response has no 'lista' array");
                (Vec::new(), total_registros)
            }
            DealResponse::Bare(records) => (records, 0),
        }
    }
}

/// Number of pages worth fetching for a server-reported total, bounded by
/// the page cap.
fn page_plan(total: u64, page_size: u32, max_pages: u32) -> u32 {
    total.div_ceil(u64::from(page_size)).min(u64::from(max_pages)) as u32
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_page_plan_caps_at_max_pages() {
        assert_eq!(page_plan(200, 20, 5), 5);
        assert_eq!(page_plan(10_000, 20, 5), 5);
    }

    #[test]
    fn test_page_plan_partial_last_page() {
        assert_eq!(page_plan(140, 100, 5), 2);
        assert_eq!(page_plan(21, 20, 5), 2);
        assert_eq!(page_plan(20, 20, 5), 1);
    }

    #[test]
    fn test_page_plan_empty_listing() {
        assert_eq!(page_plan(0, 20, 5), 0);
    }

    #[test]
    fn test_response_parses_paged_object() {
        let body = r#"{"lista": [{"codigo": 1}, {"codigo": 2}], "totalRegistros": 57}"#;
        let response: DealResponse = serde_json::from_str(body).unwrap();
        let (records, total) = response.into_parts(Stage::Visit, 1);
        assert_eq!(records.len(), 2);
        assert_eq!(total, 57);
    }

    #[test]
    fn test_response_parses_bare_array() {
        let body = r#"[{"codigo": 1}]"#;
        let response: DealResponse = serde_json::from_str(body).unwrap();
        let (records, total) = response.into_parts(Stage::Visit, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(total, 0);
    }

    #[test]
    fn test_response_without_lista_reads_empty() {
        let body = r#"{"erro": "sem resultados"}"#;
        let response: DealResponse = serde_json::from_str(body).unwrap();
        let (records, total) = response.into_parts(Stage::Visit, 1);
        assert!(records.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_since_parameter_format() {
        let cutoff = NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(cutoff.format(SINCE_FORMAT).to_string(), "10/05/2024 00:00");
    }
}
