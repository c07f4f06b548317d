// src/pipeline/sync.rs

//! Deal-to-conversion sync pipeline.
//!
//! One run walks the stages in fixed order; stages are isolated, so a
//! dead endpoint or a poisoned record only dents its own counters. The
//! only state shared across stages is the per-run dedup set, and nothing
//! survives the run.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};

use crate::error::Result;
use crate::models::{ConversionEvent, FilterMode, Record, Stage, SyncConfig};
use crate::pipeline::{extract, filter};
use crate::services::{DealSource, EventSink};

/// Counters for one processed stage.
#[derive(Debug, Clone, Copy)]
pub struct StageOutcome {
    pub stage: Stage,
    /// Records processed after any client-side filtering
    pub records: usize,
    /// Events accepted by the destination
    pub sent: usize,
    /// Records skipped for missing email
    pub no_email: usize,
    /// Records skipped as duplicates within this run
    pub duplicates: usize,
}

impl StageOutcome {
    fn new(stage: Stage) -> Self {
        Self {
            stage,
            records: 0,
            sent: 0,
            no_email: 0,
            duplicates: 0,
        }
    }
}

/// Summary of a full sync run.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub stages: Vec<StageOutcome>,
    /// Whether the idle-run diagnostic event went out
    pub test_event_sent: bool,
}

impl RunOutcome {
    /// Events delivered, including the diagnostic event when one was sent.
    pub fn total_sent(&self) -> usize {
        let sent: usize = self.stages.iter().map(|s| s.sent).sum();
        sent + usize::from(self.test_event_sent)
    }

    pub fn total_records(&self) -> usize {
        self.stages.iter().map(|s| s.records).sum()
    }

    pub fn total_no_email(&self) -> usize {
        self.stages.iter().map(|s| s.no_email).sum()
    }

    pub fn total_duplicates(&self) -> usize {
        self.stages.iter().map(|s| s.duplicates).sum()
    }
}

/// Run the full sync: probe the source, then fetch, filter, extract and
/// deliver for each stage in order.
pub async fn run_sync(
    config: &SyncConfig,
    source: &dyn DealSource,
    sink: &dyn EventSink,
) -> Result<RunOutcome> {
    run_at(config, source, sink, Local::now().naive_local()).await
}

async fn run_at(
    config: &SyncConfig,
    source: &dyn DealSource,
    sink: &dyn EventSink,
    now: NaiveDateTime,
) -> Result<RunOutcome> {
    log::info!("Starting Imoview -> RD Station sync...");

    if let Err(e) = source.check_connection().await {
        log::error!("Source connection test failed: {e}");
        return Err(e);
    }

    let cutoff = filter::cutoff_for(config.filter_mode, config.lookback_hours, now);
    log::info!(
        "Cutoff for this run ({} mode): {}",
        config.filter_mode,
        cutoff.format("%d/%m/%Y %H:%M")
    );

    let since = match config.filter_mode {
        FilterMode::Server => Some(cutoff),
        FilterMode::Client => None,
    };

    let mut outcome = RunOutcome::default();
    let mut seen: HashSet<(String, Stage)> = HashSet::new();

    for stage in Stage::ALL {
        log::info!(
            "=== Processing stage {stage} ({}) ===",
            stage.conversion_identifier()
        );

        let records = match source.fetch_deals(stage, since).await {
            Ok(records) => records,
            Err(e) => {
                log::error!("Fetching stage {stage} failed: {e}");
                Vec::new()
            }
        };

        let records = match config.filter_mode {
            FilterMode::Client => filter::filter_by_date(records, stage, cutoff),
            FilterMode::Server => records,
        };

        let stage_outcome = process_stage(config, sink, stage, records, &mut seen).await;
        log::info!(
            "Stage {stage}: {} sent, {} without email, {} duplicates",
            stage_outcome.sent,
            stage_outcome.no_email,
            stage_outcome.duplicates
        );
        outcome.stages.push(stage_outcome);
    }

    if outcome.total_sent() == 0 && config.send_test_event {
        outcome.test_event_sent = send_test_event(config, sink).await;
    }

    log::info!(
        "Sync complete. {} events sent from {} records ({} without email, {} duplicates).",
        outcome.total_sent(),
        outcome.total_records(),
        outcome.total_no_email(),
        outcome.total_duplicates()
    );

    Ok(outcome)
}

/// Process one stage's records against the shared dedup set.
async fn process_stage(
    config: &SyncConfig,
    sink: &dyn EventSink,
    stage: Stage,
    records: Vec<Record>,
    seen: &mut HashSet<(String, Stage)>,
) -> StageOutcome {
    let mut outcome = StageOutcome::new(stage);
    outcome.records = records.len();
    log::info!("Processing {} stage {stage} records...", records.len());

    for record in &records {
        let Some(email) = extract::email(record) else {
            outcome.no_email += 1;
            log::warn!("Record {} has no email", record.display_id());
            continue;
        };

        let key = (email.to_string(), stage);
        if seen.contains(&key) {
            outcome.duplicates += 1;
            log::info!("Email {email} already processed for stage {stage}, skipping");
            continue;
        }

        let (medium, campaign) = extract::attribution(record);
        log::info!(
            "Processing deal {} (email: {email}, medium: {}, campaign: {})",
            record.display_id(),
            medium.unwrap_or("-"),
            campaign.unwrap_or("-")
        );

        let event = ConversionEvent {
            stage,
            email: email.to_string(),
            medium: medium.map(str::to_string),
            campaign: campaign.map(str::to_string),
        };

        // The key is only marked after an accepted delivery, so a later
        // record with the same email can retry a failed send.
        match sink.deliver(&event).await {
            Ok(_) => {
                outcome.sent += 1;
                seen.insert(key);
            }
            Err(e) => log::warn!("Delivery failed for {email} at stage {stage}: {e}"),
        }

        pause(config.dispatch_delay_ms).await;
    }

    outcome
}

/// Deliver the idle-run diagnostic event.
async fn send_test_event(config: &SyncConfig, sink: &dyn EventSink) -> bool {
    log::info!("No events sent this run. Sending diagnostic test event...");
    let event = ConversionEvent {
        stage: Stage::Visit,
        email: config.test_event_email.clone(),
        medium: Some("teste".to_string()),
        campaign: Some("teste".to_string()),
    };

    match sink.deliver(&event).await {
        Ok(_) => {
            log::info!("Test event delivered to {}", event.email);
            true
        }
        Err(e) => {
            log::warn!("Test event delivery failed: {e}");
            false
        }
    }
}

async fn pause(delay_ms: u64) {
    let delay = Duration::from_millis(delay_ms);
    if delay.as_millis() > 0 {
        tokio::time::sleep(delay).await;
    }
}
