// src/pipeline/filter.rs

//! Stage-aware date filtering.
//!
//! Each stage keeps its relevant date somewhere else: visits on the
//! record itself, proposals inside nested negotiation entries, sales
//! inside nested closing entries. When the stage-specific spot is empty
//! the generic bookkeeping dates are probed instead, and a record with no
//! readable date at all simply does not qualify.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crate::models::{FilterMode, Record, Stage};
use crate::utils::date::parse_flexible;

/// Generic date fields probed when no stage-specific date is readable.
const GENERIC_DATE_FIELDS: [&str; 8] = [
    "datainclusao",
    "dataInclusao",
    "data_inclusao",
    "dataalteracao",
    "dataAlteracao",
    "data_alteracao",
    "dataCadastro",
    "data",
];

/// Cutoff instant for a run.
///
/// Client mode looks back a fixed number of hours from `now`; server mode
/// anchors at the start of the current calendar day, matching what the
/// source API is asked to filter by.
pub fn cutoff_for(mode: FilterMode, lookback_hours: u32, now: NaiveDateTime) -> NaiveDateTime {
    match mode {
        FilterMode::Client => now - Duration::hours(i64::from(lookback_hours)),
        FilterMode::Server => now.date().and_time(NaiveTime::MIN),
    }
}

/// Keep the records whose most relevant date is at or after the cutoff.
pub fn filter_by_date(records: Vec<Record>, stage: Stage, cutoff: NaiveDateTime) -> Vec<Record> {
    let total = records.len();
    log::info!(
        "Filtering stage {stage} records from {} on",
        cutoff.format("%d/%m/%Y %H:%M")
    );

    let kept: Vec<Record> = records
        .into_iter()
        .filter(|record| relevant_date(record, stage).is_some_and(|date| date >= cutoff))
        .collect();

    log::info!("Filter kept {} of {total} stage {stage} records", kept.len());
    kept
}

/// Most relevant date of a record for the given stage, if any.
pub fn relevant_date(record: &Record, stage: Stage) -> Option<NaiveDateTime> {
    let specific = match stage {
        Stage::Visit => visit_date(record),
        Stage::Proposal => proposal_date(record),
        Stage::Sale => sale_date(record),
    };
    specific.or_else(|| generic_date(record))
}

/// Visit date under either of its two observed spellings. The first
/// spelling present wins even when its value does not parse.
fn visit_date(record: &Record) -> Option<NaiveDateTime> {
    let key = if record.has("datavisita") {
        "datavisita"
    } else if record.has("dataVisita") {
        "dataVisita"
    } else {
        return None;
    };
    record.text(key).and_then(parse_flexible)
}

/// Latest negotiation date across all nested proposal entries.
fn proposal_date(record: &Record) -> Option<NaiveDateTime> {
    record
        .entries("imoveisproposta")
        .iter()
        .flat_map(|proposal| entry_list(proposal, "negociacoes"))
        .filter_map(|negotiation| entry_text(negotiation, "datanegociacao"))
        .filter_map(parse_flexible)
        .max()
}

/// Latest closing date across all nested closing entries.
fn sale_date(record: &Record) -> Option<NaiveDateTime> {
    record
        .entries("imoveisnegocio")
        .iter()
        .filter_map(|closing| entry_text(closing, "datanegocio"))
        .filter_map(parse_flexible)
        .max()
}

/// First generic date field that parses.
fn generic_date(record: &Record) -> Option<NaiveDateTime> {
    GENERIC_DATE_FIELDS
        .iter()
        .find_map(|key| record.text(key).and_then(parse_flexible))
}

fn entry_list<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn entry_text<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
