//! Pipeline entry points for sync operations.
//!
//! [`run_sync`] drives a full run: it wires a [`crate::services::DealSource`]
//! to a [`crate::services::EventSink`] and returns per-stage counters.

pub mod extract;
pub mod filter;
pub mod sync;

pub use sync::{RunOutcome, StageOutcome, run_sync};
