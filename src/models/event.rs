//! Conversion event data structure.

use crate::models::Stage;

/// A conversion event bound for the marketing API.
///
/// One event is built per qualifying deal record and dropped after
/// dispatch; nothing is persisted across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionEvent {
    /// Funnel stage the lead reached
    pub stage: Stage,

    /// Lead email address
    pub email: String,

    /// Marketing medium, when the record carries one
    pub medium: Option<String>,

    /// Marketing campaign, when the record carries one
    pub campaign: Option<String>,
}
