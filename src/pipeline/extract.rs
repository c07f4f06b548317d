// src/pipeline/extract.rs

//! Contact and attribution extraction.
//!
//! Pure lookups over a record. Field names vary between deployments, so
//! each value is probed under an ordered list of observed spellings;
//! absence is a normal outcome, handled by the orchestrator.

use crate::models::Record;

/// Top-level fields probed for an email, in order.
const EMAIL_FIELDS: [&str; 4] = ["email", "emailcontato", "email_contato", "emailCliente"];

/// Fields probed for the marketing medium, in order.
const MEDIUM_FIELDS: [&str; 5] = ["midia", "media", "origem", "source", "traffic_medium"];

/// Fields probed for the marketing campaign, in order.
const CAMPAIGN_FIELDS: [&str; 3] = ["campanha", "campaign", "traffic_campaign"];

/// Extract the lead email from a record.
///
/// The nested lead object wins when it carries a plausible address;
/// otherwise the top-level spellings are probed in order. A value only
/// counts as an address when it contains `'@'`.
pub fn email(record: &Record) -> Option<&str> {
    if let Some(value) = record.nested_text("lead", "email") {
        if value.contains('@') {
            return Some(value);
        }
    }

    EMAIL_FIELDS
        .iter()
        .filter_map(|key| record.text(key))
        .find(|value| value.contains('@'))
}

/// Extract the medium and campaign attribution values.
///
/// Each resolves independently through its own fallback list.
pub fn attribution(record: &Record) -> (Option<&str>, Option<&str>) {
    (
        record.first_text(&MEDIUM_FIELDS),
        record.first_text(&CAMPAIGN_FIELDS),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn make_record(value: serde_json::Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_email_prefers_nested_lead() {
        let record = make_record(json!({
            "lead": {"email": "a@b.com"},
            "email": "shadowed@x.com"
        }));
        assert_eq!(email(&record), Some("a@b.com"));
    }

    #[test]
    fn test_email_top_level_fallback_order() {
        let record = make_record(json!({"emailcontato": "c@d.com"}));
        assert_eq!(email(&record), Some("c@d.com"));

        let record = make_record(json!({
            "email_contato": "late@x.com",
            "email": "first@x.com"
        }));
        assert_eq!(email(&record), Some("first@x.com"));
    }

    #[test]
    fn test_email_requires_at_sign() {
        let record = make_record(json!({
            "lead": {"email": "not-an-address"},
            "email": "also-bad",
            "emailCliente": "real@x.com"
        }));
        assert_eq!(email(&record), Some("real@x.com"));
    }

    #[test]
    fn test_email_absent() {
        let record = make_record(json!({"codigo": 7, "telefone": "11 99999-0000"}));
        assert_eq!(email(&record), None);
    }

    #[test]
    fn test_attribution_fallback_lists() {
        let record = make_record(json!({
            "origem": "facebook",
            "campaign": "verao-2024"
        }));

        let (medium, campaign) = attribution(&record);
        assert_eq!(medium, Some("facebook"));
        assert_eq!(campaign, Some("verao-2024"));
    }

    #[test]
    fn test_attribution_first_spelling_wins() {
        let record = make_record(json!({
            "midia": "instagram",
            "origem": "portal",
            "traffic_campaign": "late",
            "campanha": "lancamento"
        }));

        let (medium, campaign) = attribution(&record);
        assert_eq!(medium, Some("instagram"));
        assert_eq!(campaign, Some("lancamento"));
    }

    #[test]
    fn test_attribution_ignores_empty_and_non_string_values() {
        let record = make_record(json!({
            "midia": "",
            "media": 5,
            "origem": "indicacao"
        }));

        let (medium, campaign) = attribution(&record);
        assert_eq!(medium, Some("indicacao"));
        assert_eq!(campaign, None);
    }
}
