//! Extraction adapter. Turns raw model text into structured values.
//!
//! The prompts ask for JSON-only output. Models still wrap objects in prose
//! or code fences now and then, so `extract_answer` falls back to scanning
//! from the first `{` to the last `}`. The address and needs readers parse
//! the full text strictly and treat any failure as "nothing found".

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::IntakeError;

use super::model::{Needs, TransportMode};

/// Answer returned when the model produced JSON that is neither an object
/// nor a primitive.
pub const UNEXPECTED_FORMAT: &str = "Unexpected response format.";

/// Extract the displayable answer from the model's reply.
///
/// - Valid JSON as a whole: an object yields its `answer` field, a string
///   yields itself, a number or bool its text form, anything else
///   [`UNEXPECTED_FORMAT`].
/// - Otherwise the text must contain `{`. The slice from the first `{` to
///   the last `}` must parse, and its `answer` field is returned.
pub fn extract_answer(raw: &str) -> Result<String, IntakeError> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return answer_from_value(value);
    }

    let Some(start) = trimmed.find('{') else {
        warn!(response = trimmed, "Model reply contains no JSON object");
        return Err(IntakeError::InvalidModelOutput(format!(
            "no JSON object in model output: {trimmed}"
        )));
    };

    let slice = object_slice(trimmed, start);
    let value: Value = serde_json::from_str(slice).map_err(|e| {
        warn!(error = %e, response = trimmed, "Model reply is not valid JSON");
        IntakeError::InvalidModelOutput(format!("{e}: {slice}"))
    })?;

    answer_from_value(value)
}

/// First `{` through the last `}` after it, or the rest of the text when
/// there is no closing brace.
fn object_slice(text: &str, start: usize) -> &str {
    match text.rfind('}') {
        Some(end) if end > start => &text[start..=end],
        _ => &text[start..],
    }
}

fn answer_from_value(value: Value) -> Result<String, IntakeError> {
    match value {
        Value::Object(obj) => match obj.get("answer") {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            _ => Err(IntakeError::MissingField("answer".to_string())),
        },
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Array(_) | Value::Null => Ok(UNEXPECTED_FORMAT.to_string()),
    }
}

/// Extract the destination from an extraction reply.
///
/// The whole text must be a JSON object with a non-blank `addressInfo`.
/// Numbers and bools are taken in their text form. Anything else, including
/// a parse failure, is `None`.
pub fn extract_address(raw: &str) -> Option<String> {
    let obj = parse_object(raw)?;
    let address = match obj.get("addressInfo")? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!address.is_empty()).then_some(address)
}

/// Extract a needs record from the `needs` object of an extraction reply.
///
/// Fields are read one by one over [`build_needs_defaults`], so absent or
/// unreadable fields keep their defaults. Unknown transport modes are
/// dropped. The result is normalized.
pub fn extract_needs(raw: &str) -> Option<Needs> {
    let obj = parse_object(raw)?;
    let needs = obj.get("needs")?.as_object()?;

    let mut out = build_needs_defaults();
    if let Some(v) = needs.get("fromWhere") {
        out.from_where = read_strings(v);
    }
    if let Some(v) = needs.get("toWhere") {
        out.to_where = read_strings(v);
    }
    if let Some(v) = needs.get("transportation") {
        out.transportation = read_strings(v)
            .iter()
            .filter_map(|label| {
                let mode = TransportMode::from_label(label);
                if mode.is_none() {
                    debug!(label = %label, "Dropping unknown transport mode");
                }
                mode
            })
            .collect();
    }
    if let Some(b) = needs.get("interchangeability").and_then(read_bool) {
        out.interchangeability = b;
    }
    let bound = |key: &str, default: i32| needs.get(key).and_then(read_i32).unwrap_or(default);
    out.travel_time_min = bound("travelTimeMin", out.travel_time_min);
    out.travel_time_max = bound("travelTimeMax", out.travel_time_max);
    out.transfer_count_min = bound("transferCountMin", out.transfer_count_min);
    out.transfer_count_max = bound("transferCountMax", out.transfer_count_max);

    Some(out.normalized())
}

/// The needs record used whenever one must exist but nothing was computed.
pub fn build_needs_defaults() -> Needs {
    Needs::default()
}

fn parse_object(raw: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Object(obj)) => Some(obj),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "Extraction reply is not JSON, treating as empty");
            None
        }
    }
}

fn read_strings(value: &Value) -> Vec<String> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    items
        .into_iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn read_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn read_i32(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .and_then(|i| i32::try_from(i).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── extract_answer ──────────────────────────────────────────────

    #[test]
    fn answer_from_object() {
        assert_eq!(
            extract_answer(r#"{"answer": "Where do you work?"}"#).unwrap(),
            "Where do you work?"
        );
    }

    #[test]
    fn answer_from_bare_string() {
        assert_eq!(extract_answer(r#""Where do you work?""#).unwrap(), "Where do you work?");
    }

    #[test]
    fn answer_skips_leading_prose() {
        let raw = "Sure, here is my reply:\n{\"userId\": \"u1\", \"answer\": \"How long is OK?\"}\nThanks!";
        assert_eq!(extract_answer(raw).unwrap(), "How long is OK?");
    }

    #[test]
    fn answer_inside_code_fence() {
        let raw = "```json\n{\"answer\": \"Which station?\"}\n```";
        assert_eq!(extract_answer(raw).unwrap(), "Which station?");
    }

    #[test]
    fn answer_stringifies_primitives() {
        assert_eq!(extract_answer("42").unwrap(), "42");
        assert_eq!(extract_answer(r#"{"answer": 2}"#).unwrap(), "2");
    }

    #[test]
    fn prose_without_brace_is_invalid() {
        let err = extract_answer("Sorry, I cannot help with that.").unwrap_err();
        assert!(matches!(err, IntakeError::InvalidModelOutput(_)));
        assert!(matches!(extract_answer(""), Err(IntakeError::InvalidModelOutput(_))));
    }

    #[test]
    fn broken_object_is_invalid() {
        let err = extract_answer("reply: {\"answer\": \"unterminated").unwrap_err();
        assert!(matches!(err, IntakeError::InvalidModelOutput(_)));
    }

    #[test]
    fn object_without_answer_is_missing_field() {
        let err = extract_answer(r#"{"reply": "hi"}"#).unwrap_err();
        assert!(matches!(err, IntakeError::MissingField(ref f) if f == "answer"));
        let err = extract_answer(r#"{"answer": null}"#).unwrap_err();
        assert!(matches!(err, IntakeError::MissingField(_)));
    }

    #[test]
    fn array_is_unexpected_format() {
        assert_eq!(extract_answer(r#"["a", "b"]"#).unwrap(), UNEXPECTED_FORMAT);
    }

    // ── extract_address ─────────────────────────────────────────────

    #[test]
    fn address_found() {
        assert_eq!(
            extract_address(r#"{"addressInfo": "Gangnam Station"}"#).as_deref(),
            Some("Gangnam Station")
        );
    }

    #[test]
    fn address_absent_or_blank() {
        assert!(extract_address(r#"{}"#).is_none());
        assert!(extract_address(r#"{"addressInfo": null}"#).is_none());
        assert!(extract_address(r#"{"addressInfo": "  "}"#).is_none());
        assert!(extract_address(r#"{"addressInfo": ["Gangnam"]}"#).is_none());
    }

    #[test]
    fn numeric_address_is_stringified() {
        assert_eq!(extract_address(r#"{"addressInfo": 1600}"#).as_deref(), Some("1600"));
    }

    #[test]
    fn address_parse_failure_is_swallowed() {
        // No substring scanning here, unlike extract_answer.
        assert!(extract_address("The place is {\"addressInfo\": \"Gangnam\"}").is_none());
        assert!(extract_address("not json").is_none());
    }

    // ── extract_needs ───────────────────────────────────────────────

    #[test]
    fn needs_read_over_defaults() {
        let raw = r#"{
            "addressInfo": "Gangnam Station",
            "needs": {
                "fromWhere": ["Mapo"],
                "toWhere": ["Gangnam Station"],
                "transportation": ["subway", "bus", "taxi"],
                "interchangeability": "false",
                "travelTimeMax": "30",
                "transferCountMin": 0,
                "transferCountMax": 1
            }
        }"#;
        let needs = extract_needs(raw).unwrap();
        assert_eq!(needs.from_where, vec!["Mapo"]);
        assert_eq!(needs.to_where, vec!["Gangnam Station"]);
        assert_eq!(needs.transportation, vec![TransportMode::Metro, TransportMode::Bus]);
        assert!(!needs.interchangeability);
        assert_eq!((needs.travel_time_min, needs.travel_time_max), (30, 30));
        assert_eq!((needs.transfer_count_min, needs.transfer_count_max), (0, 1));
        assert!(needs.is_complete());
    }

    #[test]
    fn needs_absent_is_none() {
        assert!(extract_needs(r#"{"addressInfo": "Gangnam"}"#).is_none());
        assert!(extract_needs(r#"{"needs": "soon"}"#).is_none());
        assert!(extract_needs("garbage").is_none());
    }

    #[test]
    fn partial_needs_is_incomplete() {
        let needs = extract_needs(r#"{"needs": {"toWhere": "Gangnam Station"}}"#).unwrap();
        assert_eq!(needs.to_where, vec!["Gangnam Station"]);
        assert!(needs.from_where.is_empty());
        assert!(!needs.is_complete());
        assert!(needs.interchangeability);
    }

    #[test]
    fn defaults_builder() {
        let n = build_needs_defaults();
        assert!(n.interchangeability);
        assert!(n.from_where.is_empty() && n.to_where.is_empty() && n.transportation.is_empty());
        assert_eq!(
            [n.travel_time_min, n.travel_time_max, n.transfer_count_min, n.transfer_count_max],
            [-1; 4]
        );
    }
}
