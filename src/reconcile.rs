use serde_json::{Map, Value};

use crate::config::AnalysisProfile;
use crate::models::{text_or_empty, AnalysisResult, RiskLevel};

/// Recovers a JSON object from raw model text.
///
/// Strict parsing is tried first. Only when the text is not JSON at all is
/// the substring between the first `{` and the last `}` tried. Anything that
/// is not an object yields `None`.
pub fn parse_model_output(raw: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => return Some(map),
        Ok(_) => return None,
        Err(_) => {}
    }
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Coerces a parsed object into the response schema. Applying it to its own
/// serialized output gives the same result.
pub fn normalize(mut object: Map<String, Value>, profile: &AnalysisProfile) -> AnalysisResult {
    let summary = object.remove("summary").map(text_or_empty).unwrap_or_default();
    let risk_level = object
        .remove("risk_level")
        .as_ref()
        .and_then(Value::as_str)
        .and_then(RiskLevel::from_schema)
        .unwrap_or(RiskLevel::Medium);
    let confidence = coerce_confidence(object.remove("confidence").as_ref());

    let red_flags = take_list(&mut object, "red_flags");
    let inconsistencies = take_list(&mut object, "inconsistencies");
    let next_steps = take_list(&mut object, "next_steps");
    let safety_notes = profile
        .has_safety_notes()
        .then(|| take_list(&mut object, "safety_notes"));

    AnalysisResult {
        summary,
        risk_level,
        confidence,
        red_flags,
        inconsistencies,
        next_steps,
        safety_notes,
        extra: object,
    }
}

/// Non-finite input becomes 0; everything else is clamped into [0, 1].
pub fn coerce_confidence(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => f64::NAN,
    };

    if !n.is_finite() || n <= 0.0 {
        0.0
    } else if n >= 1.0 {
        1.0
    } else {
        n
    }
}

fn take_list(object: &mut Map<String, Value>, key: &str) -> Vec<String> {
    match object.remove(key) {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}
