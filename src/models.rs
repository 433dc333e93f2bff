use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /api/analyze`. Every field is optional on the wire.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub messages_text: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_context: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub link_url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub extra_notes: String,
    #[serde(default, deserialize_with = "trimmed_url")]
    pub image_url: Option<String>,
}

/// Accepts any JSON value where a string is expected.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(text_or_empty)
}

/// Textual form of a loosely typed value. `null`, `false` and zero read as
/// an empty string; arrays and objects keep their JSON text.
pub(crate) fn text_or_empty(value: Value) -> String {
    match value {
        Value::Null | Value::Bool(false) => String::new(),
        Value::Number(n) if n.as_f64() == Some(0.0) => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn trimmed_url<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = lenient_string(deserializer)?;
    let trimmed = raw.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// One segment of the ordered payload sent to the model. The prompt text is
/// always the first part.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelPart {
    Text(String),
    InlineImage { mime_type: String, data: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Exact, case-sensitive match against the three schema values.
    pub fn from_schema(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Normalized model verdict. Every field is present with the right type no
/// matter what the model produced; keys the schema does not know are kept in
/// `extra`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub red_flags: Vec<String>,
    pub inconsistencies: Vec<String>,
    pub next_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_notes: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Returned with 200 when nothing structured could be recovered from the
/// model output.
#[derive(Debug, Clone, Serialize)]
pub struct ParseWarning {
    pub ok: bool,
    pub warning: String,
    pub raw: String,
}

impl ParseWarning {
    pub fn new(raw: String) -> Self {
        Self {
            ok: true,
            warning: "Model did not return valid JSON".to_string(),
            raw,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
