use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::models::ModelPart;

const TEMPERATURE: f32 = 0.2;
const RESPONSE_MIME_TYPE: &str = "application/json";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("{0}")]
    Request(String),
    #[error("model API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("invalid model response: {0}")]
    Decode(String),
}

/// Capability to turn an ordered list of parts into the model's raw text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, parts: &[ModelPart]) -> Result<String, ModelError>;
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text { text: &'a str },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

impl<'a> From<&'a ModelPart> for RequestPart<'a> {
    fn from(part: &'a ModelPart) -> Self {
        match part {
            ModelPart::Text(text) => RequestPart::Text { text },
            ModelPart::InlineImage { mime_type, data } => RequestPart::Inline {
                inline_data: InlineData { mime_type, data },
            },
        }
    }
}

// ── Gemini client ────────────────────────────────────────────────────────────

/// `generateContent` over HTTP. No retries; the client's own timeout is the
/// only bound on a slow call.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> reqwest::Result<Self> {
        let http = reqwest::ClientBuilder::new()
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(config.model_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.profile.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, parts: &[ModelPart]) -> Result<String, ModelError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ModelError::Request("Missing GEMINI_API_KEY".to_string()))?;

        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: parts.iter().map(RequestPart::from).collect(),
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                response_mime_type: RESPONSE_MIME_TYPE,
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_slice(&bytes).map_err(|e| ModelError::Decode(e.to_string()))?;
        Ok(first_candidate_text(parsed))
    }
}

fn first_candidate_text(response: GenerateResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}
