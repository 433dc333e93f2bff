use std::time::Duration;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_BLOB_API_URL: &str = "https://blob.vercel-storage.com";
const DEFAULT_BLOB_HOST_SUFFIX: &str = "blob.vercel-storage.com";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_IMAGE_TIMEOUT_SECS: u64 = 10;

const BASE_LISTS: &[&str] = &["red_flags", "inconsistencies", "next_steps"];
const SAFETY_LISTS: &[&str] = &["red_flags", "inconsistencies", "next_steps", "safety_notes"];

// ── Analysis profiles ────────────────────────────────────────────────────────

/// One variant of the analysis endpoint: prompt wording, model, whether an
/// image is inlined, and which list fields the schema carries.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisProfile {
    pub name: &'static str,
    pub preamble: &'static str,
    pub model: String,
    pub inline_images: bool,
    pub list_fields: &'static [&'static str],
}

impl AnalysisProfile {
    pub fn scam() -> Self {
        Self {
            name: "scam",
            preamble: "You are a digital safety and scam-risk analysis assistant.",
            model: "gemini-2.5-flash".to_string(),
            inline_images: true,
            list_fields: BASE_LISTS,
        }
    }

    pub fn safety() -> Self {
        Self {
            name: "safety",
            preamble: "You are a digital safety assistant. Assess the scam risk of the report \
                       below and add practical safety notes for the person who submitted it.",
            model: "gemini-2.5-flash".to_string(),
            inline_images: true,
            list_fields: SAFETY_LISTS,
        }
    }

    pub fn text_only() -> Self {
        Self {
            name: "text",
            preamble: "You are a scam-risk analysis assistant. Judge only the text provided.",
            model: "gemini-2.0-flash".to_string(),
            inline_images: false,
            list_fields: BASE_LISTS,
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "scam" => Some(Self::scam()),
            "safety" => Some(Self::safety()),
            "text" => Some(Self::text_only()),
            _ => None,
        }
    }

    pub fn has_safety_notes(&self) -> bool {
        self.list_fields.contains(&"safety_notes")
    }
}

// ── Service configuration ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub profile: AnalysisProfile,
    pub gemini_base_url: String,
    pub model_timeout: Duration,
    pub image_timeout: Duration,
    pub blob_token: Option<String>,
    pub blob_api_url: String,
    pub blob_host_suffix: String,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Values are
    /// trimmed and empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let secs = |key: &str, default: u64| {
            get(key)
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };

        let mut profile = match get("ANALYZER_PROFILE") {
            Some(name) => AnalysisProfile::by_name(&name).unwrap_or_else(|| {
                tracing::warn!(profile = %name, "unknown analyzer profile, using scam");
                AnalysisProfile::scam()
            }),
            None => AnalysisProfile::scam(),
        };
        if let Some(model) = get("GEMINI_MODEL") {
            profile.model = model;
        }

        Self {
            api_key: get("GEMINI_API_KEY"),
            profile,
            gemini_base_url: get("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            model_timeout: Duration::from_secs(secs(
                "GEMINI_TIMEOUT_SECS",
                DEFAULT_MODEL_TIMEOUT_SECS,
            )),
            image_timeout: Duration::from_secs(secs(
                "IMAGE_FETCH_TIMEOUT_SECS",
                DEFAULT_IMAGE_TIMEOUT_SECS,
            )),
            blob_token: get("BLOB_READ_WRITE_TOKEN"),
            blob_api_url: get("BLOB_API_URL").unwrap_or_else(|| DEFAULT_BLOB_API_URL.to_string()),
            blob_host_suffix: get("BLOB_HOST_SUFFIX")
                .unwrap_or_else(|| DEFAULT_BLOB_HOST_SUFFIX.to_string()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        }
    }
}
