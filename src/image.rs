use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use url::Url;

use crate::models::ModelPart;

// ── Constants ────────────────────────────────────────────────────────────────

pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;
const USER_AGENT: &str = "scam-check-api/0.1";

// ── Error type ───────────────────────────────────────────────────────────────

/// Reasons an image could not be inlined. The display text is the prompt
/// annotation, so none of these ever fail the request.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ImageError {
    #[error("Failed to fetch image_url. status={0}")]
    Status(u16),
    #[error("Image too large to fetch ({0} bytes).")]
    TooLarge(u64),
    #[error("image_url content-type is not image: {0}")]
    NotImage(String),
    #[error("Exception fetching image_url: {0}")]
    Request(String),
}

// ── HTTP client ──────────────────────────────────────────────────────────────

pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::ClientBuilder::new()
        .connect_timeout(Duration::from_secs(5))
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(USER_AGENT)
        .build()
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Fetches `url` and returns it as an inlined-image part.
///
/// The declared `Content-Length` is checked before the body is touched; the
/// same ceiling is enforced while streaming for responses that do not
/// declare one.
pub async fn inline_image(client: &reqwest::Client, url: &str) -> Result<ModelPart, ImageError> {
    let parsed = Url::parse(url).map_err(|e| ImageError::Request(format!("invalid URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ImageError::Request(format!(
            "unsupported URL scheme: {}",
            parsed.scheme()
        )));
    }

    let mut response = client.get(parsed).send().await.map_err(|e| {
        if e.is_timeout() {
            ImageError::Request(format!("TimeoutError: {e}"))
        } else if e.is_connect() {
            ImageError::Request(format!("ConnectError: {e}"))
        } else {
            ImageError::Request(format!("RequestError: {e}"))
        }
    })?;

    if !response.status().is_success() {
        return Err(ImageError::Status(response.status().as_u16()));
    }

    let declared_len = response
        .headers()
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    if let Some(len) = declared_len {
        if len > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge(len));
        }
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .trim()
        .to_string();
    // Media types are case-insensitive.
    if !content_type.to_ascii_lowercase().starts_with("image/") {
        return Err(ImageError::NotImage(content_type));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| ImageError::Request(e.to_string()))?
    {
        body.extend_from_slice(&chunk);
        if body.len() as u64 > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge(body.len() as u64));
        }
    }

    Ok(ModelPart::InlineImage {
        mime_type: mime_essence(&content_type),
        data: BASE64.encode(&body),
    })
}

/// `image/png; charset=binary` -> `image/png`.
fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
