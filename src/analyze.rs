use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::blob::{self, BlobStore};
use crate::config::{AnalysisProfile, Config};
use crate::error::AnalyzeError;
use crate::gemini::ModelClient;
use crate::image;
use crate::models::{AnalysisResult, AnalyzeRequest, ModelPart, ParseWarning};
use crate::prompt;
use crate::reconcile;

/// What a successful analysis returns to the form.
#[derive(Debug)]
pub enum AnalysisOutcome {
    Structured(AnalysisResult),
    Unstructured(ParseWarning),
}

impl IntoResponse for AnalysisOutcome {
    fn into_response(self) -> Response {
        match self {
            AnalysisOutcome::Structured(result) => (StatusCode::OK, Json(result)).into_response(),
            AnalysisOutcome::Unstructured(warning) => {
                (StatusCode::OK, Json(warning)).into_response()
            }
        }
    }
}

/// Per-request pipeline: prompt, optional image, model call, cleanup,
/// reconciliation. Holds no mutable state.
pub struct Analyzer {
    profile: AnalysisProfile,
    has_api_key: bool,
    blob_host_suffix: String,
    http: reqwest::Client,
    model: Arc<dyn ModelClient>,
    blobs: Arc<dyn BlobStore>,
}

impl Analyzer {
    pub fn new(
        config: &Config,
        http: reqwest::Client,
        model: Arc<dyn ModelClient>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            profile: config.profile.clone(),
            has_api_key: config.api_key.is_some(),
            blob_host_suffix: config.blob_host_suffix.clone(),
            http,
            model,
            blobs,
        }
    }

    pub async fn analyze(&self, req: AnalyzeRequest) -> Result<AnalysisOutcome, AnalyzeError> {
        if !self.has_api_key {
            return Err(AnalyzeError::MissingApiKey);
        }

        let parts = self.build_parts(&req).await;
        let generated = self.model.generate(&parts).await;

        if let Some(url) = req.image_url.as_deref() {
            blob::release_transient(self.blobs.as_ref(), url, &self.blob_host_suffix).await;
        }

        let raw = generated.map_err(|e| {
            tracing::error!(error = %e, profile = self.profile.name, "model call failed");
            AnalyzeError::Model(e)
        })?;

        Ok(match reconcile::parse_model_output(&raw) {
            Some(object) => {
                let result = reconcile::normalize(object, &self.profile);
                tracing::info!(
                    risk_level = ?result.risk_level,
                    confidence = result.confidence,
                    "analysis complete"
                );
                AnalysisOutcome::Structured(result)
            }
            None => {
                tracing::warn!(raw_len = raw.len(), "model output was not valid JSON");
                AnalysisOutcome::Unstructured(ParseWarning::new(raw))
            }
        })
    }

    /// Prompt text first, then the inlined image when one could be fetched.
    /// A failed fetch only adds a note to the prompt.
    pub async fn build_parts(&self, req: &AnalyzeRequest) -> Vec<ModelPart> {
        let mut text = prompt::build_prompt(&self.profile, req);
        let mut inlined = None;

        if let Some(url) = req.image_url.as_deref().filter(|_| self.profile.inline_images) {
            match image::inline_image(&self.http, url).await {
                Ok(part) => inlined = Some(part),
                Err(e) => {
                    tracing::warn!(url, error = %e, "image not inlined");
                    prompt::annotate(&mut text, &e.to_string());
                }
            }
        }

        let mut parts = vec![ModelPart::Text(text)];
        parts.extend(inlined);
        parts
    }
}
