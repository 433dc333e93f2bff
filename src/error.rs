use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::gemini::ModelError;
use crate::models::ErrorBody;

#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("Method not allowed. Use POST.")]
    MethodNotAllowed,
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Missing GEMINI_API_KEY")]
    MissingApiKey,
    #[error("Analysis failed: {0}")]
    Model(#[from] ModelError),
    #[error("Analysis failed: {0}")]
    Internal(String),
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let (status, error, detail) = match &self {
            AnalyzeError::MethodNotAllowed => {
                let body = ErrorBody {
                    error: "Method not allowed. Use POST.".to_string(),
                    detail: None,
                };
                return (
                    StatusCode::METHOD_NOT_ALLOWED,
                    [(header::ALLOW, "POST")],
                    Json(body),
                )
                    .into_response();
            }
            AnalyzeError::InvalidBody(msg) => (
                StatusCode::BAD_REQUEST,
                "Invalid request body",
                Some(msg.clone()),
            ),
            AnalyzeError::MissingApiKey => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Missing GEMINI_API_KEY",
                None,
            ),
            AnalyzeError::Model(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Analysis failed",
                Some(e.to_string()),
            ),
            AnalyzeError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Analysis failed",
                Some(msg.clone()),
            ),
        };
        let body = ErrorBody {
            error: error.to_string(),
            detail,
        };
        (status, Json(body)).into_response()
    }
}
