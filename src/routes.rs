use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::Method,
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::{json, Value};

use crate::analyze::Analyzer;
use crate::error::AnalyzeError;
use crate::models::AnalyzeRequest;

pub fn router(analyzer: Arc<Analyzer>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/analyze", any(analyze_endpoint))
        .with_state(analyzer)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn analyze_endpoint(
    State(analyzer): State<Arc<Analyzer>>,
    method: Method,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return AnalyzeError::MethodNotAllowed.into_response();
    }

    let req = match parse_body(&body) {
        Ok(req) => req,
        Err(e) => return e.into_response(),
    };

    // Run on its own task so a panic anywhere in the pipeline still
    // produces a JSON 500.
    let task = tokio::spawn(async move { analyzer.analyze(req).await });
    match task.await {
        Ok(Ok(outcome)) => outcome.into_response(),
        Ok(Err(e)) => e.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "analysis task aborted");
            AnalyzeError::Internal(e.to_string()).into_response()
        }
    }
}

/// Empty and `null` bodies read as `{}`; anything else must be an object.
fn parse_body(body: &[u8]) -> Result<AnalyzeRequest, AnalyzeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AnalyzeRequest::default());
    }
    let value: Value =
        serde_json::from_slice(body).map_err(|e| AnalyzeError::InvalidBody(e.to_string()))?;
    match value {
        Value::Null => Ok(AnalyzeRequest::default()),
        Value::Object(_) => {
            serde_json::from_value(value).map_err(|e| AnalyzeError::InvalidBody(e.to_string()))
        }
        _ => Err(AnalyzeError::InvalidBody(
            "expected a JSON object".to_string(),
        )),
    }
}
