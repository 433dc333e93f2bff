//! Router-level tests for `/api/analyze` with fake model and blob collaborators.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use scam_check::blob::{BlobError, BlobStore};
use scam_check::gemini::{ModelClient, ModelError};
use scam_check::image::{self, MAX_IMAGE_BYTES};
use scam_check::models::ModelPart;
use scam_check::{router, AnalysisProfile, Analyzer, Config};

struct ScriptedModel {
    reply: Result<String, String>,
    calls: Mutex<Vec<Vec<ModelPart>>>,
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn generate(&self, parts: &[ModelPart]) -> Result<String, ModelError> {
        self.calls.lock().unwrap().push(parts.to_vec());
        self.reply.clone().map_err(ModelError::Request)
    }
}

#[derive(Default)]
struct RecordingBlobs {
    deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl BlobStore for RecordingBlobs {
    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        self.deleted.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

struct TestApp {
    app: Router,
    model: Arc<ScriptedModel>,
    blobs: Arc<RecordingBlobs>,
}

impl TestApp {
    fn new(reply: Result<&str, &str>) -> Self {
        Self::with_config(reply, |config| {
            config.api_key = Some("test-key".to_string());
        })
    }

    fn with_config(reply: Result<&str, &str>, adjust: impl FnOnce(&mut Config)) -> Self {
        let mut config = Config::from_lookup(|_| None);
        adjust(&mut config);
        let model = Arc::new(ScriptedModel {
            reply: reply.map(str::to_string).map_err(str::to_string),
            calls: Mutex::new(Vec::new()),
        });
        let blobs = Arc::new(RecordingBlobs::default());
        let http = image::build_client(Duration::from_secs(5)).unwrap();
        let analyzer = Analyzer::new(&config, http, model.clone(), blobs.clone());
        Self {
            app: router(Arc::new(analyzer)),
            model,
            blobs,
        }
    }

    async fn post(&self, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    async fn send(&self, req: Request) -> (StatusCode, Value) {
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn prompt_of_call(&self, index: usize) -> String {
        match &self.model.calls.lock().unwrap()[index][0] {
            ModelPart::Text(text) => text.clone(),
            other => panic!("first part must be text, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn get_is_rejected_with_allow_header() {
    let test = TestApp::new(Ok("{}"));
    let req = Request::builder()
        .method("GET")
        .uri("/api/analyze")
        .body(Body::empty())
        .unwrap();
    let resp = test.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.headers()[header::ALLOW], "POST");
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Method not allowed. Use POST.");
    assert!(test.model.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_api_key_is_a_configuration_error() {
    let test = TestApp::with_config(Ok("{}"), |_| {});
    let (status, body) = test.post(json!({ "messages_text": "hi" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Missing GEMINI_API_KEY" }));
    assert!(test.model.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn structured_output_is_normalized() {
    let test = TestApp::new(Ok(
        r#"{"summary":"ok","risk_level":"high","confidence":2,"red_flags":"x"}"#,
    ));
    let (status, body) = test
        .post(json!({ "messages_text": "send me your OTP", "link_url": "https://bank.example" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "ok");
    assert_eq!(body["risk_level"], "high");
    assert_eq!(body["confidence"].as_f64(), Some(1.0));
    assert_eq!(body["red_flags"], json!([]));
    assert_eq!(body["inconsistencies"], json!([]));
    assert_eq!(body["next_steps"], json!([]));

    let prompt = test.prompt_of_call(0);
    assert!(prompt.contains("messages_text:\nsend me your OTP"));
    assert!(prompt.contains("link_url:\nhttps://bank.example"));
}

#[tokio::test]
async fn prose_wrapped_output_is_salvaged() {
    let test = TestApp::new(Ok(r#"here you go: {"summary":"a"} thanks"#));
    let (status, body) = test.post(json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "a");
    assert_eq!(body["risk_level"], "medium");
    assert_eq!(body["confidence"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn output_without_braces_returns_warning_and_raw_text() {
    let test = TestApp::new(Ok("I cannot help with that"));
    let (status, body) = test.post(json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["warning"], "Model did not return valid JSON");
    assert_eq!(body["raw"], "I cannot help with that");
}

#[tokio::test]
async fn model_failure_is_reported_as_500() {
    let test = TestApp::new(Err("upstream unavailable"));
    let (status, body) = test.post(json!({ "extra_notes": "n" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Analysis failed");
    assert_eq!(body["detail"], "upstream unavailable");
}

#[tokio::test]
async fn missing_image_is_annotated_and_analysis_completes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let test = TestApp::new(Ok(r#"{"summary":"text only","risk_level":"low"}"#));
    let (status, body) = test
        .post(json!({ "image_url": format!("  {}/gone.png  ", server.uri()) }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "text only");
    let calls = test.model.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 1);
    assert!(test
        .prompt_of_call(0)
        .ends_with("IMAGE_NOTE: Failed to fetch image_url. status=404"));
}

#[tokio::test]
async fn oversized_image_is_annotated_without_second_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(vec![0u8; (MAX_IMAGE_BYTES + 1) as usize], "image/png"),
        )
        .mount(&server)
        .await;

    let test = TestApp::new(Ok("{}"));
    let (status, _) = test
        .post(json!({ "image_url": format!("{}/huge.png", server.uri()) }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert_eq!(test.model.calls.lock().unwrap()[0].len(), 1);
    assert!(test
        .prompt_of_call(0)
        .contains("IMAGE_NOTE: Image too large to fetch (5242881 bytes)."));
}

#[tokio::test]
async fn safety_profile_returns_safety_notes() {
    let test = TestApp::with_config(Ok(r#"{"summary":"s","safety_notes":"nope"}"#), |config| {
        config.api_key = Some("k".to_string());
        config.profile = AnalysisProfile::safety();
    });
    let (status, body) = test.post(json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["safety_notes"], json!([]));
    assert!(test.prompt_of_call(0).contains("\"safety_notes\": string[]"));
}

#[tokio::test]
async fn managed_upload_is_deleted_after_analysis() {
    let test = TestApp::with_config(Ok("{}"), |config| {
        config.api_key = Some("k".to_string());
        config.profile = AnalysisProfile::text_only();
    });
    let url = "https://store1.public.blob.vercel-storage.com/shot-abc.png";
    let (status, _) = test.post(json!({ "image_url": url })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(*test.blobs.deleted.lock().unwrap(), vec![url.to_string()]);
}

#[tokio::test]
async fn invalid_body_is_a_json_400() {
    let test = TestApp::new(Ok("{}"));
    let req = Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .body(Body::from("not json"))
        .unwrap();
    let (status, body) = test.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
}

#[tokio::test]
async fn health_reports_ok() {
    let test = TestApp::new(Ok("{}"));
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = test.send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn overflowing_confidence_still_yields_structured_result() {
    let test = TestApp::new(Ok(r#"{"summary":"ok","risk_level":"high","confidence":1e999}"#));
    let (status, body) = test.post(json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "ok");
    assert_eq!(body["confidence"].as_f64(), Some(0.0));
    assert!(body.get("warning").is_none());
}
