//! Router-level tests exercising the webhook endpoints without any live
//! upstream: health, TwiML callbacks, payload validation and delivery
//! deduplication. Storage points at an unreachable endpoint, so handler
//! paths that need it fail fast and deterministically.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use dost_bot::assistant::recipes::RecipeClient;
use dost_bot::bot::{routes, AppState, DedupCache};
use dost_bot::config::Settings;
use dost_bot::llm::LlmClient;
use dost_bot::scheduler::Scheduler;
use dost_bot::storage::R2Storage;
use dost_bot::twilio::TwilioClient;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

fn test_settings() -> Settings {
    Settings {
        twilio_account_sid: "ACtest".to_string(),
        twilio_auth_token: "token".to_string(),
        twilio_whatsapp_number: "whatsapp:+14155238886".to_string(),
        twilio_voice_number: None,
        gemini_api_key: None,
        groq_api_key: None,
        google_client_id: None,
        google_client_secret: None,
        google_refresh_token: None,
        r2_access_key_id: Some("test-key".to_string()),
        r2_secret_access_key: Some("test-secret".to_string()),
        // Nothing listens here; storage calls fail fast instead of hanging
        r2_endpoint_url: Some("http://127.0.0.1:9".to_string()),
        r2_bucket_name: Some("test-bucket".to_string()),
        host: "127.0.0.1".to_string(),
        port: 0,
        system_message: None,
    }
}

async fn test_state() -> AppState {
    let settings = Arc::new(test_settings());
    let storage = Arc::new(
        R2Storage::new(&settings)
            .await
            .expect("offline construction should succeed"),
    );

    AppState {
        twilio: Arc::new(TwilioClient::new(&settings)),
        llm: Arc::new(LlmClient::new(&settings)),
        calendar: None,
        recipes: Arc::new(RecipeClient::new()),
        scheduler: Scheduler::start(),
        dedup: Arc::new(DedupCache::new(60, 100)),
        settings,
        storage,
    }
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn health_reports_scheduler() {
    let app = routes::router(test_state().await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body readable")
        .to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");

    assert_eq!(json["status"], "healthy");
    assert_eq!(json["services"]["scheduler"], true);
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn reminder_response_answers_twiml() {
    let app = routes::router(test_state().await);

    // Unknown digit: no storage access, pure TwiML answer
    let response = app
        .oneshot(form_request("/reminder-response", "Digits=9"))
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert_eq!(content_type, "text/xml");

    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body readable")
        .to_bytes();
    let xml = String::from_utf8_lossy(&bytes);
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("Invalid input. Goodbye."));
    assert!(xml.contains("Polly.Raveena"));
}

#[tokio::test]
async fn webhook_rejects_missing_sender() {
    let app = routes::router(test_state().await);

    let response = app
        .oneshot(form_request("/webhook", "Body=hello&MessageSid=SM1"))
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body readable")
        .to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(json["status"], "error");
}

#[tokio::test]
async fn webhook_deduplicates_retries() {
    let state = test_state().await;
    let app = routes::router(state);

    let body = "Body=hello&From=whatsapp%3A%2B919876543210&MessageSid=SMdup";

    // First delivery is processed; with storage unreachable it errors out
    let response = app
        .clone()
        .oneshot(form_request("/webhook", body))
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // The retry with the same SID is acknowledged without reprocessing
    let response = app
        .oneshot(form_request("/webhook", body))
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body readable")
        .to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(json["status"], "success");
}
