//! Route behavior against an in-process store and canned generators.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tapcard_core::config::ProfileConfig;
use tapcard_core::{CounterStore, MemoryStore, StoreError, TapCounter};
use tapcard_llm::{
    FALLBACK_FACT, FactGenerator, GenerationSettings, LlmError, LlmRequest, LlmResponse,
    TextGenerator,
};
use tapcard_server::build_router;
use tapcard_server::state::AppState;
use tower::ServiceExt;

struct Canned {
    model: &'static str,
    outcome: Result<&'static str, LlmError>,
}

#[async_trait]
impl TextGenerator for Canned {
    fn model(&self) -> &str {
        self.model
    }

    async fn generate(&self, _request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.outcome.clone().map(|text| LlmResponse {
            text: text.to_string(),
            tokens_generated: 3,
            latency_ms: 1,
            model: self.model.to_string(),
        })
    }
}

/// Every call fails with a message that must never reach a client.
struct FailingStore;

const RAW_STORE_ERROR: &str = "connection refused at 10.0.0.7:6379";

#[async_trait]
impl CounterStore for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn incr(&self, _key: &str) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable(RAW_STORE_ERROR.into()))
    }

    async fn get(&self, _key: &str) -> Result<Option<u64>, StoreError> {
        Err(StoreError::Unavailable(RAW_STORE_ERROR.into()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(RAW_STORE_ERROR.into()))
    }
}

fn static_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("static")
}

fn generator(
    primary: Result<&'static str, LlmError>,
    secondary: Result<&'static str, LlmError>,
) -> FactGenerator {
    FactGenerator::new(
        Arc::new(Canned {
            model: "gemini-2.5-flash",
            outcome: primary,
        }),
        Arc::new(Canned {
            model: "gemini-2.5-flash-lite",
            outcome: secondary,
        }),
        GenerationSettings::default(),
    )
}

fn app_with(store: Arc<dyn CounterStore>, facts: FactGenerator) -> Router {
    let state = AppState::new(
        TapCounter::new(store, "tap_counter"),
        facts,
        ProfileConfig::default(),
    );
    build_router(state, &static_dir())
}

fn app() -> Router {
    app_with(
        Arc::new(MemoryStore::new()),
        generator(Ok("Fact A"), Ok("Fact B")),
    )
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_str(&body).expect("json body"))
}

#[tokio::test]
async fn root_reports_live() {
    let (status, body) = get_json(&app(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "NFC AI Networking Card is live!");
}

#[tokio::test]
async fn stats_start_at_zero() {
    let (status, body) = get_json(&app(), "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_taps"], 0);
    assert_eq!(body["status"], "Tracking active");
}

#[tokio::test]
async fn taps_count_up_and_render_fact() {
    let app = app();

    let (status, first) = get(&app, "/tap").await;
    assert_eq!(status, StatusCode::OK);
    assert!(first.contains(r#"data-session-id="1""#));
    assert!(first.contains("Fact A"));
    assert!(first.contains("Gemini 2.5 Flash"));

    let (_, second) = get(&app, "/tap").await;
    assert!(second.contains(r#"data-session-id="2""#));

    let (_, stats) = get_json(&app, "/stats").await;
    assert_eq!(stats["total_taps"], 2);
}

#[tokio::test]
async fn stats_do_not_count() {
    let app = app();
    get(&app, "/tap").await;
    get(&app, "/stats").await;
    get(&app, "/fact").await;
    let (_, stats) = get_json(&app, "/stats").await;
    assert_eq!(stats["total_taps"], 1);
}

#[tokio::test]
async fn fact_reports_producing_tier() {
    let (status, body) = get_json(&app(), "/fact").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fact"], "Fact A");
    assert_eq!(body["source"], "Gemini 2.5 Flash");

    let lite = app_with(
        Arc::new(MemoryStore::new()),
        generator(Err(LlmError::ServiceUnavailable("HTTP 503".into())), Ok("Fact B")),
    );
    let (_, body) = get_json(&lite, "/fact").await;
    assert_eq!(body["fact"], "Fact B");
    assert_eq!(body["source"], "Gemini 2.5 Flash Lite");
}

#[tokio::test]
async fn total_outage_still_serves_a_card() {
    let app = app_with(
        Arc::new(MemoryStore::new()),
        generator(Err(LlmError::Timeout(5000)), Ok("   ")),
    );

    let (status, body) = get_json(&app, "/fact").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fact"], FALLBACK_FACT);
    assert_eq!(body["source"], "Built-in");

    let (status, page) = get(&app, "/tap").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains(FALLBACK_FACT));
}

#[tokio::test]
async fn store_failure_is_redacted() {
    let app = app_with(Arc::new(FailingStore), generator(Ok("Fact A"), Ok("Fact B")));

    for uri in ["/tap", "/stats"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        let json: Value = serde_json::from_str(&body).expect("json body");
        assert!(json["error"].is_string(), "{uri}");
        assert!(json["details"].is_string(), "{uri}");
        assert!(json["hint"].is_string(), "{uri}");
        assert!(!body.contains(RAW_STORE_ERROR), "{uri} leaked {body}");
    }

    let (status, _) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&app, "/fact").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn serves_vcard() {
    let (status, body) = get(&app(), "/static/victor_loza.vcf").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("BEGIN:VCARD"));
}

#[tokio::test]
async fn static_files_come_from_configured_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("hello.txt"), "hello").expect("write");

    let state = AppState::new(
        TapCounter::new(Arc::new(MemoryStore::new()), "tap_counter"),
        generator(Ok("Fact A"), Ok("Fact B")),
        ProfileConfig::default(),
    );
    let app = build_router(state, dir.path());

    let (status, body) = get(&app, "/static/hello.txt").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "hello");

    let (status, _) = get(&app, "/static/missing.txt").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
