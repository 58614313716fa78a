//! Integration tests for the ClaimBeaver HTTP API.
//!
//! The database is replaced by an in-memory fake; the LLM backends are real
//! clients talking to small axum servers that mimic the vendor APIs, bound to
//! ephemeral local ports.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    routing::post,
};
use http_body_util::BodyExt;
use serde_json::{Value as JsonValue, json};
use tower::ServiceExt;

use claimbeaver_core::InquiryError;
use claimbeaver_server::agent::InquiryAgent;
use claimbeaver_server::config::{Config, LlmConfig, ModelType};
use claimbeaver_server::db::SqlDatabase;
use claimbeaver_server::llm::{ChatModel, LlmProvider, UNAVAILABLE_MESSAGE};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SCHEMA: &str = "claims(id, filed_date, amount)";
const QUESTION: &str = "How many claims were filed in 2023?";
const FENCED_SQL: &str = "```sql\nSELECT COUNT(*) FROM claims WHERE YEAR(filed_date)=2023;\n```";
const CLEAN_SQL: &str = "SELECT COUNT(*) FROM claims WHERE YEAR(filed_date)=2023;";

/// In-memory stand-in for the claims database
#[derive(Default)]
struct FakeDb {
    result: Option<String>,
    error: Option<String>,
    down: bool,
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl SqlDatabase for FakeDb {
    async fn table_info(&self) -> Result<String, InquiryError> {
        Ok(SCHEMA.to_string())
    }

    async fn run(&self, sql: &str) -> Result<String, InquiryError> {
        self.queries.lock().unwrap().push(sql.to_string());
        match &self.error {
            Some(msg) => Err(InquiryError::Database(msg.clone())),
            None => Ok(self.result.clone().unwrap_or_default()),
        }
    }

    async fn ping(&self) -> Result<(), InquiryError> {
        if self.down {
            Err(InquiryError::Database("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Requests received by a fake vendor server, and the replies it will give
#[derive(Clone, Default)]
struct FakeVendor {
    replies: Arc<Mutex<VecDeque<String>>>,
    requests: Arc<Mutex<Vec<(String, JsonValue)>>>,
}

impl FakeVendor {
    fn with_replies(replies: &[&str]) -> Self {
        let vendor = Self::default();
        vendor
            .replies
            .lock()
            .unwrap()
            .extend(replies.iter().map(|r| r.to_string()));
        vendor
    }

    fn next_reply(&self) -> String {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "no more replies".to_string())
    }

    fn requests(&self) -> Vec<(String, JsonValue)> {
        self.requests.lock().unwrap().clone()
    }
}

async fn openai_handler(
    State(vendor): State<FakeVendor>,
    Json(body): Json<JsonValue>,
) -> Json<JsonValue> {
    vendor
        .requests
        .lock()
        .unwrap()
        .push(("chat/completions".to_string(), body));
    Json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": vendor.next_reply()},
            "finish_reason": "stop"
        }]
    }))
}

async fn gemini_handler(
    State(vendor): State<FakeVendor>,
    Path(rest): Path<String>,
    Json(body): Json<JsonValue>,
) -> Json<JsonValue> {
    vendor.requests.lock().unwrap().push((rest, body));
    Json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": vendor.next_reply()}]},
            "finishReason": "STOP"
        }]
    }))
}

/// Serve a fake vendor API on an ephemeral port and return its base URL
async fn spawn_vendor(vendor: FakeVendor) -> String {
    let app = Router::new()
        .route("/v1/chat/completions", post(openai_handler))
        .route("/v1beta/models/{*rest}", post(gemini_handler))
        .with_state(vendor);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake vendor");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn test_config() -> Config {
    Config {
        database_url: String::new(), // unused, the database is faked
        database_schema: "public".to_string(),
        sample_rows: 0,
        result_max_rows: 100,
        result_max_cell_chars: 300,
        bind_address: "0.0.0.0:0".to_string(),
        cors_origins: vec!["*".to_string()],
        llm: LlmConfig::default(),
    }
}

fn test_app(llm: Arc<dyn ChatModel>, db: Arc<FakeDb>) -> Router {
    claimbeaver_server::build_app(InquiryAgent::new(llm, db), &test_config())
}

/// Send a request to the app and return (status, body as JSON).
async fn request(app: &Router, req: Request<Body>) -> (StatusCode, JsonValue) {
    let response = app.clone().oneshot(req).await.expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();

    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };

    (status, body)
}

fn ask(question: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/ask")
        .header("Content-Type", "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({ "question": question })).unwrap(),
        ))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_ask_through_openai_compatible_backend() {
    let vendor = FakeVendor::with_replies(&[FENCED_SQL, "42 claims were filed in 2023."]);
    let base = spawn_vendor(vendor.clone()).await;

    let llm = LlmProvider::initialize(&LlmConfig {
        model_type: ModelType::OpenAi,
        api_base: Some(format!("{}/v1", base)),
        openai_api_key: Some("lm-studio".to_string()),
        ..LlmConfig::default()
    });
    assert_eq!(llm.kind(), Some(ModelType::OpenAi));

    let db = Arc::new(FakeDb {
        result: Some("[(42,)]".to_string()),
        ..FakeDb::default()
    });
    let app = test_app(Arc::new(llm), db.clone());

    let (status, body) = request(&app, ask(QUESTION)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"response": "42 claims were filed in 2023."}));

    // The database saw the cleaned query
    assert_eq!(db.queries.lock().unwrap().as_slice(), [CLEAN_SQL]);

    let requests = vendor.requests();
    assert_eq!(requests.len(), 2);

    // Stage 1 stops before a hallucinated result section
    let (_, first) = &requests[0];
    assert_eq!(first["model"], "llama-3.2-3b-instruct");
    assert_eq!(first["stop"], json!(["\nSQLResult:"]));
    let prompt = first["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains(SCHEMA));
    assert!(prompt.contains(QUESTION));

    // Stage 3 sees the cleaned query and the literal result, no stop sequence
    let (_, second) = &requests[1];
    assert!(second.get("stop").is_none());
    let prompt = second["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains(&format!("SQL Query: {}\n", CLEAN_SQL)));
    assert!(prompt.contains("SQL Response: [(42,)]"));
    assert!(!prompt.contains("```"));
}

#[tokio::test]
async fn test_ask_through_gemini_backend() {
    let vendor = FakeVendor::with_replies(&["SELECT COUNT(*) FROM claims;", "There are 7 claims."]);
    let base = spawn_vendor(vendor.clone()).await;

    let llm = match LlmProvider::initialize(&LlmConfig {
        model_type: ModelType::Gemini,
        google_api_key: Some("test-google-key".to_string()),
        ..LlmConfig::default()
    }) {
        LlmProvider::Gemini(client) => {
            LlmProvider::Gemini(client.with_base_url(&format!("{}/v1beta", base)))
        }
        _ => panic!("expected the Gemini backend"),
    };

    let db = Arc::new(FakeDb {
        result: Some("[(7,)]".to_string()),
        ..FakeDb::default()
    });
    let app = test_app(Arc::new(llm), db.clone());

    let (status, body) = request(&app, ask("How many claims are there?")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "There are 7 claims.");

    let requests = vendor.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].0, "gemini-2.0-flash:generateContent");
    assert_eq!(
        requests[0].1["generationConfig"]["stopSequences"],
        json!(["\nSQLResult:"])
    );
    assert!(
        requests[1].1["generationConfig"]
            .get("stopSequences")
            .is_none()
    );
}

#[tokio::test]
async fn test_fallback_backend_serves_requests() {
    let vendor = FakeVendor::with_replies(&["SELECT 1;", "One."]);
    let base = spawn_vendor(vendor.clone()).await;

    // Gemini requested without a key: the OpenAI-compatible backend takes over
    let llm = LlmProvider::initialize(&LlmConfig {
        model_type: ModelType::Gemini,
        api_base: Some(format!("{}/v1", base)),
        openai_api_key: Some("sk-local".to_string()),
        google_api_key: None,
        ..LlmConfig::default()
    });
    assert_eq!(llm.kind(), Some(ModelType::OpenAi));

    let app = test_app(Arc::new(llm), Arc::new(FakeDb::default()));
    let (status, body) = request(&app, ask("one?")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "One.");
}

#[tokio::test]
async fn test_no_backend_returns_notice() {
    let llm = LlmProvider::initialize(&LlmConfig::default());
    assert!(!llm.is_available());

    let db = Arc::new(FakeDb::default());
    let app = test_app(Arc::new(llm), db.clone());

    let (status, body) = request(&app, ask(QUESTION)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], UNAVAILABLE_MESSAGE);
    assert!(db.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_database_error_is_500() {
    let vendor = FakeVendor::with_replies(&["SELECT * FROM claimz;", "unused"]);
    let base = spawn_vendor(vendor.clone()).await;
    let llm = LlmProvider::initialize(&LlmConfig {
        model_type: ModelType::OpenAi,
        api_base: Some(format!("{}/v1", base)),
        openai_api_key: Some("sk-local".to_string()),
        ..LlmConfig::default()
    });

    let db = Arc::new(FakeDb {
        error: Some("relation \"claimz\" does not exist".to_string()),
        ..FakeDb::default()
    });
    let app = test_app(Arc::new(llm), db);

    let (status, body) = request(&app, ask("all claims")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("claimz"));

    // The answer stage never ran
    assert_eq!(vendor.requests().len(), 1);
}

#[tokio::test]
async fn test_blank_question_rejected() {
    let app = test_app(Arc::new(LlmProvider::Unavailable), Arc::new(FakeDb::default()));

    let (status, body) = request(&app, ask("   ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let app = test_app(Arc::new(LlmProvider::Unavailable), Arc::new(FakeDb::default()));

    let req = Request::builder()
        .method("POST")
        .uri("/ask")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"query": "wrong field"}"#))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_index_page() {
    let app = test_app(Arc::new(LlmProvider::Unavailable), Arc::new(FakeDb::default()));

    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("fetch('/ask'"));
}

#[tokio::test]
async fn test_health() {
    let app = test_app(Arc::new(LlmProvider::Unavailable), Arc::new(FakeDb::default()));
    let (status, body) = request(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["llm"], "unavailable");

    let down = Arc::new(FakeDb {
        down: true,
        ..FakeDb::default()
    });
    let app = test_app(Arc::new(LlmProvider::Unavailable), down);
    let (status, body) = request(&app, get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert!(body["reason"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_request_id_echoed() {
    let app = test_app(Arc::new(LlmProvider::Unavailable), Arc::new(FakeDb::default()));

    let req = Request::builder()
        .uri("/health")
        .header("X-Request-ID", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = test_app(Arc::new(LlmProvider::Unavailable), Arc::new(FakeDb::default()));

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/ask")
        .header("Origin", "http://example.com")
        .header("Access-Control-Request-Method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = test_app(Arc::new(LlmProvider::Unavailable), Arc::new(FakeDb::default()));
    request(&app, get("/health")).await;

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));
}
