//! Mock multimodal backend for integration tests
//!
//! Speaks enough of the `generateContent` API to drive the primary engine

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Bytes returned as the generated image
pub const IMAGE_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Text returned for describe and refine calls
pub const DESCRIPTION: &str = "A hawk in profile with angular wings on a dark ground";

/// How the mock answers synthesis calls
#[derive(Debug, Clone)]
pub enum GeminiBehavior {
    /// Image for synthesis, text for everything else
    Image,
    /// 429 `RESOURCE_EXHAUSTED` for the first `n` synthesis calls, then an image
    QuotaThenImage(u32),
    /// This status and body for every call
    Status(u16, String),
    /// Text only with a SAFETY finish reason
    Refuse,
    /// An inline image part with an empty payload
    EmptyImage,
}

/// Mock backend that records every request it receives
pub struct MockGemini {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockGeminiState>,
}

struct MockGeminiState {
    behavior: GeminiBehavior,
    generate_count: AtomicU32,
    text_count: AtomicU32,
    requests: Mutex<Vec<Value>>,
    keys: Mutex<Vec<String>>,
    models: Mutex<Vec<String>>,
}

impl MockGemini {
    /// Start a mock that always succeeds
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(GeminiBehavior::Image).await
    }

    pub async fn start_with(behavior: GeminiBehavior) -> anyhow::Result<Self> {
        let state = Arc::new(MockGeminiState {
            behavior,
            generate_count: AtomicU32::new(0),
            text_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
            keys: Mutex::new(Vec::new()),
            models: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1beta/models/{call}", routing::post(handle_generate_content))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the primary engine
    pub fn base_url(&self) -> String {
        format!("http://{}/v1beta", self.addr)
    }

    /// Number of image synthesis calls received
    pub fn generate_count(&self) -> u32 {
        self.state.generate_count.load(Ordering::Relaxed)
    }

    /// Number of text-only calls (describe, refine) received
    pub fn text_count(&self) -> u32 {
        self.state.text_count.load(Ordering::Relaxed)
    }

    /// Request bodies in arrival order
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    /// `key` query parameters in arrival order
    pub fn keys(&self) -> Vec<String> {
        self.state.keys.lock().unwrap().clone()
    }

    /// Model names from the request paths
    pub fn models(&self) -> Vec<String> {
        self.state.models.lock().unwrap().clone()
    }
}

impl Drop for MockGemini {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_generate_content(
    State(state): State<Arc<MockGeminiState>>,
    Path(call): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let model = call.trim_end_matches(":generateContent").to_owned();
    state.models.lock().unwrap().push(model);
    state
        .keys
        .lock()
        .unwrap()
        .push(query.get("key").cloned().unwrap_or_default());
    state.requests.lock().unwrap().push(body.clone());

    if let GeminiBehavior::Status(code, text) = &state.behavior {
        let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, text.clone()).into_response();
    }

    let wants_image = body["generationConfig"]["responseModalities"]
        .as_array()
        .is_some_and(|modalities| modalities.iter().any(|m| m.as_str() == Some("IMAGE")));

    if !wants_image {
        state.text_count.fetch_add(1, Ordering::Relaxed);
        return Json(text_response(DESCRIPTION, "STOP")).into_response();
    }

    let n = state.generate_count.fetch_add(1, Ordering::Relaxed) + 1;

    match &state.behavior {
        GeminiBehavior::QuotaThenImage(failures) if n <= *failures => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": {
                    "code": 429,
                    "message": "Resource has been exhausted (e.g. check quota).",
                    "status": "RESOURCE_EXHAUSTED"
                }
            })),
        )
            .into_response(),
        GeminiBehavior::Refuse => {
            Json(text_response("I can't help with that request.", "SAFETY")).into_response()
        }
        GeminiBehavior::EmptyImage => Json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "inlineData": { "mimeType": "image/png", "data": "" } }]
                },
                "finishReason": "STOP"
            }]
        }))
        .into_response(),
        _ => Json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Here is your mark." },
                        { "inlineData": { "mimeType": "image/png", "data": STANDARD.encode(IMAGE_BYTES) } }
                    ]
                },
                "finishReason": "STOP"
            }]
        }))
        .into_response(),
    }
}

fn text_response(text: &str, finish_reason: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": finish_reason
        }]
    })
}
