//! Mock hosted inference backend for integration tests

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Bytes returned as the generated image
pub const IMAGE_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

#[derive(Debug, Clone)]
pub enum InferenceBehavior {
    /// JPEG bytes on every call
    Image,
    /// 503 with `estimated_time` for the first `loading` calls, then an image
    ColdStart { loading: u32, estimated_time: f64 },
    /// This status and body for every call
    Status(u16, String),
    /// 200 with a JSON `error` payload
    JsonError(String),
    /// 200 with an image content type and no body
    Empty,
    /// 200 with an HTML page, as returned by intercepting proxies
    Html(String),
}

/// Mock backend that records headers and bodies
pub struct MockInference {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockInferenceState>,
}

struct MockInferenceState {
    behavior: InferenceBehavior,
    request_count: AtomicU32,
    authorizations: Mutex<Vec<String>>,
    bodies: Mutex<Vec<Value>>,
    models: Mutex<Vec<String>>,
}

impl MockInference {
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(InferenceBehavior::Image).await
    }

    pub async fn start_with(behavior: InferenceBehavior) -> anyhow::Result<Self> {
        let state = Arc::new(MockInferenceState {
            behavior,
            request_count: AtomicU32::new(0),
            authorizations: Mutex::new(Vec::new()),
            bodies: Mutex::new(Vec::new()),
            models: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/models/{*model}", routing::post(handle_inference))
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

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::Relaxed)
    }

    /// `Authorization` header values in arrival order
    pub fn authorizations(&self) -> Vec<String> {
        self.state.authorizations.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.state.bodies.lock().unwrap().clone()
    }

    pub fn models(&self) -> Vec<String> {
        self.state.models.lock().unwrap().clone()
    }
}

impl Drop for MockInference {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_inference(
    State(state): State<Arc<MockInferenceState>>,
    Path(model): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let n = state.request_count.fetch_add(1, Ordering::Relaxed) + 1;
    state.models.lock().unwrap().push(model.clone());
    state.authorizations.lock().unwrap().push(
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned(),
    );
    state.bodies.lock().unwrap().push(body);

    match &state.behavior {
        InferenceBehavior::ColdStart {
            loading,
            estimated_time,
        } if n <= *loading => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": format!("Model {model} is currently loading"),
                "estimated_time": estimated_time
            })),
        )
            .into_response(),
        InferenceBehavior::Status(code, text) => {
            let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, text.clone()).into_response()
        }
        InferenceBehavior::JsonError(message) => Json(json!({ "error": message })).into_response(),
        InferenceBehavior::Html(page) => {
            ([(CONTENT_TYPE, "text/html; charset=utf-8")], page.clone()).into_response()
        }
        InferenceBehavior::Empty => ([(CONTENT_TYPE, "image/jpeg")], Vec::<u8>::new()).into_response(),
        InferenceBehavior::Image | InferenceBehavior::ColdStart { .. } => {
            ([(CONTENT_TYPE, "image/jpeg")], IMAGE_BYTES.to_vec()).into_response()
        }
    }
}
