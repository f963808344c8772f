//! Mock text-to-image backend for integration tests
//!
//! Accepts the Hugging Face inference request shape and answers with PNG
//! bytes, or with a failure chosen per call.

use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing,
};
use tokio_util::sync::CancellationToken;

use super::fixtures;

/// Path the mock serves inference on
const MODEL_PATH: &str = "/models/test-model";

/// How the mock answers one inference call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// 200 with a 512x512 PNG
    Image,
    /// The given status with a JSON error body
    Status(u16),
    /// 200 with bytes that are not an image
    Garbage,
    /// Sleep before answering with an image
    Slow(Duration),
}

/// A request as the mock received it
#[derive(Debug, Clone)]
pub struct Captured {
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

/// Mock inference backend
pub struct MockInference {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    request_count: AtomicU32,
    /// Replies by call index; calls past the end get the last entry
    replies: Vec<Reply>,
    captured: Mutex<Vec<Captured>>,
}

impl MockInference {
    /// Start a mock that always answers with an image
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(vec![Reply::Image]).await
    }

    /// Start a mock that always answers with the given reply
    pub async fn start_replying(reply: Reply) -> anyhow::Result<Self> {
        Self::start_with(vec![reply]).await
    }

    /// Start a mock that answers call `n` with `replies[n]`
    pub async fn start_with(replies: Vec<Reply>) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            request_count: AtomicU32::new(0),
            replies,
            captured: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route(MODEL_PATH, routing::post(handle_inference))
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

    /// Inference URL to configure as the provider endpoint
    pub fn url(&self) -> String {
        format!("http://{}{MODEL_PATH}", self.addr)
    }

    /// Number of inference requests received
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::SeqCst)
    }

    /// Every request received so far, in arrival order
    pub fn captured(&self) -> Vec<Captured> {
        self.state.captured.lock().expect("capture lock poisoned").clone()
    }
}

impl Drop for MockInference {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_inference(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let index = state.request_count.fetch_add(1, Ordering::SeqCst) as usize;

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);

    state
        .captured
        .lock()
        .expect("capture lock poisoned")
        .push(Captured { authorization, body });

    let reply = state
        .replies
        .get(index)
        .or_else(|| state.replies.last())
        .copied()
        .unwrap_or(Reply::Image);

    match reply {
        Reply::Image => image_response(),
        Reply::Status(code) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(serde_json::json!({ "error": "model is loading" }))).into_response()
        }
        Reply::Garbage => ([(header::CONTENT_TYPE, "image/png")], b"not an image".to_vec()).into_response(),
        Reply::Slow(delay) => {
            tokio::time::sleep(delay).await;
            image_response()
        }
    }
}

fn image_response() -> Response {
    ([(header::CONTENT_TYPE, "image/png")], fixtures::png(512, 512)).into_response()
}
