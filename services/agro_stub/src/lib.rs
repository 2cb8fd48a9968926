pub mod api;
pub mod canned;
pub mod error;
pub mod script;

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

pub use error::StubError;
pub use script::{ReceivedPart, ReceivedRequest, Scripted, StubState};

/// Max request body size: 16 MiB (leaf photos)
const MAX_BODY_BYTES: usize = 16 * 1_048_576;
/// Request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn app(state: StubState) -> Router {
    Router::new()
        .route("/", get(api::index))
        .route("/health", get(api::health))
        .route("/predict-crop", post(api::predict_crop))
        .route("/predict-fertilizer", post(api::predict_fertilizer))
        .route("/predict-disease", post(api::predict_disease))
        .route("/predict-yield", post(api::predict_yield))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(middleware::from_fn(require_multipart_content_type))
        .with_state(state)
}

/// Middleware: reject POST requests that are not multipart/form-data.
async fn require_multipart_content_type(req: Request, next: Next) -> Response {
    let is_multipart = match req.method().as_str() {
        "POST" | "PUT" | "PATCH" => req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("multipart/form-data"))
            .unwrap_or(false),
        _ => true,
    };
    if !is_multipart {
        return StubError::unsupported_media_type().into_response();
    }
    next.run(req).await
}

pub mod test {
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    use crate::script::StubState;

    /// Spawn the stub on a random port. Returns the address, the state
    /// handle for scripting and inspection, and a JoinHandle that keeps the
    /// server alive until dropped.
    pub async fn spawn() -> std::io::Result<(SocketAddr, StubState, tokio::task::JoinHandle<()>)> {
        let state = StubState::default();
        let app = super::app(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "stub server stopped");
            }
        });
        Ok((addr, state, handle))
    }
}
