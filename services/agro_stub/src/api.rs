use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::canned;
use crate::error::StubError;
use crate::script::{ReceivedPart, ReceivedRequest, StubState};

type Canned = fn(&ReceivedRequest) -> Result<Value, StubError>;

async fn read_parts(route: &str, mut multipart: Multipart) -> Result<ReceivedRequest, StubError> {
    let mut parts = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| StubError::bad_request(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| StubError::bad_request(format!("malformed multipart body: {e}")))?;
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            data: data.to_vec(),
        });
    }
    Ok(ReceivedRequest {
        route: route.to_string(),
        parts,
    })
}

async fn handle(state: StubState, route: &'static str, multipart: Multipart, canned: Canned) -> Response {
    let req = match read_parts(route, multipart).await {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };
    debug!(route, fields = ?req.names(), "received");
    state.record(req.clone());

    if let Some(reply) = state.scripted(route) {
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        info!(route, status = reply.status, "scripted reply");
        let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, [(header::CONTENT_TYPE, reply.content_type)], reply.body).into_response();
    }

    match canned(&req) {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            info!(route, error = %e, "rejected");
            e.into_response()
        }
    }
}

pub async fn predict_crop(State(state): State<StubState>, multipart: Multipart) -> Response {
    handle(state, "/predict-crop", multipart, canned::crop).await
}

pub async fn predict_fertilizer(State(state): State<StubState>, multipart: Multipart) -> Response {
    handle(state, "/predict-fertilizer", multipart, canned::fertilizer).await
}

pub async fn predict_disease(State(state): State<StubState>, multipart: Multipart) -> Response {
    handle(state, "/predict-disease", multipart, canned::disease).await
}

pub async fn predict_yield(State(state): State<StubState>, multipart: Multipart) -> Response {
    handle(state, "/predict-yield", multipart, canned::yield_prediction).await
}

pub async fn health() -> Json<Value> {
    Json(canned::health())
}

pub async fn index() -> Json<Value> {
    Json(canned::index())
}
