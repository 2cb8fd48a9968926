//! HTTP adapter — one multipart POST per submission.
//!
//! Every body goes out as `multipart/form-data`: primitives stringified,
//! an image attached under [`IMAGE_FIELD`]. Responses are normalized:
//! - 2xx: body parsed as a JSON object
//! - non-2xx: the body's `error` field verbatim, else `HTTP {status}`
//! - anything that stops a response from arriving: [`AdapterError::Transport`]
//!
//! No retries, no timeout override, no cancellation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{AdapterError, Result};
use crate::response::{self, HealthStatus, ServiceInfo};
use crate::types::{Body, Endpoint, IMAGE_FIELD};
use crate::Submit;

pub struct HttpAdapter {
    base: String,
    http: reqwest::Client,
}

impl HttpAdapter {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Adapter pointed at `AGRO_API_URL` (or the local default).
    pub fn from_env() -> Self {
        Self::new(agro_config::api_base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthStatus> {
        let value = self.send("/health", self.http.get(self.url("/health"))).await?;
        response::decode("/health", value)
    }

    /// `GET /`
    pub async fn service_info(&self) -> Result<ServiceInfo> {
        let value = self.send("/", self.http.get(self.url("/"))).await?;
        response::decode("/", value)
    }

    async fn send(&self, route: &str, req: RequestBuilder) -> Result<Value> {
        let resp = req.send().await.map_err(|e| {
            warn!(route, error = %e, "request failed before a response arrived");
            AdapterError::Transport(e.to_string())
        })?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| {
            warn!(route, status = status.as_u16(), error = %e, "response body interrupted");
            AdapterError::Transport(e.to_string())
        })?;

        if !status.is_success() {
            let err = failure_from_body(status.as_u16(), &body);
            warn!(route, status = status.as_u16(), reported = %err, "service reported failure");
            return Err(err);
        }

        debug!(route, status = status.as_u16(), bytes = body.len(), "response received");
        parse_success(route, &body)
    }
}

#[async_trait]
impl Submit for HttpAdapter {
    async fn submit(&self, endpoint: Endpoint, body: Body) -> Result<Value> {
        let route = endpoint.path();
        debug!(route, fields = ?body.field_names(), "submitting");
        let form = multipart_form(body)?;
        self.send(route, self.http.post(self.url(route)).multipart(form)).await
    }
}

/// Encode a body as multipart form data.
pub fn multipart_form(body: Body) -> Result<Form> {
    match body {
        Body::Fields(fields) => Ok(fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value.to_string()))),
        Body::Image(image) => {
            let part = Part::bytes(image.bytes)
                .file_name(image.file_name)
                .mime_str(&image.content_type)
                .map_err(|e| AdapterError::Encode(format!("content type: {e}")))?;
            Ok(Form::new().part(IMAGE_FIELD, part))
        }
    }
}

/// Normalize a non-success response into [`AdapterError::Server`].
pub fn failure_from_body(status: u16, body: &[u8]) -> AdapterError {
    let reported = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.is_empty());

    AdapterError::Server {
        status,
        message: reported.unwrap_or_else(|| format!("HTTP {status}")),
    }
}

/// Parse a success body. It must be JSON; shape is checked by the decode step.
pub fn parse_success(route: &str, body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body).map_err(|e| AdapterError::Decode {
        route: route.to_string(),
        detail: e.to_string(),
    })
}
