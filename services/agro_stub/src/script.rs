//! Scripted replies and a log of everything the stub received.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// A canned reply that overrides a route's default behavior.
#[derive(Debug, Clone)]
pub struct Scripted {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
    pub delay: Duration,
}

impl Scripted {
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            content_type: "application/json",
            delay: Duration::ZERO,
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "text/plain",
            delay: Duration::ZERO,
        }
    }

    /// Hold the reply back; keeps a request in flight for tests.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One multipart part as received.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl ReceivedPart {
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedRequest {
    pub route: String,
    pub parts: Vec<ReceivedPart>,
}

impl ReceivedRequest {
    pub fn part(&self, name: &str) -> Option<&ReceivedPart> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Text value of a field, if present and UTF-8.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.part(name).and_then(ReceivedPart::text)
    }

    pub fn names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }
}

#[derive(Clone, Default)]
pub struct StubState {
    scripts: Arc<Mutex<HashMap<String, Scripted>>>,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StubState {
    /// Answer every request on `route` with `reply` until cleared.
    pub fn script(&self, route: &str, reply: Scripted) {
        lock(&self.scripts).insert(route.to_string(), reply);
    }

    pub fn clear(&self, route: &str) {
        lock(&self.scripts).remove(route);
    }

    pub fn scripted(&self, route: &str) -> Option<Scripted> {
        lock(&self.scripts).get(route).cloned()
    }

    pub fn record(&self, req: ReceivedRequest) {
        lock(&self.received).push(req);
    }

    pub fn received(&self) -> Vec<ReceivedRequest> {
        lock(&self.received).clone()
    }

    pub fn received_on(&self, route: &str) -> Vec<ReceivedRequest> {
        lock(&self.received)
            .iter()
            .filter(|r| r.route == route)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.received).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_replace_and_clear() {
        let state = StubState::default();
        state.script("/predict-crop", Scripted::text(500, "boom"));
        state.script("/predict-crop", Scripted::text(502, "bad gateway"));
        assert_eq!(state.scripted("/predict-crop").unwrap().status, 502);
        state.clear("/predict-crop");
        assert!(state.scripted("/predict-crop").is_none());
    }

    #[test]
    fn received_filters_by_route() {
        let state = StubState::default();
        state.record(ReceivedRequest { route: "/predict-crop".into(), parts: vec![] });
        state.record(ReceivedRequest { route: "/predict-yield".into(), parts: vec![] });
        assert_eq!(state.request_count(), 2);
        assert_eq!(state.received_on("/predict-yield").len(), 1);
    }
}
