//! Process-wide settings for talking to the inference service.
//!
//! The base URL is resolved once from `AGRO_API_URL` and falls back to a
//! local development address when unset or blank.

use lazy_static::lazy_static;
use std::env;

/// Environment variable holding the inference service base URL.
pub const API_URL_ENV: &str = "AGRO_API_URL";

/// Used when `AGRO_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

lazy_static! {
    /// Base URL read from the environment on first access.
    pub static ref API_BASE_URL: String = resolve_base_url(env::var(API_URL_ENV).ok().as_deref());
}

/// Normalize a configured base URL: blank means default, trailing slashes
/// are dropped so routes can be appended verbatim.
pub fn resolve_base_url(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s.trim_end_matches('/').to_string(),
        _ => DEFAULT_API_URL.to_string(),
    }
}

/// The base URL for this process.
pub fn api_base_url() -> &'static str {
    API_BASE_URL.as_str()
}
