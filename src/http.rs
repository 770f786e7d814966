//! Small helpers shared by the HTTP clients.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

/// Falls back to reqwest's defaults, without the timeout, when the TLS
/// backend cannot be initialised.
pub fn build_client(timeout: Duration) -> Client {
    match Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(err) => {
            log::warn!(
                "HTTP client with {}ms timeout unavailable ({err}); using defaults",
                timeout.as_millis()
            );
            Client::new()
        }
    }
}

pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    error: Option<String>,
}

/// Pulls the server's `detail` (FastAPI) or `error` (Flask) message out of a
/// failed response, falling back to the status reason.
pub async fn error_detail(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let fallback = status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string();

    let body = match response.text().await {
        Ok(body) => body,
        Err(_) => return (status, fallback),
    };

    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| match parsed.detail {
            Some(serde_json::Value::String(text)) => Some(text),
            Some(other) if !other.is_null() => Some(other.to_string()),
            _ => parsed.error,
        })
        .filter(|text| !text.trim().is_empty())
        .unwrap_or(fallback);

    (status, detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slashes() {
        assert_eq!(
            endpoint("http://127.0.0.1:8000/", "/start_session/"),
            "http://127.0.0.1:8000/start_session/"
        );
        assert_eq!(
            endpoint("http://127.0.0.1:5001", "predict_emotion"),
            "http://127.0.0.1:5001/predict_emotion"
        );
    }

    #[test]
    fn base_url_is_trimmed() {
        assert_eq!(normalize_base_url(" http://host:8000/ "), "http://host:8000");
    }
}
