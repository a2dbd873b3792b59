use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::ProviderError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ApiClientParams {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiClientParams {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

/// Thin wrapper over a pooled `reqwest::Client` bound to the portal's base URL.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(params: ApiClientParams) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(params.timeout).build()?;

        Ok(Self {
            base_url: params.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let response = self.client.get(self.url(path)).send().await?;
        let body = success_body(response).await?;

        Ok(serde_json::from_str(&body)?)
    }
}

/// Returns the body of a successful response, or an `Api` error carrying the
/// most readable message found in the error body. A successful response whose
/// body cannot be read is a `Request` error.
pub(crate) async fn success_body(response: Response) -> Result<String, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.text().await?);
    }

    Err(api_error(status, response).await)
}

/// Builds the `Api` error of a failed response. The body is only read for a
/// better message, so a body that cannot be read falls back to the status.
pub(crate) async fn api_error(status: StatusCode, response: Response) -> ProviderError {
    let body = match response.text().await {
        Ok(body) => body,
        Err(error) => {
            tracing::debug!(error = %error, "Could not read error body");
            String::new()
        }
    };

    ProviderError::Api {
        status: status.as_u16(),
        message: error_message(status, &body),
    }
}

/// Error bodies are either JSON (`{"message": ...}`, `{"error": ...}`) or plain text.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let field = ["message", "error", "detail"]
            .iter()
            .filter_map(|key| value.get(key).and_then(|v| v.as_str()))
            .map(str::trim)
            .find(|message| !message.is_empty());

        if let Some(message) = field {
            return message.to_string();
        }

        if let Some(message) = value.as_str() {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && !trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => format!("HTTP {}", status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = ApiClient::new(ApiClientParams {
            base_url: "http://fleet.local:9000/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(client.base_url(), "http://fleet.local:9000");
        assert_eq!(
            client.url("/api/buses"),
            "http://fleet.local:9000/api/buses"
        );
    }

    #[test]
    fn test_error_message_prefers_json_message() {
        let body = r#"{"timestamp": "2025-01-01", "message": "Bus 4 not found", "error": "Not Found"}"#;
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, body),
            "Bus 4 not found"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_error_field() {
        let body = r#"{"error": "Invalid latitude"}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "Invalid latitude"
        );
    }

    #[test]
    fn test_error_message_plain_text() {
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "  Redis unavailable \n"),
            "Redis unavailable"
        );
    }

    #[test]
    fn test_error_message_empty_body_uses_status() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, ""),
            "502 Bad Gateway"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"message": ""}"#),
            "400 Bad Request"
        );
    }
}
