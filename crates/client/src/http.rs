//! HTTP layer: URL building, auth, status mapping, body decoding.
//!
//! Nothing outside this module looks at a status code.

use parlant_console_core::errors::{ApiError, ApiResult};
use reqwest::{Method, RequestBuilder, Response, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: Url,
    pub(crate) token: Option<SecretString>,
}

impl HttpBackend {
    /// Appends percent-encoded path segments to the base URL, keeping any
    /// path prefix the base already carries.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                let base = self.base_url.as_str();
                ApiError::Validation(format!("api base url `{base}` cannot carry a path"))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Sends the request and decodes a 2xx JSON body into `T`.
    pub(crate) async fn send_json<T>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(operation, request).await?;
        let bytes = response.bytes().await.map_err(|error| {
            let mapped = ApiError::Network(format!("failed to read response body: {error}"));
            log_failure(operation, mapped)
        })?;

        serde_json::from_slice(&bytes).map_err(|error| {
            log_failure(operation, ApiError::InvalidResponse(format!("{operation}: {error}")))
        })
    }

    /// Sends the request and ignores any 2xx body.
    pub(crate) async fn send_empty(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> ApiResult<()> {
        self.send(operation, request).await.map(drop)
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> ApiResult<Response> {
        debug!(event_name = "console.client.request", operation, "sending request");

        let response = request.send().await.map_err(|error| {
            let mapped = if error.is_timeout() {
                ApiError::Network(format!("request timed out: {error}"))
            } else {
                ApiError::Network(error.to_string())
            };
            log_failure(operation, mapped)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Error bodies are best effort; an unreadable one still yields the status.
        let body = response.text().await.unwrap_or_default();
        Err(log_failure(operation, ApiError::request(status.as_u16(), error_message(&body))))
    }
}

fn log_failure(operation: &'static str, error: ApiError) -> ApiError {
    warn!(
        event_name = "console.client.request_failed",
        operation,
        error_class = error.error_class(),
        status = error.status(),
        error = %error,
        "backend request failed"
    );
    error
}

/// Extracts `message`, then `detail`, from a JSON error body.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    ["message", "detail"].iter().find_map(|key| match value.get(*key)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Null | Value::String(_) => None,
        other => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::Url;

    use super::{error_message, HttpBackend};

    fn backend(base: &str) -> HttpBackend {
        HttpBackend {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(1))
                .build()
                .expect("client should build"),
            base_url: Url::parse(base).expect("base url should parse"),
            token: None,
        }
    }

    #[test]
    fn endpoint_percent_encodes_user_supplied_segments() {
        let url = backend("http://localhost:8800")
            .endpoint(&["services", "billing api/v2"])
            .expect("endpoint should build");

        assert_eq!(url.as_str(), "http://localhost:8800/services/billing%20api%2Fv2");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let url = backend("http://gateway.local/parlant/")
            .endpoint(&["agents", "ag_1"])
            .expect("endpoint should build");

        assert_eq!(url.path(), "/parlant/agents/ag_1");
    }

    #[test]
    fn error_message_prefers_message_over_detail() {
        assert_eq!(
            error_message(r#"{"message": "agent not found", "detail": "ignored"}"#),
            Some("agent not found".to_owned())
        );
        assert_eq!(error_message(r#"{"detail": "Not Found"}"#), Some("Not Found".to_owned()));
        assert_eq!(error_message(r#"{"message": null}"#), None);
        assert_eq!(error_message("<html>bad gateway</html>"), None);
    }
}
