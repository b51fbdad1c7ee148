//! HTTP plumbing shared by every operation

use crate::config::ApiClientConfig;
use coursehub_core::{CourseHubError, CourseHubResult, ErrorContext};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;

/// Build the HTTP client with the configured user agent, extra headers and timeout
pub(crate) fn create_http_client(config: &ApiClientConfig) -> CourseHubResult<reqwest::Client> {
    let mut headers = HeaderMap::new();

    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent).map_err(|e| CourseHubError::Config {
            message: format!("Invalid user agent: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })?,
    );

    for (key, value) in &config.headers {
        let header_name =
            HeaderName::from_bytes(key.as_bytes()).map_err(|e| CourseHubError::Config {
                message: format!("Invalid header name '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            })?;

        let header_value = HeaderValue::from_str(value).map_err(|e| CourseHubError::Config {
            message: format!("Invalid header value for '{}': {}", key, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })?;

        headers.insert(header_name, header_value);
    }

    let mut builder = reqwest::Client::builder().default_headers(headers);
    if let Some(seconds) = config.timeout_seconds {
        builder = builder.timeout(std::time::Duration::from_secs(seconds));
    }

    builder.build().map_err(|e| CourseHubError::Config {
        message: format!("Failed to create HTTP client: {}", e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("http_client").with_operation("create_client"),
    })
}

/// Message for a non-success response: the body's `message` field if it has
/// one, otherwise a generic status line
pub(crate) fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|json| match json.get("message") {
            Some(Value::String(message)) if !message.is_empty() => Some(message.clone()),
            _ => None,
        })
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()))
}

/// Error for a response the server answered with a failure status
pub(crate) fn server_error(status: StatusCode, body: &[u8], endpoint: &str) -> CourseHubError {
    CourseHubError::Request {
        message: error_message(status, body),
        status: Some(status.as_u16()),
        source: None,
        context: ErrorContext::new("api_client")
            .with_operation(endpoint)
            .with_suggestion(match status.as_u16() {
                401 => "Sign in again; the session may have expired",
                403 => "The account is not allowed to do this",
                404 => "The requested resource does not exist",
                _ => "Check network connectivity and API status",
            }),
    }
}

/// Error for a request that never produced a usable response
pub(crate) fn transport_error(
    error: reqwest::Error,
    endpoint: &str,
    status: Option<u16>,
) -> CourseHubError {
    let message = if error.is_timeout() {
        format!("Request to {} timed out", endpoint)
    } else if error.is_connect() {
        format!("Could not connect to the server: {}", error)
    } else {
        format!("Network error: {}", error)
    };

    CourseHubError::Request {
        message,
        status,
        source: Some(Box::new(error)),
        context: ErrorContext::new("api_client")
            .with_operation(endpoint)
            .with_suggestion("Check network connectivity and retry"),
    }
}
