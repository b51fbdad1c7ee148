//! API client configuration

use coursehub_core::{ApiConfig, CourseHubResult};
use std::collections::HashMap;

/// Configuration for [`ApiClient`](crate::ApiClient)
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Validated base URL, no trailing slash
    pub base_url: String,
    /// Request timeout in seconds; `None` leaves it to the transport
    pub timeout_seconds: Option<u64>,
    /// User agent string
    pub user_agent: String,
    /// Additional headers
    pub headers: HashMap<String, String>,
}

impl ApiClientConfig {
    /// Build a configuration for `base_url`. An empty or malformed URL is rejected.
    pub fn new(base_url: impl Into<String>) -> CourseHubResult<Self> {
        Self::from_api_config(&ApiConfig {
            base_url: Some(base_url.into()),
            ..ApiConfig::default()
        })
    }

    pub fn from_api_config(api: &ApiConfig) -> CourseHubResult<Self> {
        Ok(Self {
            base_url: api.base_url()?,
            timeout_seconds: api.timeout_seconds,
            user_agent: api.user_agent.clone(),
            headers: HashMap::new(),
        })
    }

    /// Set additional header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Absolute URL of an endpoint path
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}
