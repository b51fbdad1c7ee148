//! HTTP implementation of [`CourseApi`]

use crate::config::ApiClientConfig;
use crate::http::{create_http_client, server_error, transport_error};
use crate::{endpoints, CourseApi, TokenSource};
use async_trait::async_trait;
use coursehub_core::{
    log_operation_start, log_operation_success, validate_auth_response, validate_courses,
    validate_user, AuthResponse, Course, CourseHubError, CourseHubResult, EnrollRequest,
    ErrorContext, SigninInput, SignupInput, User,
};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "api_client";

const SIGNUP_INVALID: &str = "Signup failed: Invalid data received";
const SIGNIN_INVALID: &str = "Signin failed: Invalid data received";
const SUBSCRIBE_INVALID: &str = "Subscription failed: Invalid data received";
const ENROLL_INVALID: &str = "Enrollment failed: Invalid data received";
const COURSES_INVALID: &str = "Failed to load courses: Invalid data received";

/// Backend client authenticating with whatever token the source holds at call time
pub struct ApiClient {
    client: reqwest::Client,
    config: ApiClientConfig,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new<T>(config: ApiClientConfig, tokens: T) -> CourseHubResult<Self>
    where
        T: TokenSource + 'static,
    {
        let client = create_http_client(&config)?;

        info!("Created CourseHub API client for {}", config.base_url);

        Ok(Self {
            client,
            config,
            tokens: Arc::new(tokens),
        })
    }

    /// Issue a request and return its JSON payload, `None` for a no-content answer
    async fn fetch(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<String>,
    ) -> CourseHubResult<Option<Value>> {
        let url = self.config.url_for(endpoint);
        debug!(%method, %url, "Sending API request");

        let mut request = self
            .client
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(token) = self.tokens.bearer_token().filter(|t| !t.is_empty()) {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = transport_error(e, endpoint, None);
                warn!(endpoint, error = %err, "Network or fetch error");
                return Err(err);
            }
        };

        let status = response.status();
        let explicit_empty = response
            .headers()
            .get(CONTENT_LENGTH)
            .is_some_and(|value| value.as_bytes() == b"0");

        if !status.is_success() {
            // An unreadable error body is handled like an unparsable one
            let body = match response.bytes().await {
                Ok(bytes) => bytes.to_vec(),
                Err(e) => {
                    debug!(endpoint, error = %e, "Failed to read error response body");
                    Vec::new()
                }
            };
            let err = server_error(status, &body, endpoint);
            warn!(endpoint, status = status.as_u16(), error = %err, "API error");
            return Err(err);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, endpoint, Some(status.as_u16())))?;

        if status == StatusCode::NO_CONTENT || explicit_empty || bytes.is_empty() {
            debug!(endpoint, status = status.as_u16(), "No content in response");
            return Ok(None);
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| CourseHubError::Request {
                message: format!("Invalid JSON in response from {}: {}", endpoint, e),
                status: Some(status.as_u16()),
                source: Some(Box::new(e)),
                context: ErrorContext::new(COMPONENT).with_operation(endpoint),
            })
    }

    async fn post_json<B>(&self, endpoint: &str, body: &B) -> CourseHubResult<Option<Value>>
    where
        B: serde::Serialize + Sync,
    {
        let body = serde_json::to_string(body)?;
        self.fetch(Method::POST, endpoint, Some(body)).await
    }

    async fn auth_request<B>(
        &self,
        endpoint: &str,
        body: &B,
        invalid_message: &str,
    ) -> CourseHubResult<AuthResponse>
    where
        B: serde::Serialize + Sync,
    {
        let payload = self.post_json(endpoint, body).await?;
        let value = require_payload(payload, invalid_message)?;
        validate_auth_response(value).map_err(|v| reject(v, invalid_message))
    }

    async fn course_list(&self, endpoint: &str) -> CourseHubResult<Vec<Course>> {
        match self.fetch(Method::GET, endpoint, None).await? {
            Some(value) => validate_courses(value).map_err(|v| reject(v, COURSES_INVALID)),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl CourseApi for ApiClient {
    async fn signup(&self, details: &SignupInput) -> CourseHubResult<AuthResponse> {
        log_operation_start!("signup", email = %details.email);
        let auth = self
            .auth_request(endpoints::SIGNUP, details, SIGNUP_INVALID)
            .await?;
        log_operation_success!("signup", email = %auth.user.email);
        Ok(auth)
    }

    async fn signin(&self, credentials: &SigninInput) -> CourseHubResult<AuthResponse> {
        log_operation_start!("signin", email = %credentials.email);
        let auth = self
            .auth_request(endpoints::SIGNIN, credentials, SIGNIN_INVALID)
            .await?;
        log_operation_success!("signin", email = %auth.user.email);
        Ok(auth)
    }

    async fn logout(&self) -> CourseHubResult<()> {
        info!("Logout requested; no server-side action, caller clears the session");
        Ok(())
    }

    async fn subscribe(&self) -> CourseHubResult<Option<User>> {
        log_operation_start!("subscribe");
        let payload = self.fetch(Method::POST, endpoints::SUBSCRIBE, None).await?;
        let user = payload
            .map(validate_user)
            .transpose()
            .map_err(|v| reject(v, SUBSCRIBE_INVALID))?;
        let subscribed = user.as_ref().map(|u| u.subscribed);
        log_operation_success!("subscribe", subscribed = ?subscribed);
        Ok(user)
    }

    async fn get_courses(&self) -> CourseHubResult<Vec<Course>> {
        log_operation_start!("get_courses");
        let courses = self.course_list(endpoints::COURSES).await?;
        log_operation_success!("get_courses", count = courses.len());
        Ok(courses)
    }

    async fn get_user_courses(&self) -> CourseHubResult<Vec<Course>> {
        log_operation_start!("get_user_courses");
        let courses = self.course_list(endpoints::USER_COURSES).await?;
        log_operation_success!("get_user_courses", count = courses.len());
        Ok(courses)
    }

    async fn enroll_course(&self, course_id: &str) -> CourseHubResult<Option<User>> {
        log_operation_start!("enroll_course", course_id);
        let payload = self
            .post_json(endpoints::ENROLL, &EnrollRequest { course_id })
            .await?;
        let user = payload
            .map(validate_user)
            .transpose()
            .map_err(|v| reject(v, ENROLL_INVALID))?;
        log_operation_success!("enroll_course", course_id);
        Ok(user)
    }
}

fn require_payload(payload: Option<Value>, invalid_message: &str) -> CourseHubResult<Value> {
    payload.ok_or_else(|| CourseHubError::Validation {
        message: invalid_message.to_string(),
        field: None,
        context: ErrorContext::new(COMPONENT)
            .with_operation("validate")
            .with_metadata("reason", "empty response body"),
    })
}

fn reject(violation: coursehub_core::FieldViolation, message: &str) -> CourseHubError {
    let err = violation.into_error(message, COMPONENT);
    err.log();
    err
}
