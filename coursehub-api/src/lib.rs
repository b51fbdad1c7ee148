//! CourseHub API - Gateway to the course-enrollment backend
//!
//! The [`ApiClient`] turns domain operations into HTTP requests against a
//! configured base URL. It reads the bearer token from a [`TokenSource`]
//! (normally the session store) at call time, validates every response
//! against the expected schema and reports all failures as a single
//! [`CourseHubError`](coursehub_core::CourseHubError). It never mutates the
//! session: pushing results into the store is the caller's job.

use async_trait::async_trait;
use coursehub_core::{AuthResponse, Course, CourseHubResult, SigninInput, SignupInput, User};
use coursehub_session::SessionStore;

pub mod client;
pub mod config;
mod http;

pub use client::ApiClient;
pub use config::ApiClientConfig;

/// Backend routes, relative to the base URL
pub mod endpoints {
    pub const SIGNUP: &str = "/user/signup";
    pub const SIGNIN: &str = "/user/signin";
    pub const SUBSCRIBE: &str = "/user/subscribe";
    pub const COURSES: &str = "/courses";
    pub const USER_COURSES: &str = "/courses/user";
    pub const ENROLL: &str = "/courses/add";
}

/// Read-only access to the current bearer credential
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

impl TokenSource for SessionStore {
    fn bearer_token(&self) -> Option<String> {
        self.token()
    }
}

/// Operations offered by the backend
#[async_trait]
pub trait CourseApi: Send + Sync {
    /// Register a new account
    async fn signup(&self, details: &SignupInput) -> CourseHubResult<AuthResponse>;

    /// Exchange email and password for a token
    async fn signin(&self, credentials: &SigninInput) -> CourseHubResult<AuthResponse>;

    /// End the session on the server side. Currently local only.
    async fn logout(&self) -> CourseHubResult<()>;

    /// Start a subscription; `None` when the server answers without content
    async fn subscribe(&self) -> CourseHubResult<Option<User>>;

    /// Every course on offer
    async fn get_courses(&self) -> CourseHubResult<Vec<Course>>;

    /// Courses the authenticated user is enrolled in
    async fn get_user_courses(&self) -> CourseHubResult<Vec<Course>>;

    /// Enroll in a course; `None` when the server answers without content
    async fn enroll_course(&self, course_id: &str) -> CourseHubResult<Option<User>>;
}
