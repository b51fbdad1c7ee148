//! User-facing flows built on the API client and the session store
//!
//! Each flow calls the backend first and only touches the store once the
//! call has succeeded, so a failed request leaves the session as it was.

use coursehub_api::CourseApi;
use coursehub_core::{
    Course, CourseHubError, CourseHubResult, FieldViolation, SigninInput, SignupInput, User,
};
use coursehub_session::SessionStore;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Invalid input: {}", format_violations(.0))]
    Form(Vec<FieldViolation>),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("An active subscription is required")]
    SubscriptionRequired,

    #[error(transparent)]
    Api(#[from] CourseHubError),
}

pub type ActionResult<T> = Result<T, ActionError>;

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} ({})", v.reason, v.field))
        .collect::<Vec<_>>()
        .join("; ")
}

/// What the dashboard shows for the signed-in user
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub user: User,
    pub enrolled: Vec<Course>,
    pub available: Vec<Course>,
}

impl Dashboard {
    pub fn is_enrolled(&self, course_id: &str) -> bool {
        self.enrolled.iter().any(|c| c.id == course_id)
    }
}

pub async fn sign_up(
    api: &dyn CourseApi,
    store: &SessionStore,
    details: SignupInput,
) -> ActionResult<User> {
    details.validate().map_err(ActionError::Form)?;

    let auth = api.signup(&details).await?;
    let user = auth.user.clone();
    store.set_auth(auth.access_token, auth.user);
    info!(email = %user.email, "Signed up");
    Ok(user)
}

pub async fn sign_in(
    api: &dyn CourseApi,
    store: &SessionStore,
    credentials: SigninInput,
) -> ActionResult<User> {
    credentials.validate().map_err(ActionError::Form)?;

    let auth = api.signin(&credentials).await?;
    let user = auth.user.clone();
    store.set_auth(auth.access_token, auth.user);
    info!(email = %user.email, "Signed in");
    Ok(user)
}

pub async fn log_out(api: &dyn CourseApi, store: &SessionStore) -> ActionResult<()> {
    api.logout().await?;
    store.logout();
    Ok(())
}

/// Subscribe and record the server's answer. Returns the new flag, `None`
/// when the server confirmed without sending the profile back.
pub async fn subscribe(api: &dyn CourseApi, store: &SessionStore) -> ActionResult<Option<bool>> {
    require_user(store)?;

    let subscribed = api.subscribe().await?.map(|user| user.subscribed);
    match subscribed {
        Some(flag) => store.set_subscribed(flag),
        None => debug!("Subscribe returned no content; session left as is"),
    }
    Ok(subscribed)
}

/// Courses the signed-in user is enrolled in
pub async fn my_courses(api: &dyn CourseApi, store: &SessionStore) -> ActionResult<Vec<Course>> {
    require_user(store)?;
    Ok(api.get_user_courses().await?)
}

/// The full catalogue alongside the enrolled list, for subscribers only
pub async fn load_dashboard(api: &dyn CourseApi, store: &SessionStore) -> ActionResult<Dashboard> {
    let user = require_user(store)?;
    if !user.subscribed {
        return Err(ActionError::SubscriptionRequired);
    }

    let enrolled = api.get_user_courses().await?;
    let available = api.get_courses().await?;

    Ok(Dashboard {
        user,
        enrolled,
        available,
    })
}

/// Result of an enrollment the server accepted
#[derive(Debug)]
pub struct Enrollment {
    /// Enrolled list fetched afterwards. A failure here leaves the
    /// enrollment itself in place.
    pub enrolled: CourseHubResult<Vec<Course>>,
}

/// Enroll, store the returned profile and fetch the updated enrolled list
pub async fn enroll(
    api: &dyn CourseApi,
    store: &SessionStore,
    course_id: &str,
) -> ActionResult<Enrollment> {
    require_user(store)?;

    if let Some(updated) = api.enroll_course(course_id).await? {
        store.refresh_user(updated);
    }

    let enrolled = api.get_user_courses().await;
    match &enrolled {
        Ok(courses) => info!(course_id, enrolled = courses.len(), "Enrolled in course"),
        Err(e) => warn!(course_id, error = %e, "Enrolled, but refreshing the course list failed"),
    }
    Ok(Enrollment { enrolled })
}

fn require_user(store: &SessionStore) -> ActionResult<User> {
    store.user().ok_or(ActionError::NotSignedIn)
}
