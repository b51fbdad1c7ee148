//! Schema validation at the network boundary
//!
//! Response bodies arrive as untyped JSON. Nothing is handed to a caller until
//! it has been decoded into a typed record and checked against the field
//! rules below; form input goes through the same rules before it is sent.

use crate::error::{CourseHubError, ErrorContext};
use crate::types::{AuthResponse, Course, SigninInput, SignupInput, User};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::LazyLock;

pub const MIN_FIRST_NAME_CHARS: usize = 3;
pub const MIN_PASSWORD_CHARS: usize = 8;
pub const PASSWORD_SPECIAL_CHARS: &str = "@#$%^&+=!";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

/// A single rule broken by a record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Turn the violation into the caller-facing validation error
    pub fn into_error(self, message: &str, component: &str) -> CourseHubError {
        CourseHubError::Validation {
            message: message.to_string(),
            context: ErrorContext::new(component)
                .with_operation("validate")
                .with_metadata("reason", &self.reason)
                .with_suggestion("The server response does not match the expected shape"),
            field: Some(self.field),
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    !email.starts_with('.') && !email.contains("..") && EMAIL_RE.is_match(email)
}

/// Decode and check a user record
pub fn validate_user(value: Value) -> Result<User, FieldViolation> {
    let object = expect_object(&value, "user")?;

    for field in ["first_name", "email"] {
        if !object.contains_key(field) {
            return Err(FieldViolation::new(field, "required"));
        }
    }
    // Optional and defaulted fields may be omitted, but an explicit null is a type error.
    for field in ["last_name", "age", "courses", "subscribed"] {
        if matches!(object.get(field), Some(Value::Null)) {
            return Err(FieldViolation::new(field, "must not be null"));
        }
    }

    let user: User = decode(value, "user")?;

    if user.first_name.chars().count() < MIN_FIRST_NAME_CHARS {
        return Err(FieldViolation::new(
            "first_name",
            format!("must contain at least {} characters", MIN_FIRST_NAME_CHARS),
        ));
    }
    if !is_valid_email(&user.email) {
        return Err(FieldViolation::new("email", "invalid email address"));
    }

    Ok(user)
}

/// Decode and check a signup/signin payload
pub fn validate_auth_response(value: Value) -> Result<AuthResponse, FieldViolation> {
    let mut object = match value {
        Value::Object(object) => object,
        _ => return Err(FieldViolation::new("$", "expected an object")),
    };

    let access_token = match object.remove("access_token") {
        Some(Value::String(token)) if !token.is_empty() => token,
        Some(Value::String(_)) => {
            return Err(FieldViolation::new("access_token", "must not be empty"))
        }
        Some(_) => return Err(FieldViolation::new("access_token", "expected a string")),
        None => return Err(FieldViolation::new("access_token", "required")),
    };

    let user = match object.remove("user") {
        Some(user) => validate_user(user).map_err(|v| FieldViolation {
            field: format!("user.{}", v.field),
            reason: v.reason,
        })?,
        None => return Err(FieldViolation::new("user", "required")),
    };

    Ok(AuthResponse { access_token, user })
}

/// Decode a course listing
pub fn validate_courses(value: Value) -> Result<Vec<Course>, FieldViolation> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| decode(item, &format!("courses[{}]", index)))
            .collect(),
        _ => Err(FieldViolation::new("courses", "expected an array")),
    }
}

impl SignupInput {
    /// Check the registration form, reporting every broken rule
    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        let mut violations = Vec::new();

        if self.first_name.chars().count() < MIN_FIRST_NAME_CHARS {
            violations.push(FieldViolation::new(
                "first_name",
                "First name must be at least 3 characters",
            ));
        }
        if self.last_name.is_empty() {
            violations.push(FieldViolation::new("last_name", "Last name is required"));
        }
        if !is_valid_email(&self.email) {
            violations.push(FieldViolation::new("email", "Invalid email address"));
        }
        violations.extend(password_violations(&self.password));

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

impl SigninInput {
    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        let mut violations = Vec::new();

        if !is_valid_email(&self.email) {
            violations.push(FieldViolation::new("email", "Invalid email address"));
        }
        if self.password.is_empty() {
            violations.push(FieldViolation::new("password", "Password is required"));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn password_violations(password: &str) -> Vec<FieldViolation> {
    let rules: [(bool, &str); 5] = [
        (
            password.chars().count() >= MIN_PASSWORD_CHARS,
            "Password must be at least 8 characters",
        ),
        (
            password.chars().any(|c| c.is_ascii_uppercase()),
            "Password must contain an uppercase letter",
        ),
        (
            password.chars().any(|c| c.is_ascii_lowercase()),
            "Password must contain a lowercase letter",
        ),
        (
            password.chars().any(|c| c.is_ascii_digit()),
            "Password must contain a number",
        ),
        (
            password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)),
            "Password must contain a special character (@#$%^&+=!)",
        ),
    ];

    rules
        .into_iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, reason)| FieldViolation::new("password", reason))
        .collect()
}

fn expect_object<'a>(value: &'a Value, field: &str) -> Result<&'a Map<String, Value>, FieldViolation> {
    value
        .as_object()
        .ok_or_else(|| FieldViolation::new(field, "expected an object"))
}

fn decode<T: DeserializeOwned>(value: Value, field: &str) -> Result<T, FieldViolation> {
    serde_json::from_value(value).map_err(|e| FieldViolation::new(field, e.to_string()))
}
