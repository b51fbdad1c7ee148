//! Core data type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// User profile as owned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    pub email: String,
    /// Enrolled course ids, opaque to the client
    #[serde(default)]
    pub courses: Vec<String>,
    #[serde(default)]
    pub subscribed: bool,
}

impl User {
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }

    pub fn is_enrolled(&self, course_id: &str) -> bool {
        self.courses.iter().any(|id| id == course_id)
    }
}

/// Course record, read-only from the client's perspective
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Successful signup/signin payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}

/// Registration form
#[derive(Clone, Serialize, Deserialize)]
pub struct SignupInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SignupInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupInput")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login form
#[derive(Clone, Serialize, Deserialize)]
pub struct SigninInput {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SigninInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigninInput")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /courses/add`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest<'a> {
    pub course_id: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn course_reads_mongo_style_id() {
        let course: Course =
            serde_json::from_value(json!({"_id": "c1", "name": "Rust", "description": "Intro"}))
                .unwrap();
        assert_eq!(course.id, "c1");

        let course: Course =
            serde_json::from_value(json!({"id": "c2", "name": "Go", "description": "Intro"}))
                .unwrap();
        assert_eq!(course.id, "c2");
        assert_eq!(serde_json::to_value(&course).unwrap()["_id"], "c2");
    }

    #[test]
    fn enroll_request_uses_camel_case() {
        let body = serde_json::to_value(EnrollRequest { course_id: "c1" }).unwrap();
        assert_eq!(body, json!({"courseId": "c1"}));
    }

    #[test]
    fn debug_hides_passwords() {
        let input = SigninInput {
            email: "a@b.com".to_string(),
            password: "secret1".to_string(),
        };
        let rendered = format!("{:?}", input);
        assert!(!rendered.contains("secret1"));
        assert!(rendered.contains("a@b.com"));
    }
}
