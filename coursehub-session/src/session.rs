//! Session snapshot and its persisted form

use coursehub_core::User;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version tag written alongside the persisted state
pub const PERSISTED_VERSION: u32 = 0;

/// Bearer token and the profile it was issued for. Always set and cleared together.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub token: String,
    pub user: User,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Immutable view of the authentication state at one point in time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub(crate) credentials: Option<Credentials>,
    pub(crate) refresh_attempted: bool,
}

impl Session {
    pub fn token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.credentials.as_ref().map(|c| &c.user)
    }

    /// True iff both a token and a user are present
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn refresh_attempted(&self) -> bool {
        self.refresh_attempted
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

/// On-disk document: `{"state": {...}, "version": 0}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    pub state: PersistedState,
    #[serde(default)]
    pub version: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    /// Written for readers of the raw document; ignored when hydrating
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub refresh_attempted: bool,
}

impl From<&Session> for PersistedSession {
    fn from(session: &Session) -> Self {
        Self {
            state: PersistedState {
                token: session.token().map(str::to_string),
                user: session.user().cloned(),
                is_authenticated: session.is_authenticated(),
                refresh_attempted: session.refresh_attempted,
            },
            version: PERSISTED_VERSION,
        }
    }
}

impl PersistedSession {
    /// Rebuild a session, rejecting documents that break the token/user pairing
    pub fn into_session(self) -> Result<Session, String> {
        if self.version != PERSISTED_VERSION {
            return Err(format!("unsupported session version {}", self.version));
        }

        let credentials = match (self.state.token, self.state.user) {
            (Some(token), Some(user)) if !token.is_empty() => Some(Credentials { token, user }),
            (None, None) => None,
            _ => return Err("token and user must be persisted together".to_string()),
        };

        Ok(Session {
            credentials,
            refresh_attempted: self.state.refresh_attempted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user() -> User {
        User {
            first_name: "Ann".to_string(),
            last_name: None,
            age: None,
            email: "a@b.com".to_string(),
            courses: vec![],
            subscribed: false,
        }
    }

    #[test]
    fn persisted_document_shape() {
        let session = Session {
            credentials: Some(Credentials {
                token: "tok".to_string(),
                user: user(),
            }),
            refresh_attempted: true,
        };
        let doc = serde_json::to_value(PersistedSession::from(&session)).unwrap();
        assert_eq!(doc["version"], 0);
        assert_eq!(doc["state"]["token"], "tok");
        assert_eq!(doc["state"]["isAuthenticated"], true);
        assert_eq!(doc["state"]["refreshAttempted"], true);
        assert_eq!(doc["state"]["user"]["first_name"], "Ann");
    }

    #[test]
    fn half_pair_is_rejected() {
        let doc: PersistedSession = serde_json::from_value(json!({
            "state": {"token": "tok", "user": null, "isAuthenticated": true},
            "version": 0
        }))
        .unwrap();
        assert!(doc.into_session().is_err());

        let doc: PersistedSession = serde_json::from_value(json!({
            "state": {"token": null, "user": {"first_name": "Ann", "email": "a@b.com"}},
            "version": 0
        }))
        .unwrap();
        assert!(doc.into_session().is_err());
    }

    #[test]
    fn stored_flag_does_not_override_pairing() {
        let doc: PersistedSession = serde_json::from_value(json!({
            "state": {"token": null, "user": null, "isAuthenticated": true},
            "version": 0
        }))
        .unwrap();
        let session = doc.into_session().unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn debug_never_prints_token() {
        let credentials = Credentials {
            token: "super-secret".to_string(),
            user: user(),
        };
        assert!(!format!("{:?}", credentials).contains("super-secret"));
    }
}
