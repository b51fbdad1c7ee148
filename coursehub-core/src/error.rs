//! Unified error handling system
//!
//! Every failure the client core can raise is a `CourseHubError`. Transport and
//! server failures share one variant so callers never branch on where a
//! request went wrong; schema violations get their own variant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type CourseHubResult<T> = Result<T, CourseHubError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the CourseHub client
#[derive(Error, Debug)]
pub enum CourseHubError {
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// Transport or server failure. Displays as the bare message so it can be
    /// shown to the user as-is.
    #[error("{message}")]
    Request {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CourseHubError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            CourseHubError::Config { context, .. } => Some(context),
            CourseHubError::Request { context, .. } => Some(context),
            CourseHubError::Validation { context, .. } => Some(context),
            CourseHubError::Storage { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Human-readable message without any kind prefix
    pub fn message(&self) -> String {
        match self {
            CourseHubError::Config { message, .. }
            | CourseHubError::Request { message, .. }
            | CourseHubError::Validation { message, .. }
            | CourseHubError::Storage { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status of a server failure, if the request got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            CourseHubError::Request { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CourseHubError::Validation { .. })
    }

    /// Check if error is recoverable by the caller retrying
    pub fn is_recoverable(&self) -> bool {
        match self {
            CourseHubError::Request { status, .. } => match status {
                None => true,
                Some(code) => *code >= 500 || *code == 408 || *code == 429,
            },
            CourseHubError::Io(_) => true,
            CourseHubError::Config { .. } => false,
            CourseHubError::Validation { .. } => false,
            _ => false,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            CourseHubError::Config { .. } | CourseHubError::Validation { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Configuration or validation error"
                );
            }
            CourseHubError::Request { status, .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    status = ?status,
                    error = %self,
                    "Request failed (may be recoverable)"
                );
            }
            CourseHubError::Storage { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Storage error"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::CourseHubError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Set COURSEHUB_API_BASE_URL or pass --base-url"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::CourseHubError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::CourseHubError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::CourseHubError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}
