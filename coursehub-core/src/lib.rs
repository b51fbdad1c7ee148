//! CourseHub Core - Shared domain types, schema validation and ambient infrastructure
//!
//! Everything the session store and the API client agree on lives here:
//! the user/course records, the validation rules applied at every network
//! boundary, the unified error type, configuration and logging.

pub mod config;
pub mod error;
pub mod logging;
pub mod schema;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use schema::*;
pub use types::*;

// Re-export commonly used external types
pub use tracing;
