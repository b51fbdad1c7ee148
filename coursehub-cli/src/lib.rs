//! CourseHub CLI - Command-line front end over the client core
//!
//! [`actions`] holds the flows a user interface runs on top of the core:
//! validate input, call the backend, push the result into the session store.

pub mod actions;

pub use actions::{ActionError, ActionResult, Dashboard, Enrollment};
