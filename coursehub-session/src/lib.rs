//! CourseHub Session - Client-side authentication state
//!
//! The [`SessionStore`] is the single authoritative holder of "who is logged
//! in". It knows nothing about HTTP: callers perform network operations and
//! push validated results in through the store's commands. Every command
//! publishes a complete new snapshot to subscribers and persists it through a
//! [`SessionStorage`] backend.

pub mod session;
pub mod storage;
pub mod store;

pub use session::{Credentials, PersistedSession, Session};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use store::{SessionStore, SESSION_STORAGE_KEY};
