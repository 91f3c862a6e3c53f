pub mod auth;
pub mod models;
pub mod session;

// Re-export the main types for convenience
pub use auth::{AuthClient, AuthError};
pub use models::*;
pub use session::{ContactDirectory, MessageThread, Session, SessionError};
