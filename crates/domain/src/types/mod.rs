//! Domain types and models

pub mod session;
pub mod user;

pub use session::{AuthEvent, Identity, Session, SessionEvent, SessionEventKind, SessionState};
pub use user::{NewAccount, ProfileUpdate, UserProfile, UserRole};
