//! Session lifecycle: bootstrap, event listening, and the user-facing
//! auth operations

pub mod ports;
pub mod service;

pub use ports::IdentityProvider;
pub use service::{ListenerHandle, SessionService};
