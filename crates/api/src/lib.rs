//! # UniNest App
//!
//! Application shell for the UniNest session core: wires the HTTP
//! adapters to the core services, owns the background lifecycles, and
//! exposes the operations the routing/UI layer consumes.

pub mod commands;
pub mod context;
pub mod utils;

pub use context::AppContext;
