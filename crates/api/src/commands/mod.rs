//! Operations exposed to the routing/UI layer

pub mod session;
