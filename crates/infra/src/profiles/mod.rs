//! User-profile persistence adapter

pub mod http_repository;

pub use http_repository::{HttpUserProfileRepository, ProfileApiConfig};
