//! HTTP request handlers.

pub mod health;
pub mod invitations;

pub use health::{health_check, readiness_check};
