//! Album invitations service.
//!
//! Mirrors profiles and albums from the event bus into Postgres, serves the
//! invitation API over HTTP, and publishes collaborator updates when an
//! invitation is accepted.
//!
//! ```text
//!  new_profile ─┐                               ┌─> update_collaborators
//!  new_album  ──┼─> EventConsumer ─> Ingestor ─┐ │
//!               │                              v │
//!  HTTP ─> Router ─> InvitationEngine ─> MirrorStore (Postgres)
//! ```

pub mod app;
pub mod config;
pub mod metrics;
pub mod runtime;

pub use app::InvitationsApp;
pub use config::Config;
