//! `PostgreSQL` mirror store for album invitations.
//!
//! This crate provides the production implementation of the
//! [`MirrorStore`](album_invitations_core::MirrorStore) trait. It uses sqlx
//! with a connection pool and supports:
//!
//! - Idempotent inserts of mirrored profiles and albums
//! - Guarded invitation writes as single conditional `UPDATE`s
//! - Acceptance as one transaction spanning both records
//! - Embedded migrations
//!
//! # Example
//!
//! ```ignore
//! use album_invitations_postgres::{PoolSettings, PostgresMirrorStore};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresMirrorStore::connect("postgres://localhost/invitations", &PoolSettings::default()).await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod mirror_store;

pub use mirror_store::{PoolSettings, PostgresMirrorStore};
