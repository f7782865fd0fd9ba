//! # Album Invitations Core
//!
//! Domain types and logic for inviting user profiles to collaborate on albums.
//!
//! Profiles and albums are owned by other services. This crate keeps a local
//! mirror of both, fed by their creation events, and layers an invitation
//! lifecycle on top:
//!
//! - **[`ingestor`]**: turns `new_profile` / `new_album` events into mirror
//!   records, idempotently
//! - **[`engine`]**: propose, withdraw, accept and query invitations as atomic
//!   conditional writes against the [`mirror_store`]
//! - **[`publisher`]**: announces an album's new collaborator set after an
//!   acceptance
//!
//! Storage and transport are traits ([`MirrorStore`], [`EventBus`]) so the
//! same engine runs against Postgres/Redpanda in production and in-memory
//! fakes in tests.
//!
//! ## Example
//!
//! ```ignore
//! use album_invitations_core::{ChangePublisher, InvitationEngine, AlbumId, ProfileId};
//!
//! let engine = InvitationEngine::new(store.clone(), ChangePublisher::new(bus.clone()));
//!
//! engine.propose(ProfileId::new(1), AlbumId::new(10)).await?;
//! for invitation in engine.query(ProfileId::new(1)).await? {
//!     println!("{} {}", invitation.album_id, invitation.album_name);
//! }
//! ```

pub mod engine;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod ingestor;
pub mod mirror_store;
pub mod publisher;
pub mod types;

pub use engine::InvitationEngine;
pub use error::{InvitationError, Result};
pub use event::{AlbumCreated, CollaboratorsUpdated, EventError, ProfileCreated, SerializedEvent};
pub use event_bus::{EventBus, EventBusError, EventStream};
pub use ingestor::{EventIngestor, IngestError, IngestOutcome};
pub use mirror_store::{MirrorStore, ProposeOutcome, ProposeRejection, StoreError, StoreFuture};
pub use publisher::ChangePublisher;
pub use types::{
    AcceptedInvitation, Album, AlbumId, Identity, InvitationSummary, Profile, ProfileId,
};
