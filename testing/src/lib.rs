//! # Album Invitations Testing
//!
//! Test doubles and helpers for the album invitations service.
//!
//! This crate provides:
//! - In-memory implementations of [`MirrorStore`] and [`EventBus`] with
//!   failure switches
//! - A [`TestHarness`] wiring the engine and ingestor to those fakes
//! - Event builders and proptest strategies
//!
//! ## Example
//!
//! ```ignore
//! use album_invitations_testing::TestHarness;
//! use album_invitations_core::{AlbumId, ProfileId};
//!
//! #[tokio::test]
//! async fn invite_then_accept() {
//!     let h = TestHarness::new()
//!         .with_profile(1, "alice").await
//!         .with_album(10, "Demo", &[]).await;
//!
//!     h.engine.propose(ProfileId::new(1), AlbumId::new(10)).await.unwrap();
//!     let accepted = h.engine.accept(ProfileId::new(1), AlbumId::new(10)).await.unwrap();
//!     assert_eq!(accepted.artists, vec!["alice"]);
//! }
//! ```
//!
//! [`MirrorStore`]: album_invitations_core::MirrorStore
//! [`EventBus`]: album_invitations_core::EventBus

mod event_bus;
pub mod fixtures;
mod mirror_store;

/// In-memory implementations of the storage and transport traits.
pub mod mocks {
    pub use crate::event_bus::InMemoryEventBus;
    pub use crate::mirror_store::InMemoryMirrorStore;
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use album_invitations_core::{AlbumId, ProfileId};
    use proptest::prelude::*;

    /// Display names: short, non-empty, lowercase.
    pub fn name() -> impl Strategy<Value = String> {
        "[a-z]{1,12}"
    }

    /// Profile ids from a small range so generated operations collide.
    pub fn profile_id() -> impl Strategy<Value = ProfileId> {
        (1u32..6).prop_map(ProfileId::new)
    }

    /// Album ids from a small range so generated operations collide.
    pub fn album_id() -> impl Strategy<Value = AlbumId> {
        (1u32..6).prop_map(AlbumId::new)
    }

    /// One engine operation.
    #[derive(Clone, Debug)]
    pub enum Op {
        /// `propose(profile, album)`
        Propose(ProfileId, AlbumId),
        /// `withdraw(profile, album)`
        Withdraw(ProfileId, AlbumId),
        /// `accept(profile, album)`
        Accept(ProfileId, AlbumId),
    }

    /// Arbitrary engine operation over the small id ranges.
    pub fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (profile_id(), album_id()).prop_map(|(p, a)| Op::Propose(p, a)),
            (profile_id(), album_id()).prop_map(|(p, a)| Op::Withdraw(p, a)),
            (profile_id(), album_id()).prop_map(|(p, a)| Op::Accept(p, a)),
        ]
    }
}

pub use fixtures::TestHarness;
pub use mocks::{InMemoryEventBus, InMemoryMirrorStore};
