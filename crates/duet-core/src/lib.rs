//! Core types and trait definitions for duet, the two-person swipe-to-match
//! service.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! holds the domain model, the [`store::SwipeStore`] abstraction, and the
//! [`coordinator::MatchCoordinator`] that keeps matches consistent under
//! concurrent writes from both members of a room.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod coordinator;
pub mod decision;
pub mod error;
pub mod feed;
pub mod matches;
pub mod notify;
pub mod ranker;
pub mod room;
pub mod store;

pub use error::{Error, ErrorKind, Result, StoreError};
