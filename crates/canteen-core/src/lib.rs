//! Core types and orchestration for the canteen meal-preference pipeline.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! is reached through [`store::CanteenStore`] and the sibling service through
//! [`sync::Peer`]; concrete backends live in their own crates.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod clock;
pub mod counts;
pub mod deadline;
pub mod error;
pub mod identity;
pub mod menu;
pub mod preference;
pub mod service;
pub mod store;
pub mod sync;

pub use error::{Error, Result};
