//! Core types and trait definitions for the chronmap temporal atlas.
//!
//! Nothing here touches the network or the filesystem. The crate describes
//! the period table, the records a shard is made of, and the
//! [`source::ShardSource`] seam that loaders implement.

// Native `async fn` in traits; futures are constrained to `Send` explicitly
// where the trait is declared.
#![allow(async_fn_in_trait)]

pub mod chain;
pub mod error;
pub mod period;
pub mod record;
pub mod relation;
pub mod shard;
pub mod source;
pub mod war;

pub use error::{Error, Result};
