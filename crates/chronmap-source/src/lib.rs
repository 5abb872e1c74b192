//! Shard loaders for chronmap.
//!
//! Each type here implements [`chronmap_core::source::ShardSource`]:
//!
//! - [`FsSource`] reads artifacts from a local directory.
//! - [`HttpSource`] fetches them from a static file server.
//! - [`MemorySource`] serves them from memory and counts fetches; it backs
//!   the test suites of the higher crates.

mod fs;
mod http;
mod memory;

pub mod error;

pub use error::{Error, Result};
pub use fs::FsSource;
pub use http::HttpSource;
pub use memory::MemorySource;
