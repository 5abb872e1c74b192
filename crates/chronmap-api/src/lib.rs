//! JSON HTTP API for chronmap.
//!
//! Exposes an axum [`Router`] backed by an [`Atlas`] over any
//! [`ShardSource`]. TLS and auth are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", chronmap_api::api_router(atlas.clone()))
//! ```

pub mod cache;
pub mod error;
pub mod lineage;
pub mod shards;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use chronmap_atlas::Atlas;
use chronmap_core::source::ShardSource;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Build the API router for `atlas`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(atlas: Arc<Atlas<S>>) -> Router<()>
where
  S: ShardSource + 'static,
{
  Router::new()
    // Periods and shards
    .route("/periods", get(shards::periods::<S>))
    .route("/shards/{year}", get(shards::by_year::<S>))
    // Lineage
    .route("/relations/{id}", get(lineage::relations::<S>))
    .route("/records/{id}", get(lineage::record::<S>))
    // Cache
    .route("/cache", get(cache::status::<S>))
    .route("/cache/clear", post(cache::clear::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(atlas)
}
