//! Route handlers for the feed server
//!
//! Handlers are organized by domain:
//! - [`feed`] — Feed rendering (whole library and per-subdirectory)
//! - [`resource`] — Audio streaming and cover artwork
//! - [`cache`] — Explicit cache invalidation

mod cache;
mod feed;
mod resource;

// Re-export all handlers so `routes::function_name` continues to work
pub use cache::*;
pub use feed::*;
pub use resource::*;
