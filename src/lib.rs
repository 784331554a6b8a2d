//! # dircast
//!
//! Serve a directory of audio files as a podcast feed.
//!
//! ## Design Philosophy
//!
//! dircast is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Stateless on disk** - All metadata lives in an in-memory cache
//!   rebuilt from the files themselves
//!
//! ## Quick Start
//!
//! ```no_run
//! use dircast::{Config, MetadataCache};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::default());
//!     let cache = Arc::new(MetadataCache::new(
//!         config.library.root_dir.clone(),
//!         config.library.extension.clone(),
//!     ));
//!
//!     // Warm the cache, then serve until shutdown
//!     cache.rebuild().await;
//!     dircast::api::start_server(cache, config, None).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP server module
pub mod api;
/// In-memory metadata cache
pub mod cache;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Per-file metadata extraction
pub mod extractor;
/// Feed document assembly
pub mod feed;
/// Filtering and sorting of the item view
pub mod query;
/// Byte-range file streaming
pub mod streamer;

// Re-export commonly used types
pub use cache::MetadataCache;
pub use config::{ChannelConfig, ChannelImage, Config, LibraryConfig, ServerConfig};
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use extractor::{Item, Narrator, Picture};
pub use feed::{FeedOptions, FeedTransform, ResourceUrls};
pub use query::{FilterGroup, ItemField, SortSpec};
pub use streamer::ByteRange;
