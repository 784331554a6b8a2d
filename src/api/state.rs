//! Application state for the HTTP server

use crate::cache::MetadataCache;
use crate::config::Config;
use crate::feed::FeedTransform;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clones) and provides
/// access to the metadata cache and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The metadata cache backing every feed and resource lookup
    pub cache: Arc<MetadataCache>,

    /// Configuration (channel metadata, library and server settings)
    pub config: Arc<Config>,

    /// Optional document-tree hook applied before feed serialization
    pub transform: Option<FeedTransform>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(
        cache: Arc<MetadataCache>,
        config: Arc<Config>,
        transform: Option<FeedTransform>,
    ) -> Self {
        Self {
            cache,
            config,
            transform,
        }
    }
}
