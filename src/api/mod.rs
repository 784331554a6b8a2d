//! HTTP server module
//!
//! Serves the podcast feed, per-item audio and artwork resources, and an
//! explicit cache invalidation endpoint.

use crate::cache::MetadataCache;
use crate::config::Config;
use crate::error::Result;
use crate::feed::FeedTransform;
use axum::{Router, http::HeaderValue, routing::get};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub mod error_response;
pub mod routes;
pub mod state;

pub use state::AppState;

/// Create the router with all route definitions
///
/// # Routes
///
/// - `GET /feed.xml` - Feed for the whole library
/// - `GET /{subdir}/feed.xml` - Feed for one library subdirectory
/// - `GET /resource/:id/audio.mp3` - Stream audio (with byte-range support)
/// - `GET /resource/:id/image` - Embedded cover artwork
/// - `GET /bust-cache` - Rescan the library
///
/// Feed routes accept `filterIn`, `filterOut`, `sort`, `title` and
/// `image.*` query parameters.
pub fn create_router(
    cache: Arc<MetadataCache>,
    config: Arc<Config>,
    transform: Option<FeedTransform>,
) -> Router {
    let state = AppState::new(cache, config.clone(), transform);

    // Static routes take priority over the wildcard scoped-feed route
    let router = Router::new()
        .route("/feed.xml", get(routes::feed))
        .route("/resource/:id/audio.mp3", get(routes::stream_audio))
        .route("/resource/:id/image", get(routes::cover_image))
        .route("/bust-cache", get(routes::bust_cache))
        .route("/*rest", get(routes::scoped_feed))
        .with_state(state);

    // Apply CORS middleware if enabled in config
    if config.server.cors_enabled {
        let cors = build_cors_layer(&config.server.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// # Arguments
///
/// * `origins` - List of allowed origins (supports "*" for any origin)
///
/// # Returns
///
/// A configured CorsLayer that allows the specified origins, all methods,
/// and all headers for cross-origin requests.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    // Check if "*" (all origins) is in the list
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        // Allow all origins (default for local development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Allow specific origins
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the feed server on the configured bind address.
///
/// This function creates a TCP listener, binds it to the configured address,
/// and starts serving the router. It runs until the server is shut down.
///
/// # Example
///
/// ```no_run
/// use dircast::{Config, MetadataCache};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let cache = Arc::new(MetadataCache::new(
///     config.library.root_dir.clone(),
///     config.library.extension.clone(),
/// ));
///
/// // Start the server (blocks until shutdown)
/// dircast::api::start_server(cache, config, None).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_server(
    cache: Arc<MetadataCache>,
    config: Arc<Config>,
    transform: Option<FeedTransform>,
) -> Result<()> {
    let bind_address = config.server.bind_address;

    tracing::info!(
        address = %bind_address,
        root = %config.library.root_dir.display(),
        "Starting feed server"
    );

    let app = create_router(cache, config, transform);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "Feed server listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("Feed server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
