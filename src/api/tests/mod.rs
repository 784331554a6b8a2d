use super::*;
use crate::extractor::{Item, Narrator, Picture};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

mod feed;

/// Build an item with deterministic metadata for serving-path tests. The
/// file path does not need to exist unless the test streams audio.
fn sample_item(id: &str, title: &str) -> Item {
    Item {
        id: id.to_string(),
        title: title.to_string(),
        author: "Test Author".to_string(),
        description: "A test description".to_string(),
        copyright: "Unknown".to_string(),
        published_at: Utc.with_ymd_and_hms(2021, 3, 1, 9, 0, 0).unwrap(),
        categories: vec!["Fiction".to_string()],
        narrators: vec![Narrator {
            name: "Test Narrator".to_string(),
        }],
        duration_secs: Some(120.0),
        size_bytes: 1000,
        mime_type: "audio/mpeg".to_string(),
        picture: None,
        file_path: PathBuf::from(format!("/library/{title}.mp3")),
    }
}

/// Router over a cache seeded with the given items, skipping extraction.
async fn seeded_app(config: Config, items: Vec<Item>) -> Router {
    let config = Arc::new(config);
    let cache = Arc::new(MetadataCache::new(
        config.library.root_dir.clone(),
        config.library.extension.clone(),
    ));
    cache.seed(items).await;
    create_router(cache, config, None)
}

/// One GET round trip through the router with a fixed Host header.
async fn get(app: Router, uri: &str) -> axum::http::Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .header("host", "example.com")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn body_bytes(response: axum::http::Response<Body>) -> axum::body::Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

async fn body_string(response: axum::http::Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await.to_vec()).unwrap()
}

#[tokio::test]
async fn test_server_spawns() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.library.root_dir = dir.path().to_path_buf();
    config.server.bind_address = "127.0.0.1:0".parse().unwrap(); // OS assigns a free port
    let config = Arc::new(config);

    let cache = Arc::new(MetadataCache::new(
        config.library.root_dir.clone(),
        config.library.extension.clone(),
    ));

    let handle = tokio::spawn({
        let cache = cache.clone();
        let config = config.clone();
        async move { start_server(cache, config, None).await }
    });

    // Give it a moment to start, then tear it down
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.library.root_dir = dir.path().to_path_buf();
    config.server.cors_enabled = true;
    config.server.cors_origins = vec!["*".to_string()];

    let app = seeded_app(config, vec![]).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/bust-cache")
                .header("host", "example.com")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_bust_cache_rescans_and_celebrates() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.library.root_dir = dir.path().to_path_buf();

    // Seed a stale generation; busting should drop it after rescanning the
    // (empty) library directory
    let app = seeded_app(config, vec![sample_item("abc", "Stale Book")]).await;

    let response = get(app.clone(), "/bust-cache").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "success 🎉");

    let feed = body_string(get(app, "/feed.xml").await).await;
    let channel: rss::Channel = feed.parse().unwrap();
    assert!(channel.items().is_empty());
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let app = seeded_app(Config::default(), vec![]).await;

    let response = get(app, "/no/such/page").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
