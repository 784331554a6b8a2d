use super::*;

fn library_config(root: &str) -> Config {
    let mut config = Config::default();
    config.library.root_dir = PathBuf::from(root);
    config
}

#[tokio::test]
async fn test_feed_parses_and_links_resources() {
    let app = seeded_app(
        Config::default(),
        vec![sample_item("aaa", "Alpha"), sample_item("bbb", "Beta")],
    )
    .await;

    let response = get(app, "/feed.xml").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/xml")
    );

    let channel: rss::Channel = body_string(response).await.parse().unwrap();
    assert_eq!(channel.title(), "Audio Library");
    assert_eq!(channel.link(), "http://example.com/");
    assert_eq!(channel.items().len(), 2);

    let ids: Vec<_> = channel
        .items()
        .iter()
        .map(|i| i.guid().unwrap().value())
        .collect();
    assert!(ids.contains(&"aaa") && ids.contains(&"bbb"));

    let entry = channel
        .items()
        .iter()
        .find(|i| i.guid().unwrap().value() == "aaa")
        .unwrap();
    assert_eq!(
        entry.enclosure().unwrap().url(),
        "http://example.com/resource/aaa/audio.mp3"
    );
    assert_eq!(
        entry.itunes_ext().unwrap().image(),
        Some("http://example.com/resource/aaa/image")
    );
}

#[tokio::test]
async fn test_forwarded_proto_switches_links_to_https() {
    let app = seeded_app(Config::default(), vec![sample_item("aaa", "Alpha")]).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/feed.xml")
                .header("host", "example.com")
                .header("x-forwarded-proto", "https")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let channel: rss::Channel = body_string(response).await.parse().unwrap();
    assert_eq!(channel.link(), "https://example.com/");
    assert_eq!(
        channel.items()[0].enclosure().unwrap().url(),
        "https://example.com/resource/aaa/audio.mp3"
    );
}

#[tokio::test]
async fn test_sort_parameter_orders_items() {
    let app = seeded_app(
        Config::default(),
        vec![
            sample_item("bbb", "Beta"),
            sample_item("aaa", "Alpha"),
            sample_item("ccc", "Gamma"),
        ],
    )
    .await;

    let response = get(app, "/feed.xml?sort=asc:title").await;
    let channel: rss::Channel = body_string(response).await.parse().unwrap();

    let titles: Vec<_> = channel.items().iter().map(|i| i.title().unwrap()).collect();
    assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);
}

#[tokio::test]
async fn test_filter_in_keeps_only_matching_items() {
    let app = seeded_app(
        Config::default(),
        vec![sample_item("aaa", "Alpha"), sample_item("bbb", "Beta")],
    )
    .await;

    let response = get(app, "/feed.xml?filterIn=Alpha:title").await;
    let channel: rss::Channel = body_string(response).await.parse().unwrap();

    assert_eq!(channel.items().len(), 1);
    assert_eq!(channel.items()[0].title(), Some("Alpha"));
}

#[tokio::test]
async fn test_filter_out_drops_matching_items() {
    let app = seeded_app(
        Config::default(),
        vec![sample_item("aaa", "Alpha"), sample_item("bbb", "Beta")],
    )
    .await;

    let response = get(app, "/feed.xml?filterOut=Alpha:title").await;
    let channel: rss::Channel = body_string(response).await.parse().unwrap();

    assert_eq!(channel.items().len(), 1);
    assert_eq!(channel.items()[0].title(), Some("Beta"));
}

#[tokio::test]
async fn test_invalid_sort_is_a_bad_request() {
    let app = seeded_app(Config::default(), vec![sample_item("aaa", "Alpha")]).await;

    let response = get(app, "/feed.xml?sort=sideways:title").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_string(response).await;
    assert!(body.contains("invalid_query"));
}

#[tokio::test]
async fn test_invalid_filter_regex_is_a_bad_request() {
    let app = seeded_app(Config::default(), vec![sample_item("aaa", "Alpha")]).await;

    let response = get(app, "/feed.xml?filterIn=%5B:title").await; // "[" alone
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_title_override_and_query_echo() {
    let app = seeded_app(Config::default(), vec![]).await;

    let response = get(app, "/feed.xml?title=Night%20Reading").await;
    let channel: rss::Channel = body_string(response).await.parse().unwrap();

    assert_eq!(channel.title(), "Night Reading");
    assert!(channel.description().contains("query: title=Night%20Reading"));
}

#[tokio::test]
async fn test_image_override_from_query() {
    let app = seeded_app(Config::default(), vec![]).await;

    let response = get(
        app,
        "/feed.xml?image.url=http%3A%2F%2Fexample.com%2Fart.png&image.title=Art&image.width=144",
    )
    .await;
    let channel: rss::Channel = body_string(response).await.parse().unwrap();

    let image = channel.image().unwrap();
    assert_eq!(image.url(), "http://example.com/art.png");
    assert_eq!(image.title(), "Art");
    assert_eq!(image.width(), Some("144"));
}

fn config_with_image() -> Config {
    let mut config = Config::default();
    config.channel.image = Some(crate::config::ChannelImage {
        url: "http://example.com/configured.png".to_string(),
        title: "Configured Art".to_string(),
        link: "http://example.com".to_string(),
        description: Some("the configured artwork".to_string()),
        width: Some(600),
        height: Some(600),
    });
    config
}

#[tokio::test]
async fn test_lone_image_field_without_url_keeps_configured_image() {
    let app = seeded_app(config_with_image(), vec![]).await;

    let response = get(app, "/feed.xml?image.title=Sneaky").await;
    let channel: rss::Channel = body_string(response).await.parse().unwrap();

    let image = channel.image().unwrap();
    assert_eq!(image.url(), "http://example.com/configured.png");
    assert_eq!(image.title(), "Configured Art");
}

#[tokio::test]
async fn test_image_url_override_replaces_configured_image_wholesale() {
    let app = seeded_app(config_with_image(), vec![]).await;

    let response = get(app, "/feed.xml?image.url=http%3A%2F%2Fexample.com%2Fother.png").await;
    let channel: rss::Channel = body_string(response).await.parse().unwrap();

    // nothing from the configured image bleeds into the override
    let image = channel.image().unwrap();
    assert_eq!(image.url(), "http://example.com/other.png");
    assert_eq!(image.title(), "");
    assert_eq!(image.width(), None);
}

#[tokio::test]
async fn test_non_numeric_image_width_is_a_bad_request() {
    let app = seeded_app(Config::default(), vec![]).await;

    let response = get(app, "/feed.xml?image.width=wide").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scoped_feed_restricts_to_subdirectory() {
    let mut scifi = sample_item("aaa", "Alpha");
    scifi.file_path = PathBuf::from("/library/scifi/alpha.mp3");
    let mut history = sample_item("bbb", "Beta");
    history.file_path = PathBuf::from("/library/history/beta.mp3");

    let app = seeded_app(library_config("/library"), vec![scifi, history]).await;

    let response = get(app, "/scifi/feed.xml").await;
    assert_eq!(response.status(), StatusCode::OK);

    let channel: rss::Channel = body_string(response).await.parse().unwrap();
    assert_eq!(channel.items().len(), 1);
    assert_eq!(channel.items()[0].guid().unwrap().value(), "aaa");

    // resource links stay anchored at the server root, not the scope
    assert_eq!(
        channel.items()[0].enclosure().unwrap().url(),
        "http://example.com/resource/aaa/audio.mp3"
    );
}

#[tokio::test]
async fn test_scoped_feed_handles_nested_subdirectories() {
    let mut nested = sample_item("aaa", "Alpha");
    nested.file_path = PathBuf::from("/library/fiction/scifi/alpha.mp3");

    let app = seeded_app(library_config("/library"), vec![nested]).await;

    let response = get(app, "/fiction/scifi/feed.xml").await;
    let channel: rss::Channel = body_string(response).await.parse().unwrap();
    assert_eq!(channel.items().len(), 1);
}

#[tokio::test]
async fn test_scoped_feed_for_empty_scope_is_an_empty_feed() {
    let app = seeded_app(library_config("/library"), vec![sample_item("aaa", "Alpha")]).await;

    let response = get(app, "/nonexistent/feed.xml").await;
    assert_eq!(response.status(), StatusCode::OK);

    let channel: rss::Channel = body_string(response).await.parse().unwrap();
    assert!(channel.items().is_empty());
}
