//! Feed rendering handlers.
//!
//! Both handlers share one pipeline: parse query parameters, take a cache
//! snapshot, filter and sort it, then render the channel document. The
//! scoped variant additionally restricts the snapshot to one library
//! subdirectory before filtering.

use crate::api::AppState;
use crate::config::ChannelImage;
use crate::error::{Error, Result};
use crate::feed::{FeedOptions, ResourceUrls, build_channel};
use crate::query::{FilterGroup, SortSpec, filter_items};
use axum::{
    extract::{Host, OriginalUri, Path, RawQuery, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};

/// GET /feed.xml - Render the feed for the whole library
pub async fn feed(
    State(state): State<AppState>,
    Host(host): Host,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
) -> Result<Response> {
    render_feed(&state, &host, uri.path(), "/feed.xml", None, raw_query, &headers).await
}

/// GET /{subdir}/feed.xml - Render the feed for one library subdirectory
///
/// The wildcard route also catches every other unknown path; anything that
/// does not end in `/feed.xml` is a plain miss.
pub async fn scoped_feed(
    State(state): State<AppState>,
    Host(host): Host,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Path(rest): Path<String>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response> {
    let scope = rest
        .strip_suffix("/feed.xml")
        .ok_or_else(|| Error::NotFound(format!("no route for /{rest}")))?
        .to_string();

    render_feed(
        &state,
        &host,
        uri.path(),
        &format!("/{rest}"),
        Some(&scope),
        raw_query,
        &headers,
    )
    .await
}

/// Shared feed pipeline.
///
/// Resource URLs are anchored at the router mount, recovered by stripping
/// the handler's logical path suffix from the original request path. The
/// scheme comes from `x-forwarded-proto` when a reverse proxy set it.
async fn render_feed(
    state: &AppState,
    host: &str,
    original_path: &str,
    logical_suffix: &str,
    scope: Option<&str>,
    raw_query: Option<String>,
    headers: &HeaderMap,
) -> Result<Response> {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let mount = original_path.strip_suffix(logical_suffix).unwrap_or("");
    let urls = ResourceUrls::new(scheme, host, &format!("{mount}/"))?;

    let params = parse_params(raw_query.as_deref(), state.config.channel.image.as_ref())?;

    let mut items = state.cache.get_all().await;
    if let Some(scope) = scope {
        let scope_root = state.cache.root().join(scope);
        items.retain(|item| item.file_path.starts_with(&scope_root));
    }
    let mut items = filter_items(items, &params.filter_in, &params.filter_out);
    params.sort.apply(&mut items);

    let opts = FeedOptions {
        title: params
            .title
            .unwrap_or_else(|| state.config.channel.title.clone()),
        description: state.config.channel.description.clone(),
        image: params.image,
        query_string: raw_query,
    };

    let mut channel = build_channel(&items, &opts, &urls);
    if let Some(transform) = &state.transform {
        channel = transform(channel);
    }

    Ok((
        [(header::CONTENT_TYPE, "text/xml; charset=utf-8")],
        channel.to_string(),
    )
        .into_response())
}

/// Parsed per-request feed parameters
struct FeedParams {
    filter_in: Vec<FilterGroup>,
    filter_out: Vec<FilterGroup>,
    sort: SortSpec,
    title: Option<String>,
    image: Option<ChannelImage>,
}

/// Decode the raw query string by hand: `filterIn` and `filterOut` repeat,
/// which the struct-based `Query` extractor cannot express.
fn parse_params(
    raw_query: Option<&str>,
    configured_image: Option<&ChannelImage>,
) -> Result<FeedParams> {
    let mut filter_in = Vec::new();
    let mut filter_out = Vec::new();
    let mut sort = None;
    let mut title = None;
    let mut image_url = None;
    let mut image_title = None;
    let mut image_link = None;
    let mut image_description = None;
    let mut image_width = None;
    let mut image_height = None;

    if let Some(raw) = raw_query {
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "filterIn" => filter_in.push(FilterGroup::parse(&value)?),
                "filterOut" => filter_out.push(FilterGroup::parse(&value)?),
                "sort" => sort = Some(SortSpec::parse(&value)?),
                "title" => title = Some(value.into_owned()),
                "image.url" => image_url = Some(value.into_owned()),
                "image.title" => image_title = Some(value.into_owned()),
                "image.link" => image_link = Some(value.into_owned()),
                "image.description" => image_description = Some(value.into_owned()),
                "image.width" => image_width = Some(parse_dimension(&key, &value)?),
                "image.height" => image_height = Some(parse_dimension(&key, &value)?),
                // unknown parameters are ignored; the raw string is still
                // echoed into the channel description
                _ => {}
            }
        }
    }

    // a request-supplied image replaces the configured one wholesale, and
    // only when image.url is present; stray image.* keys without a url
    // leave the configured image untouched
    let image = match image_url {
        Some(url) => Some(ChannelImage {
            url,
            title: image_title.unwrap_or_default(),
            link: image_link.unwrap_or_default(),
            description: image_description,
            width: image_width,
            height: image_height,
        }),
        None => configured_image.cloned(),
    };

    Ok(FeedParams {
        filter_in,
        filter_out,
        sort: sort.unwrap_or_default(),
        title,
        image,
    })
}

fn parse_dimension(key: &str, value: &str) -> Result<u32> {
    value
        .parse()
        .map_err(|_| Error::InvalidQuery(format!("{key} is not a number: {value}")))
}
