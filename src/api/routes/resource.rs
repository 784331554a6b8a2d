//! Audio streaming and cover artwork handlers.

use crate::api::AppState;
use crate::error::{Error, Result};
use crate::streamer;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

/// GET /resource/:id/audio.mp3 - Stream the audio file for one item
///
/// Honors single `bytes=` ranges with a 206 response; a missing or removed
/// item is a bare 404 the way podcast clients expect. The content type is
/// always `audio/mp3` regardless of the on-disk container, since that is
/// what the enclosure advertises the endpoint as.
pub async fn stream_audio(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    let Some(item) = state.cache.get(&id).await else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let size = item.size_bytes;
    let range = match headers.get(header::RANGE).and_then(|v| v.to_str().ok()) {
        Some(value) => Some(streamer::parse_range(value, size)?),
        None => None,
    };

    let stream = streamer::open_window(&item.file_path, range.as_ref()).await?;

    let builder = Response::builder()
        .header(header::CONTENT_TYPE, "audio/mp3")
        .header(header::ACCEPT_RANGES, "bytes");

    let builder = match range {
        Some(range) => builder
            .status(StatusCode::PARTIAL_CONTENT)
            .header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{size}", range.start, range.end),
            )
            .header(header::CONTENT_LENGTH, range.len()),
        None => builder
            .status(StatusCode::OK)
            .header(header::CONTENT_LENGTH, size),
    };

    builder
        .body(Body::from_stream(stream))
        .map_err(|e| Error::ApiServerError(e.to_string()))
}

/// GET /resource/:id/image - Serve the embedded cover artwork for one item
pub async fn cover_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let Some(item) = state.cache.get(&id).await else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };
    let Some(picture) = &item.picture else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    Ok((
        [(header::CONTENT_TYPE, picture.format.clone())],
        picture.data.clone(),
    )
        .into_response())
}
