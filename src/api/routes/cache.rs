//! Cache invalidation handler.

use crate::api::AppState;
use axum::{extract::State, response::IntoResponse};

/// GET /bust-cache - Rescan the library and swap in a fresh generation
///
/// Returns only after the new generation is visible to readers, so a
/// follow-up feed request is guaranteed to see the rescan result.
pub async fn bust_cache(State(state): State<AppState>) -> impl IntoResponse {
    state.cache.bust().await;
    "success 🎉"
}
