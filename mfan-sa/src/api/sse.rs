//! Streaming search endpoint (Server-Sent Events)

use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
    Extension,
};
use futures::stream::Stream;
use mfan_common::models::Principal;
use mfan_common::sse::event_channel_sse;
use std::convert::Infallible;

use super::search::SearchParams;
use crate::pipeline::{error_stream, spawn_stream};
use crate::AppState;

/// GET /api/search/stream?q=<keyword>
///
/// Emits `start`, one `source_result` per source as it settles, then
/// `complete`. A missing keyword or a session-wide failure is delivered as a
/// single `error` event on an otherwise successful response.
pub async fn search_stream(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<SearchParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = match params.keyword() {
        Some(keyword) => spawn_stream(state.pipeline.clone(), principal, keyword.to_string()),
        None => error_stream("missing keyword"),
    };

    event_channel_sse(rx)
}
