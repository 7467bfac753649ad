//! Server-Sent Events for workspace changes

use axum::{
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /api/events
///
/// Streams every `HubEvent`: registrations, inspection outcomes, removals,
/// selection and busy-state changes, merge outcomes.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    bcfhub_common::sse::create_event_sse_stream("bcfhub-ui", &state.event_bus)
}

pub fn event_routes() -> Router<AppState> {
    Router::new().route("/api/events", get(event_stream))
}
