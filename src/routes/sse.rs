use std::convert::Infallible;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/contest",
    tag = "sse",
    responses((status = 200, description = "Contest event stream (`handshake`, `status-update`, `system.status`)", content_type = "text/event-stream", body = String))
)]
/// Stream contest lifecycle events to connected clients.
pub async fn contest_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = sse_service::subscribe(&state);
    info!(
        subscribers = state.sse().receiver_count(),
        "new contest SSE connection"
    );
    sse_service::to_sse_stream(&state, receiver)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/contest", get(contest_stream))
}
