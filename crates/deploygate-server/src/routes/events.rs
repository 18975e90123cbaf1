use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::StreamExt as _;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;

use crate::decisions::wait_for_shutdown;
use crate::state::AppState;

/// GET /{org_id}/events: SSE stream that emits `outcome` whenever one of the
/// org's approvals resolves. Lagging subscribers skip missed events.
pub async fn sse_events(
    State(app): State<AppState>,
    Path(org_id): Path<String>,
) -> impl axum::response::IntoResponse {
    let rx = app.outcomes.subscribe();
    let mut shutdown = app.shutdown.clone();

    let stream = BroadcastStream::new(rx)
        .filter_map(move |msg| {
            let event = match msg {
                Ok(outcome) if outcome.org_id == org_id => Event::default()
                    .event("outcome")
                    .json_data(&outcome.event)
                    .ok(),
                _ => None,
            };
            std::future::ready(event.map(Ok::<Event, Infallible>))
        })
        .take_until(async move { wait_for_shutdown(&mut shutdown).await });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
