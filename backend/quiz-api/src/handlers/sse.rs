use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::metrics::SSE_CONNECTIONS_ACTIVE;
use crate::models::timer::TimerEvent;
use crate::services::AppState;

/// SSE endpoint for attempt countdown events
/// GET /api/v1/attempts/{id}/stream
///
/// Relays the authoritative clock's events; the countdown itself runs in the
/// attempt service whether or not anyone is connected here.
pub async fn attempt_stream(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let receiver = state
        .attempts
        .subscribe(&attempt_id)
        .await
        .map_err(|_| (StatusCode::NOT_FOUND, "Attempt not found".to_string()))?;

    tracing::info!("Client connected to timer stream: attempt={}", attempt_id);

    let stream: BoxStream<'static, Result<Event, Infallible>> = match receiver {
        Some(receiver) => relay_events(receiver).boxed(),
        // No time limit, no countdown: the stream ends immediately.
        None => stream::empty().boxed(),
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

struct StreamGuard;

impl StreamGuard {
    fn new() -> Self {
        SSE_CONNECTIONS_ACTIVE.inc();
        StreamGuard
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        SSE_CONNECTIONS_ACTIVE.dec();
    }
}

fn relay_events(
    receiver: broadcast::Receiver<TimerEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let guard = StreamGuard::new();
    stream::unfold((receiver, guard), |(mut receiver, guard)| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let sse = Event::default()
                        .event(event.event_name())
                        .data(event.to_sse_data());
                    return Some((Ok(sse), (receiver, guard)));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Timer stream lagging, skipped {} events", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
}
