use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use futures_util::stream::Stream;
use tokio::sync::broadcast::error::RecvError;

use crate::{error::Result, middleware::auth::Claims, AppState};

const KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Server-sent event stream of everything the caller is allowed to see.
#[axum::debug_handler]
pub async fn stream_events(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let user_id = claims.user_id()?;
    let is_admin = claims.is_admin();
    let mut rx = state.events.subscribe();
    tracing::debug!(user = %user_id, "event stream opened");

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if !event.is_visible_to(user_id, is_admin) {
                        continue;
                    }
                    match Event::default().event(event.name()).json_data(&event) {
                        Ok(sse_event) => yield Ok::<Event, Infallible>(sse_event),
                        Err(e) => tracing::error!(error = ?e, "failed to encode event"),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(user = %user_id, skipped, "event stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE)))
}
