//! Request handler for Callback API deliveries.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error, info, warn};

use super::queue::EnqueueError;
use super::WebhookState;
use crate::types::Packet;

/// Body acknowledging a delivered event.
pub const ACK_BODY: &str = "ok";

/// Handle one delivery.
///
/// - undecodable body: `400`, nothing queued
/// - secret mismatch: `403` with an empty body, nothing queued
/// - confirmation challenge: `200` with the confirmation string
/// - anything else: queued, then `200 ok`; `503` if it could not be queued
pub(crate) async fn handle_callback(State(state): State<WebhookState>, body: Bytes) -> Response {
    let packet: Packet = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "rejecting undecodable callback body");
            return (StatusCode::BAD_REQUEST, "invalid callback body").into_response();
        }
    };

    if packet.secret != *state.secret {
        warn!(kind = %packet.kind, group_id = packet.group_id, "callback secret mismatch");
        return StatusCode::FORBIDDEN.into_response();
    }

    if packet.is_confirmation() {
        info!(group_id = packet.group_id, "answering confirmation challenge");
        return (StatusCode::OK, state.confirmation.to_string()).into_response();
    }

    let kind = packet.kind.clone();
    match state.sender.enqueue(packet).await {
        Ok(()) => {
            debug!(%kind, "callback event queued");
            (StatusCode::OK, ACK_BODY).into_response()
        }
        Err(EnqueueError::Closed) => {
            error!(%kind, "event consumer is gone, dropping callback event");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
        Err(e) => {
            warn!(%kind, error = %e, "dropping callback event");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
