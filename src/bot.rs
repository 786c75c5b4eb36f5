//! Event consumer behind the `serve` subcommand.
//!
//! [`run_consumer`] drains the webhook queue, logging every event, and can
//! reply to each new message with its own text.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::VkClient;
use crate::types::{EventKind, Packet};

/// Counters reported once the queue closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Events taken off the queue.
    pub received: u64,
    /// Echo replies the API accepted.
    pub echoed: u64,
    /// Echo replies that failed.
    pub failed: u64,
}

/// Drain `events` until every sender is dropped.
///
/// With `echo` set, each `message_new` event with a non-empty body is sent
/// back to its author. Other kinds and empty bodies are only logged. Send
/// failures are logged and do not stop the loop.
pub async fn run_consumer(
    mut events: mpsc::Receiver<Packet>,
    echo: Option<&VkClient>,
) -> ConsumerStats {
    let mut stats = ConsumerStats::default();

    while let Some(packet) = events.recv().await {
        stats.received = stats.received.saturating_add(1);
        let payload = &packet.payload;
        info!(
            kind = %packet.kind,
            group_id = packet.group_id,
            user_id = payload.user_id,
            message_id = payload.id,
            sent_at = ?payload.sent_at(),
            "callback event received"
        );

        let Some(client) = echo else {
            continue;
        };
        if !wants_echo(&packet) {
            continue;
        }
        match client.send(payload.user_id, [payload.body.as_str()]).await {
            Ok(result) => {
                stats.echoed = stats.echoed.saturating_add(1);
                debug!(message_id = ?result.response, "echo sent");
            }
            Err(e) => {
                stats.failed = stats.failed.saturating_add(1);
                warn!(error = %e, user_id = payload.user_id, "echo failed");
            }
        }
    }

    debug!(?stats, "event queue closed");
    stats
}

fn wants_echo(packet: &Packet) -> bool {
    packet.kind == EventKind::MessageNew && !packet.payload.body.is_empty()
}
