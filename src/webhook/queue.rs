//! Bounded hand-off queue with an explicit overflow policy.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};

use crate::config::OverflowPolicy;
use crate::types::Packet;

/// Why an event could not be queued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnqueueError {
    /// The queue was full and the policy is [`OverflowPolicy::Reject`].
    #[error("event queue is full")]
    Full,

    /// The queue stayed full for the whole wait limit.
    #[error("event queue stayed full for {0:?}")]
    TimedOut(Duration),

    /// The consumer dropped the receiver.
    #[error("event consumer is gone")]
    Closed,
}

/// Producer half of the event queue.
#[derive(Clone)]
pub(crate) struct EventSender {
    tx: mpsc::Sender<Packet>,
    policy: OverflowPolicy,
    timeout: Duration,
}

impl EventSender {
    pub(crate) fn new(tx: mpsc::Sender<Packet>, policy: OverflowPolicy, timeout: Duration) -> Self {
        Self {
            tx,
            policy,
            timeout,
        }
    }

    /// Queue one event according to the configured policy.
    pub(crate) async fn enqueue(&self, packet: Packet) -> Result<(), EnqueueError> {
        match self.policy {
            OverflowPolicy::Block => self
                .tx
                .send(packet)
                .await
                .map_err(|_| EnqueueError::Closed),
            OverflowPolicy::Reject => self.tx.try_send(packet).map_err(|e| match e {
                TrySendError::Full(_) => EnqueueError::Full,
                TrySendError::Closed(_) => EnqueueError::Closed,
            }),
            OverflowPolicy::Timeout => self
                .tx
                .send_timeout(packet, self.timeout)
                .await
                .map_err(|e| match e {
                    SendTimeoutError::Timeout(_) => EnqueueError::TimedOut(self.timeout),
                    SendTimeoutError::Closed(_) => EnqueueError::Closed,
                }),
        }
    }
}
