//! Callback API webhook: HTTP endpoint, secret check, confirmation challenge,
//! and the bounded queue that hands events to application code.
//!
//! [`listen`] builds an axum [`Router`] together with the receiving half of
//! the queue. The router can be served with [`serve`] or merged into a larger
//! application.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;

use crate::config::{BotConfig, OverflowPolicy, WebhookConfig, MAX_QUEUE_CAPACITY};
use crate::types::Packet;

pub mod handler;
pub mod queue;

pub use queue::EnqueueError;

/// Settings [`listen`] refuses to register.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Route paths must be absolute.
    #[error("webhook path {0:?} must start with '/'")]
    InvalidPath(String),

    /// Queue capacity outside `1..=MAX_QUEUE_CAPACITY`.
    #[error("queue capacity {0} must be between 1 and {MAX_QUEUE_CAPACITY}")]
    QueueCapacity(usize),
}

/// Everything the webhook handler needs, detached from file configuration.
#[derive(Clone)]
pub struct WebhookSettings {
    /// URL path to register.
    pub path: String,
    /// Shared secret every delivery must carry.
    pub secret: String,
    /// Reply to the confirmation challenge.
    pub confirmation: String,
    /// Bounded queue capacity, `1..=MAX_QUEUE_CAPACITY`.
    pub queue_capacity: usize,
    /// Behaviour when the queue is full.
    pub overflow_policy: OverflowPolicy,
    /// Wait limit for [`OverflowPolicy::Timeout`].
    pub enqueue_timeout: Duration,
}

impl WebhookSettings {
    /// Combine bot credentials and webhook settings.
    pub fn from_config(bot: &BotConfig, webhook: &WebhookConfig) -> Self {
        Self {
            path: webhook.path.clone(),
            secret: bot.secret.clone(),
            confirmation: bot.confirmation.clone(),
            queue_capacity: webhook.queue_capacity,
            overflow_policy: webhook.overflow_policy,
            enqueue_timeout: webhook.enqueue_timeout(),
        }
    }
}

impl std::fmt::Debug for WebhookSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSettings")
            .field("path", &self.path)
            .field("secret", &"__REDACTED__")
            .field("confirmation", &self.confirmation)
            .field("queue_capacity", &self.queue_capacity)
            .field("overflow_policy", &self.overflow_policy)
            .field("enqueue_timeout", &self.enqueue_timeout)
            .finish()
    }
}

/// Shared handler state.
#[derive(Clone)]
pub(crate) struct WebhookState {
    pub(crate) secret: Arc<str>,
    pub(crate) confirmation: Arc<str>,
    pub(crate) sender: queue::EventSender,
}

/// Build the webhook router and the receiving end of its event queue.
///
/// Events whose secret matches and which are not confirmation challenges
/// are delivered on the returned receiver in arrival order.
///
/// # Errors
///
/// Returns [`WebhookError`] when the path is not absolute or the queue
/// capacity is zero or above [`MAX_QUEUE_CAPACITY`].
pub fn listen(
    settings: WebhookSettings,
) -> Result<(Router, mpsc::Receiver<Packet>), WebhookError> {
    if !settings.path.starts_with('/') {
        return Err(WebhookError::InvalidPath(settings.path));
    }
    if !(1..=MAX_QUEUE_CAPACITY).contains(&settings.queue_capacity) {
        return Err(WebhookError::QueueCapacity(settings.queue_capacity));
    }

    let (tx, rx) = mpsc::channel(settings.queue_capacity);
    let state = WebhookState {
        secret: Arc::from(settings.secret),
        confirmation: Arc::from(settings.confirmation),
        sender: queue::EventSender::new(tx, settings.overflow_policy, settings.enqueue_timeout),
    };

    info!(
        path = %settings.path,
        capacity = settings.queue_capacity,
        policy = ?settings.overflow_policy,
        "webhook registered"
    );

    let router = Router::new()
        .route(&settings.path, post(handler::handle_callback))
        .with_state(state);
    Ok((router, rx))
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(address = %addr, "webhook server listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
