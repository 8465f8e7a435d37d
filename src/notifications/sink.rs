//! Delivery seams for notification requests.

use crossbeam::channel::{unbounded, Receiver, Sender};

use super::types::NotificationRequest;

/// Receives notification requests emitted by the engine.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, request: NotificationRequest);
}

/// Forwards requests over a crossbeam channel to a delivery worker.
pub struct ChannelSink {
    tx: Sender<NotificationRequest>,
}

impl ChannelSink {
    /// Create a sink together with the receiving end.
    pub fn new() -> (Self, Receiver<NotificationRequest>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn deliver(&self, request: NotificationRequest) {
        if self.tx.send(request).is_err() {
            tracing::warn!("Notification receiver dropped; request discarded");
        }
    }
}

/// Logs requests instead of delivering them.
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, request: NotificationRequest) {
        tracing::info!(
            user_id = %request.user_id,
            kind = request.kind.as_str(),
            "Notification requested"
        );
    }
}
