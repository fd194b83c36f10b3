//! Order-status notifications.
//!
//! Delivery is fire-and-forget: [`Notifier::dispatch`] spawns the send and
//! only logs failures, so a broken mail relay never affects an order.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn, Instrument};

#[derive(Debug, Clone, Error, PartialEq)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log; mail transport lives outside this service.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            to = %notification.to,
            subject = %notification.subject,
            body = %notification.body,
            "Notification sent"
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Sends in the background; the caller never waits and never sees an error.
    pub fn dispatch(&self, notification: Notification) {
        let sink = self.sink.clone();
        let span = tracing::info_span!("notification", to = %notification.to);
        tokio::spawn(
            async move {
                if let Err(e) = sink.send(&notification).await {
                    warn!(error = %e, subject = %notification.subject, "Notification dropped");
                }
            }
            .instrument(span),
        );
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn notification() -> Notification {
        Notification {
            to: "alice@example.com".to_string(),
            subject: "Order order_1 cancelled".to_string(),
            body: "Your order was cancelled.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_delivers_in_background() {
        let (sink, mut received) = ChannelSink::new();
        let notifier = Notifier::new(Arc::new(sink));
        notifier.dispatch(notification());

        let got = tokio::time::timeout(Duration::from_secs(1), received.recv())
            .await
            .expect("notification should arrive")
            .expect("channel open");
        assert_eq!(got, notification());
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        let (attempts, mut seen) = mpsc::unbounded_channel();
        let notifier = Notifier::new(Arc::new(FailingSink { attempts }));
        notifier.dispatch(notification());

        let got = tokio::time::timeout(Duration::from_secs(1), seen.recv())
            .await
            .expect("send should be attempted");
        assert!(got.is_some());
    }
}
