//! Buyer notifications for resolved orders.
//!
//! Workflows hand a [`OrderNotification`] to [`Dispatcher::dispatch`] after their database transaction has
//! committed. Delivery runs on a spawned task with a per-attempt timeout and one retry; a
//! failure is logged and dropped and never reaches the workflow's caller.

use crate::errors::Result;
use async_trait::async_trait;
use std::{fmt, sync::Arc, time::Duration};
use tracing::{debug, info, warn};

/// Attempts made before a notification is dropped.
pub const MAX_ATTEMPTS: u32 = 2;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// What happened to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// The order was approved (including self-approved coin purchases and free claims)
    OrderApproved,
    /// The order was rejected
    OrderRejected,
}

impl NotificationKind {
    /// Wire name of the notification template.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderApproved => "order_approved",
            Self::OrderRejected => "order_rejected",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message addressed to the buyer of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderNotification {
    /// Template to use
    pub kind: NotificationKind,
    /// Recipient
    pub buyer_id: String,
    /// Order concerned
    pub order_id: i64,
    /// Title of the purchased item
    pub item_title: String,
    /// Order amount in coins
    pub amount: i64,
    /// Rejection reason, if any
    pub reason: Option<String>,
}

impl OrderNotification {
    /// Human readable body shared by the text-based notifiers.
    #[must_use]
    pub fn render(&self) -> String {
        match self.kind {
            NotificationKind::OrderApproved => format!(
                "✅ Your order #{} for '{}' ({} coins) has been approved.",
                self.order_id, self.item_title, self.amount
            ),
            NotificationKind::OrderRejected => {
                let reason = self
                    .reason
                    .as_ref()
                    .map(|reason| format!(" Reason: {reason}"))
                    .unwrap_or_default();
                format!(
                    "❌ Your order #{} for '{}' ({} coins) has been rejected.{reason}",
                    self.order_id, self.item_title, self.amount
                )
            }
        }
    }
}

/// Delivers notifications to buyers.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one notification.
    async fn notify(&self, notification: &OrderNotification) -> Result<()>;
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &OrderNotification) -> Result<()> {
        info!(
            kind = %notification.kind,
            buyer = %notification.buyer_id,
            order_id = notification.order_id,
            "{}",
            notification.render()
        );
        Ok(())
    }
}

/// Notifier handle plus its delivery policy, shared by every workflow call.
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Wraps a notifier with the given per-attempt timeout.
    pub fn new(notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        Self { notifier, timeout }
    }

    /// Dispatcher that only logs.
    #[must_use]
    pub fn log_only() -> Self {
        Self::new(Arc::new(LogNotifier), DEFAULT_TIMEOUT)
    }

    /// Fire-and-forget delivery on a background task.
    pub fn dispatch(&self, notification: OrderNotification) -> tokio::task::JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.timeout;
        tokio::spawn(async move { deliver(notifier.as_ref(), &notification, timeout).await })
    }
}

/// Tries delivery up to [`MAX_ATTEMPTS`] times, then logs and drops.
async fn deliver(notifier: &dyn Notifier, notification: &OrderNotification, timeout: Duration) {
    for attempt in 1..=MAX_ATTEMPTS {
        match tokio::time::timeout(timeout, notifier.notify(notification)).await {
            Ok(Ok(())) => {
                debug!(
                    kind = %notification.kind,
                    order_id = notification.order_id,
                    attempt,
                    "Notification delivered"
                );
                return;
            }
            Ok(Err(e)) => warn!(
                kind = %notification.kind,
                order_id = notification.order_id,
                attempt,
                "Notification failed: {e}"
            ),
            Err(_) => warn!(
                kind = %notification.kind,
                order_id = notification.order_id,
                attempt,
                "Notification timed out after {timeout:?}"
            ),
        }
    }
    warn!(
        kind = %notification.kind,
        buyer = %notification.buyer_id,
        order_id = notification.order_id,
        "Dropping notification after {MAX_ATTEMPTS} attempts"
    );
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{errors::Error, test_utils::*};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn sample(kind: NotificationKind) -> OrderNotification {
        OrderNotification {
            kind,
            buyer_id: "buyer".to_string(),
            order_id: 9,
            item_title: "Account".to_string(),
            amount: 30,
            reason: Some("no receipt".to_string()),
        }
    }

    #[test]
    fn test_render() {
        let approved = sample(NotificationKind::OrderApproved).render();
        assert!(approved.contains("#9"));
        assert!(approved.contains("30 coins"));
        assert!(!approved.contains("no receipt"));

        let rejected = sample(NotificationKind::OrderRejected).render();
        assert!(rejected.contains("rejected"));
        assert!(rejected.contains("Reason: no receipt"));
        assert_eq!(NotificationKind::OrderRejected.as_str(), "order_rejected");
    }

    #[tokio::test]
    async fn test_dispatch_delivers() {
        let (dispatcher, mut received) = recording_dispatcher();
        dispatcher
            .dispatch(sample(NotificationKind::OrderApproved))
            .await
            .unwrap();
        let delivered = received.try_recv().unwrap();
        assert_eq!(delivered.order_id, 9);
    }

    struct FlakyNotifier {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn notify(&self, _notification: &OrderNotification) -> Result<()> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(Error::Config {
                    message: "mail server down".to_string(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatch_retries_once() {
        let flaky = Arc::new(FlakyNotifier {
            calls: AtomicU32::new(0),
        });
        let dispatcher = Dispatcher::new(Arc::clone(&flaky) as Arc<dyn Notifier>, DEFAULT_TIMEOUT);
        dispatcher
            .dispatch(sample(NotificationKind::OrderApproved))
            .await
            .unwrap();
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }

    struct SlowNotifier;

    #[async_trait]
    impl Notifier for SlowNotifier {
        async fn notify(&self, _notification: &OrderNotification) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatch_gives_up_on_timeout() {
        let dispatcher = Dispatcher::new(Arc::new(SlowNotifier), Duration::from_millis(10));
        // Completes (and drops the notification) instead of hanging
        dispatcher
            .dispatch(sample(NotificationKind::OrderRejected))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failing_notifier_is_swallowed() {
        let dispatcher = Dispatcher::new(Arc::new(FailingNotifier), DEFAULT_TIMEOUT);
        dispatcher
            .dispatch(sample(NotificationKind::OrderApproved))
            .await
            .unwrap();
    }
}
