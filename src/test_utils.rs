//! Shared test utilities for the shop ledger.
//!
//! This module provides common helper functions for setting up test databases,
//! creating test items with sensible defaults and observing buyer notifications.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        balance,
        item::{self, ItemKind},
        ledger::EntryKind,
        notify::{DEFAULT_TIMEOUT, Dispatcher, Notifier, OrderNotification},
    },
    entities,
    errors::{Error, Result},
};
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::{
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

static NEXT_TITLE: AtomicU64 = AtomicU64::new(1);

fn unique_title(prefix: &str) -> String {
    format!("{prefix} {}", NEXT_TITLE.fetch_add(1, Ordering::Relaxed))
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Lists an available account with a unique title.
///
/// `seller` of `None` makes it platform-owned.
pub async fn create_test_account(
    db: &DatabaseConnection,
    seller: Option<&str>,
    price: i64,
) -> Result<entities::item::Model> {
    item::create_item(
        db,
        seller.map(str::to_string),
        ItemKind::Account,
        unique_title("Test Account"),
        price,
    )
    .await
}

/// Lists an available product with a unique title. A price of 0 makes it free.
pub async fn create_test_product(
    db: &DatabaseConnection,
    seller: Option<&str>,
    price: i64,
) -> Result<entities::item::Model> {
    item::create_item(
        db,
        seller.map(str::to_string),
        ItemKind::Product,
        unique_title("Test Product"),
        price,
    )
    .await
}

/// Gives a principal coins through a top-up ledger entry.
pub async fn fund(db: &DatabaseConnection, principal_id: &str, amount: i64) -> Result<i64> {
    let change = balance::credit(db, principal_id, amount, EntryKind::TopUp, None).await?;
    Ok(change.account.balance)
}

/// Notifier forwarding every notification into a channel.
pub struct RecordingNotifier {
    sender: UnboundedSender<OrderNotification>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &OrderNotification) -> Result<()> {
        self.sender
            .send(notification.clone())
            .map_err(|e| Error::Config {
                message: format!("recording channel closed: {e}"),
            })
    }
}

/// Dispatcher whose deliveries can be read back from the returned receiver.
pub fn recording_dispatcher() -> (Dispatcher, UnboundedReceiver<OrderNotification>) {
    let (sender, receiver) = unbounded_channel();
    let dispatcher = Dispatcher::new(Arc::new(RecordingNotifier { sender }), DEFAULT_TIMEOUT);
    (dispatcher, receiver)
}

/// Notifier that always fails.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _notification: &OrderNotification) -> Result<()> {
        Err(Error::Config {
            message: "notification service unavailable".to_string(),
        })
    }
}

/// Dispatcher backed by [`FailingNotifier`].
pub fn failing_dispatcher() -> Dispatcher {
    Dispatcher::new(Arc::new(FailingNotifier), Duration::from_millis(50))
}

/// Waits for the next delivered notification, panicking after one second.
pub async fn next_notification(
    receiver: &mut UnboundedReceiver<OrderNotification>,
) -> OrderNotification {
    tokio::time::timeout(Duration::from_secs(1), receiver.recv())
        .await
        .unwrap()
        .unwrap()
}

/// Shared buffer collecting formatted log lines.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Everything logged so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Routes this thread's log output into a buffer until the guard is dropped.
///
/// Works with the default current-thread `#[tokio::test]` runtime.
pub fn capture_logs() -> (DefaultGuard, LogBuffer) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_target(true)
        .finish();
    (tracing::subscriber::set_default(subscriber), buffer)
}
