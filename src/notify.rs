//! User-facing notifications.
//!
//! Commands never notify on their own. A [`Notice`] names the message key and
//! severity for an outcome; a [`Notifier`] delivers the translated
//! [`Notification`]. [`NotificationChannel`] fans notifications out to any
//! number of listeners over bounded channels.

use crossbeam_channel::{
    bounded, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError, TrySendError,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Notice severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Error,
}

/// An untranslated notice: a message key and its severity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub key: String,
    pub severity: Severity,
}

impl Notice {
    pub fn info(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            severity: Severity::Error,
        }
    }
}

/// Display color of a notification. Only errors are colored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationColor {
    Error,
}

/// A translated notification, `{ "text": .., "color": "error" }` on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<NotificationColor>,
}

impl Notification {
    /// Build a notification from a notice and its translated text.
    pub fn from_notice(notice: &Notice, text: String) -> Self {
        let color = match notice.severity {
            Severity::Info => None,
            Severity::Error => Some(NotificationColor::Error),
        };
        Self { text, color }
    }

    pub fn is_error(&self) -> bool {
        self.color == Some(NotificationColor::Error)
    }
}

/// Fire-and-forget sink for notifications.
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}

/// Discards every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl Notifier for Silent {
    fn notify(&self, _notification: Notification) {}
}

/// Unique identifier for a listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Receiving end of a [`NotificationChannel`] subscription.
pub struct NotificationListener {
    pub id: ListenerId,
    pub receiver: Receiver<Notification>,
}

impl NotificationListener {
    /// Receive the next notification (blocking).
    pub fn recv(&self) -> Result<Notification, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a notification (non-blocking).
    pub fn try_recv(&self) -> Result<Notification, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Notification, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Everything received so far, without blocking.
    pub fn drain(&self) -> Vec<Notification> {
        self.receiver.try_iter().collect()
    }
}

/// Broadcasts notifications to listeners.
///
/// Listeners whose buffer is full or whose receiver was dropped are removed.
pub struct NotificationChannel {
    listeners: RwLock<HashMap<ListenerId, Sender<Notification>>>,
    next_id: AtomicU64,
    buffer_size: usize,
}

impl NotificationChannel {
    /// Default per-listener buffer.
    pub const DEFAULT_BUFFER: usize = 256;

    pub fn new() -> Self {
        Self::with_buffer(Self::DEFAULT_BUFFER)
    }

    pub fn with_buffer(buffer_size: usize) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer_size,
        }
    }

    pub fn subscribe(&self) -> NotificationListener {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(self.buffer_size);
        self.listeners.write().insert(id, sender);
        NotificationListener { id, receiver }
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        self.listeners.write().remove(&id);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotificationChannel {
    fn notify(&self, notification: Notification) {
        let mut to_remove = Vec::new();

        {
            let listeners = self.listeners.read();
            for (id, sender) in listeners.iter() {
                match sender.try_send(notification.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                        to_remove.push(*id)
                    }
                }
            }
        }

        if !to_remove.is_empty() {
            let mut listeners = self.listeners.write();
            for id in to_remove {
                listeners.remove(&id);
            }
        }
    }
}
