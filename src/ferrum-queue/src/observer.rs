//! Change notifications for the UI store and the menu bridge.

use serde::Serialize;

use crate::queue::{Current, Queue, QueueItem};

/// Owned copy of the queue at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub past: Vec<QueueItem>,
    pub current: Option<Current>,
    pub user_queue: Vec<QueueItem>,
    pub auto_queue: Vec<QueueItem>,
    pub len: usize,
    pub shuffle: bool,
    pub repeat: bool,
}

impl From<&Queue> for QueueSnapshot {
    fn from(queue: &Queue) -> Self {
        Self {
            past: queue.past().to_vec(),
            current: queue.current_entry().cloned(),
            user_queue: queue.user_queue().to_vec(),
            auto_queue: queue.auto_queue().to_vec(),
            len: queue.len(),
            shuffle: queue.shuffle(),
            repeat: queue.repeat(),
        }
    }
}

/// Events emitted by [`crate::PlaybackQueue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum QueueEvent {
    /// Segments changed; sent after every mutation.
    Changed(QueueSnapshot),
    /// Mirrors the shuffle toggle, e.g. to a checkable menu item.
    ShuffleChanged(bool),
    /// Mirrors the repeat toggle.
    RepeatChanged(bool),
}

pub trait QueueObserver: Send + Sync {
    fn notify(&self, event: &QueueEvent);
}

impl<F> QueueObserver for F
where
    F: Fn(&QueueEvent) + Send + Sync,
{
    fn notify(&self, event: &QueueEvent) {
        self(event)
    }
}

/// Handle returned by [`crate::PlaybackQueue::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);
