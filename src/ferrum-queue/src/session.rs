use std::ops::Range;
use std::sync::Arc;

use ferrum_core::{PlaybackConfig, TrackId};
use tracing::debug;

use crate::error::QueueResult;
use crate::observer::{QueueEvent, QueueObserver, SubscriptionId};
use crate::queue::{MoveOutcome, Queue, QueueItem, TrackExists};

/// A [`Queue`] that reports every change to its subscribers.
///
/// Failed calls leave the queue untouched and notify nobody.
#[derive(Default)]
pub struct PlaybackQueue {
    queue: Queue,
    observers: Vec<(SubscriptionId, Arc<dyn QueueObserver>)>,
    next_subscription: u64,
}

impl std::fmt::Debug for PlaybackQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackQueue")
            .field("queue", &self.queue)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::with_queue(Queue::from_config(config))
    }

    pub fn with_queue(queue: Queue) -> Self {
        Self {
            queue,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn into_inner(self) -> Queue {
        self.queue
    }

    pub fn subscribe(&mut self, observer: Arc<dyn QueueObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, observer));
        debug!(subscription = id.0, "observer subscribed");
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        before != self.observers.len()
    }

    fn emit(&self, event: QueueEvent) {
        for (_, observer) in &self.observers {
            observer.notify(&event);
        }
    }

    fn changed(&self) {
        if !self.observers.is_empty() {
            self.emit(QueueEvent::Changed(self.queue.snapshot()));
        }
    }

    pub fn set_new_queue(&mut self, ids: Vec<TrackId>, start_index: usize) -> QueueResult<()> {
        self.queue.set_new_queue(ids, start_index)?;
        self.changed();
        Ok(())
    }

    pub fn set_new_queue_pruned<E>(
        &mut self,
        ids: Vec<TrackId>,
        start_index: usize,
        exists: &E,
    ) -> QueueResult<()>
    where
        E: TrackExists + ?Sized,
    {
        self.queue.set_new_queue_pruned(ids, start_index, exists)?;
        self.changed();
        Ok(())
    }

    pub fn insert_ids(
        &mut self,
        ids: Vec<TrackId>,
        flat_index: usize,
        force_user_queue: bool,
    ) -> QueueResult<Range<usize>> {
        let range = self.queue.insert_ids(ids, flat_index, force_user_queue)?;
        self.changed();
        Ok(range)
    }

    pub fn prepend_to_user_queue(&mut self, ids: Vec<TrackId>) -> Range<usize> {
        let range = self.queue.prepend_to_user_queue(ids);
        self.changed();
        range
    }

    pub fn append_to_user_queue(&mut self, ids: Vec<TrackId>) -> Range<usize> {
        let range = self.queue.append_to_user_queue(ids);
        self.changed();
        range
    }

    pub fn remove_index(&mut self, flat_index: usize) -> QueueResult<Option<QueueItem>> {
        let removed = self.queue.remove_index(flat_index)?;
        if removed.is_some() {
            self.changed();
        }
        Ok(removed)
    }

    pub fn remove_indexes(&mut self, indexes: &[usize]) -> QueueResult<Vec<QueueItem>> {
        let removed = self.queue.remove_indexes(indexes)?;
        if !removed.is_empty() {
            self.changed();
        }
        Ok(removed)
    }

    pub fn move_indexes(
        &mut self,
        indexes: &[usize],
        new_index: usize,
        to_user_queue: bool,
    ) -> QueueResult<MoveOutcome> {
        let outcome = self.queue.move_indexes(indexes, new_index, to_user_queue)?;
        if !outcome.items.is_empty() {
            self.changed();
        }
        Ok(outcome)
    }

    pub fn set_shuffle(&mut self, enabled: bool) -> bool {
        let changed = self.queue.set_shuffle(enabled);
        if changed {
            self.emit(QueueEvent::ShuffleChanged(enabled));
            self.changed();
        }
        changed
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        let enabled = !self.queue.shuffle();
        self.set_shuffle(enabled);
        enabled
    }

    pub fn set_repeat(&mut self, enabled: bool) -> bool {
        let changed = self.queue.set_repeat(enabled);
        if changed {
            self.emit(QueueEvent::RepeatChanged(enabled));
            self.changed();
        }
        changed
    }

    pub fn toggle_repeat(&mut self) -> bool {
        let enabled = !self.queue.repeat();
        self.set_repeat(enabled);
        enabled
    }

    /// Notifies nobody when the queue is stopped with nothing upcoming.
    pub fn next(&mut self) -> Option<&QueueItem> {
        let advances = self.queue.current().is_some() || self.queue.upcoming_len() > 0;
        self.queue.next();
        if advances {
            self.changed();
        }
        self.queue.current()
    }

    /// Returns `None`, and notifies nobody, when there is no history.
    pub fn prev(&mut self) -> Option<&QueueItem> {
        self.queue.prev()?;
        self.changed();
        self.queue.current()
    }

    pub fn remove_deleted<E>(&mut self, exists: &E) -> bool
    where
        E: TrackExists + ?Sized,
    {
        let changed = self.queue.remove_deleted(exists);
        if changed {
            self.changed();
        }
        changed
    }
}
