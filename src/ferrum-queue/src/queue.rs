use std::ops::Range;

use ferrum_core::{PlaybackConfig, TrackId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::{QueueError, QueueResult};
use crate::observer::QueueSnapshot;
use crate::shuffle;

/// Identity of one entry in the queue. Unlike [`TrackId`] it is never reused,
/// so the same track can be queued twice and still be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct QueueId(pub u64);

impl QueueId {
    fn next(seed: &mut u64) -> Self {
        let id = *seed;
        *seed = seed.saturating_add(1);
        QueueId(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueItem {
    pub(crate) id: QueueId,
    pub(crate) track_id: TrackId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) non_shuffle_pos: Option<u32>,
}

impl QueueItem {
    pub fn id(&self) -> QueueId {
        self.id
    }

    pub fn track_id(&self) -> &TrackId {
        &self.track_id
    }

    /// Position in the auto queue before the current shuffle began, if this
    /// item was there when it started.
    pub fn non_shuffle_pos(&self) -> Option<u32> {
        self.non_shuffle_pos
    }
}

/// The item being played and where it was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Current {
    pub(crate) item: QueueItem,
    pub(crate) from_auto_queue: bool,
}

impl Current {
    pub fn item(&self) -> &QueueItem {
        &self.item
    }

    pub fn from_auto_queue(&self) -> bool {
        self.from_auto_queue
    }
}

/// Answers whether a track is still in the library.
pub trait TrackExists {
    fn exists(&self, track_id: &TrackId) -> bool;
}

impl<F> TrackExists for F
where
    F: Fn(&TrackId) -> bool,
{
    fn exists(&self, track_id: &TrackId) -> bool {
        self(track_id)
    }
}

/// What happened to one source index of a [`Queue::move_indexes`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovedItem {
    /// The entry left its old position.
    Relocated { id: QueueId },
    /// The source was in history or was the current item. It stays where it
    /// is and a new entry for the same track was inserted instead.
    Duplicated { source_index: usize, id: QueueId },
}

impl MovedItem {
    pub fn id(&self) -> QueueId {
        match self {
            MovedItem::Relocated { id } | MovedItem::Duplicated { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Flat range now occupied by the moved entries.
    pub range: Range<usize>,
    /// One entry per distinct source index, in destination order.
    pub items: Vec<MovedItem>,
}

impl MoveOutcome {
    pub fn has_duplicates(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item, MovedItem::Duplicated { .. }))
    }
}

/// Played history, the current item, the "play next" queue and the
/// auto-continuation, addressed as one flat sequence in that order.
///
/// Only the user and auto queues can be changed by index; history and the
/// current item move only through [`Queue::next`] and [`Queue::prev`].
#[derive(Debug, Clone)]
pub struct Queue {
    past: Vec<QueueItem>,
    current: Option<Current>,
    user_queue: Vec<QueueItem>,
    auto_queue: Vec<QueueItem>,
    shuffle: bool,
    repeat: bool,
    next_id: u64,
    rng: StdRng,
}

impl Default for Queue {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue whose shuffles are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        let mut queue = Self::new();
        queue.shuffle = config.shuffle;
        queue.repeat = config.repeat;
        queue
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            past: Vec::new(),
            current: None,
            user_queue: Vec::new(),
            auto_queue: Vec::new(),
            shuffle: false,
            repeat: false,
            next_id: 0,
            rng,
        }
    }

    fn mint(&mut self, track_id: TrackId) -> QueueItem {
        QueueItem {
            id: QueueId::next(&mut self.next_id),
            track_id,
            non_shuffle_pos: None,
        }
    }

    pub fn past(&self) -> &[QueueItem] {
        &self.past
    }

    pub fn current(&self) -> Option<&QueueItem> {
        self.current.as_ref().map(|current| &current.item)
    }

    pub fn current_entry(&self) -> Option<&Current> {
        self.current.as_ref()
    }

    pub fn user_queue(&self) -> &[QueueItem] {
        &self.user_queue
    }

    pub fn auto_queue(&self) -> &[QueueItem] {
        &self.auto_queue
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    /// Number of entries across all four segments.
    pub fn len(&self) -> usize {
        self.boundary() + self.upcoming_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries still to come: the user queue followed by the auto queue.
    pub fn upcoming_len(&self) -> usize {
        self.user_queue.len() + self.auto_queue.len()
    }

    /// First flat index that can be inserted at or removed.
    pub fn boundary(&self) -> usize {
        self.past.len() + usize::from(self.current.is_some())
    }

    /// All entries in playback order.
    pub fn iter(&self) -> impl Iterator<Item = &QueueItem> + '_ {
        self.past
            .iter()
            .chain(self.current())
            .chain(self.user_queue.iter())
            .chain(self.auto_queue.iter())
    }

    pub fn get_by_flat_index(&self, index: usize) -> QueueResult<&QueueItem> {
        let mut local = index;
        if local < self.past.len() {
            return Ok(&self.past[local]);
        }
        local -= self.past.len();

        if let Some(current) = &self.current {
            if local == 0 {
                return Ok(&current.item);
            }
            local -= 1;
        }

        if local < self.user_queue.len() {
            return Ok(&self.user_queue[local]);
        }
        local -= self.user_queue.len();

        self.auto_queue.get(local).ok_or(QueueError::OutOfRange {
            index,
            len: self.len(),
        })
    }

    /// Address only the upcoming entries, 0 being the head of the user queue.
    pub fn get_by_queue_index(&self, index: usize) -> QueueResult<&QueueItem> {
        let user_len = self.user_queue.len();
        let item = if index < user_len {
            self.user_queue.get(index)
        } else {
            self.auto_queue.get(index - user_len)
        };
        item.ok_or(QueueError::OutOfRange {
            index,
            len: self.upcoming_len(),
        })
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot::from(self)
    }

    /// Replace everything with `ids`, playing `ids[start_index]`. Earlier ids
    /// become history and later ids the auto queue; the user queue is emptied.
    pub fn set_new_queue(&mut self, ids: Vec<TrackId>, start_index: usize) -> QueueResult<()> {
        self.replace_segments(ids, start_index)?;
        self.finish_new_queue();
        Ok(())
    }

    /// Like [`Queue::set_new_queue`], but drops tracks that no longer exist
    /// before the auto queue is shuffled. If the start track itself is gone
    /// the queue is left stopped with the rest in place.
    pub fn set_new_queue_pruned<E>(
        &mut self,
        ids: Vec<TrackId>,
        start_index: usize,
        exists: &E,
    ) -> QueueResult<()>
    where
        E: TrackExists + ?Sized,
    {
        self.replace_segments(ids, start_index)?;
        self.remove_deleted(exists);
        self.finish_new_queue();
        Ok(())
    }

    fn replace_segments(&mut self, ids: Vec<TrackId>, start_index: usize) -> QueueResult<()> {
        if start_index >= ids.len() {
            warn!(start = start_index, len = ids.len(), "rejecting new queue");
            return Err(QueueError::InvalidStart {
                start: start_index,
                len: ids.len(),
            });
        }

        let mut ids = ids.into_iter();
        let past: Vec<_> = ids
            .by_ref()
            .take(start_index)
            .map(|id| self.mint(id))
            .collect();
        let current = ids.next().map(|id| Current {
            item: self.mint(id),
            from_auto_queue: true,
        });
        let auto_queue: Vec<_> = ids.map(|id| self.mint(id)).collect();

        self.past = past;
        self.current = current;
        self.user_queue.clear();
        self.auto_queue = auto_queue;
        Ok(())
    }

    fn finish_new_queue(&mut self) {
        if self.shuffle {
            shuffle::stamp_and_shuffle(&mut self.auto_queue, &mut self.rng);
        }
        debug!(
            past = self.past.len(),
            upcoming = self.auto_queue.len(),
            shuffle = self.shuffle,
            "new queue"
        );
    }

    fn check_insert_index(&self, flat_index: usize) -> QueueResult<usize> {
        let boundary = self.boundary();
        if flat_index < boundary {
            warn!(index = flat_index, boundary, "rejecting insert into history");
            return Err(QueueError::ProtectedIndex {
                index: flat_index,
                boundary,
            });
        }
        let len = self.len();
        if flat_index > len {
            warn!(index = flat_index, len, "rejecting insert past the end");
            return Err(QueueError::OutOfRange {
                index: flat_index,
                len,
            });
        }
        Ok(flat_index - boundary)
    }

    /// Splice `items` in at `local` (an offset from the boundary) and return
    /// the flat range they landed in.
    fn insert_items(
        &mut self,
        items: Vec<QueueItem>,
        local: usize,
        force_user_queue: bool,
    ) -> Range<usize> {
        let boundary = self.boundary();
        let count = items.len();
        let user_len = self.user_queue.len();

        let start = if local < user_len || force_user_queue {
            let at = local.min(user_len);
            self.user_queue.splice(at..at, items);
            at
        } else {
            let at = local - user_len;
            self.auto_queue.splice(at..at, items);
            local
        };

        boundary + start..boundary + start + count
    }

    /// Insert fresh entries for `ids` at `flat_index`.
    ///
    /// Indexes inside the user queue go there, later ones into the auto
    /// queue. With `force_user_queue` the entries always join the user queue,
    /// at its end if `flat_index` points further back.
    pub fn insert_ids(
        &mut self,
        ids: Vec<TrackId>,
        flat_index: usize,
        force_user_queue: bool,
    ) -> QueueResult<Range<usize>> {
        let local = self.check_insert_index(flat_index)?;
        let items = ids.into_iter().map(|id| self.mint(id)).collect();
        let range = self.insert_items(items, local, force_user_queue);
        debug!(from = range.start, to = range.end, "inserted ids");
        Ok(range)
    }

    pub fn prepend_to_user_queue(&mut self, ids: Vec<TrackId>) -> Range<usize> {
        let items = ids.into_iter().map(|id| self.mint(id)).collect();
        self.insert_items(items, 0, true)
    }

    pub fn append_to_user_queue(&mut self, ids: Vec<TrackId>) -> Range<usize> {
        let items = ids.into_iter().map(|id| self.mint(id)).collect();
        let end = self.user_queue.len();
        self.insert_items(items, end, true)
    }

    /// Remove whatever sits at `flat_index`; protected indexes yield `None`.
    fn take_index(&mut self, flat_index: usize) -> Option<QueueItem> {
        let local = flat_index.checked_sub(self.boundary())?;
        if local < self.user_queue.len() {
            return Some(self.user_queue.remove(local));
        }
        let local = local - self.user_queue.len();
        if local >= self.auto_queue.len() {
            return None;
        }
        let mut item = self.auto_queue.remove(local);
        item.non_shuffle_pos = None;
        Some(item)
    }

    /// Remove the entry at `flat_index`. History and the current item cannot
    /// be removed; asking for them is a no-op returning `Ok(None)`.
    pub fn remove_index(&mut self, flat_index: usize) -> QueueResult<Option<QueueItem>> {
        let len = self.len();
        if flat_index >= len {
            return Err(QueueError::OutOfRange {
                index: flat_index,
                len,
            });
        }
        Ok(self.take_index(flat_index))
    }

    /// Validate every index up front, then sort them descending without
    /// duplicates so each removal leaves the remaining indexes valid.
    fn descending_unique(&self, indexes: &[usize]) -> QueueResult<Vec<usize>> {
        let len = self.len();
        if let Some(&index) = indexes.iter().find(|&&index| index >= len) {
            warn!(index, len, "rejecting batch with out of range index");
            return Err(QueueError::OutOfRange { index, len });
        }
        let mut sorted = indexes.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        Ok(sorted)
    }

    /// Remove every listed entry, in any input order. Protected indexes are
    /// skipped. The removed entries are returned in playback order.
    pub fn remove_indexes(&mut self, indexes: &[usize]) -> QueueResult<Vec<QueueItem>> {
        let sorted = self.descending_unique(indexes)?;
        let mut removed: Vec<_> = sorted
            .into_iter()
            .filter_map(|index| self.take_index(index))
            .collect();
        removed.reverse();
        debug!(count = removed.len(), "removed entries");
        Ok(removed)
    }

    /// Move the listed entries so they sit together starting at `new_index`,
    /// keeping their relative order. `new_index` is read against the queue
    /// before anything is removed.
    ///
    /// Sources in history or the current item are copied rather than moved;
    /// see [`MovedItem::Duplicated`].
    pub fn move_indexes(
        &mut self,
        indexes: &[usize],
        new_index: usize,
        to_user_queue: bool,
    ) -> QueueResult<MoveOutcome> {
        let sorted = self.descending_unique(indexes)?;
        self.check_insert_index(new_index)?;
        let boundary = self.boundary();

        let mut new_index = new_index;
        let mut collected = Vec::with_capacity(sorted.len());
        for index in sorted {
            match self.take_index(index) {
                Some(item) => {
                    if index < new_index {
                        new_index -= 1;
                    }
                    collected.push((None, item));
                }
                None => {
                    // History and the current item are untouched by removals,
                    // so `index` still points at the same source.
                    if let Ok(source) = self.get_by_flat_index(index) {
                        let track_id = source.track_id.clone();
                        let copy = self.mint(track_id);
                        collected.push((Some(index), copy));
                    }
                }
            }
        }
        collected.reverse();

        let items = collected
            .iter()
            .map(|(source, item)| match source {
                Some(source_index) => MovedItem::Duplicated {
                    source_index: *source_index,
                    id: item.id,
                },
                None => MovedItem::Relocated { id: item.id },
            })
            .collect();
        let entries = collected.into_iter().map(|(_, item)| item).collect();
        let range = self.insert_items(entries, new_index - boundary, to_user_queue);

        let outcome = MoveOutcome { range, items };
        if outcome.has_duplicates() {
            warn!("move included history or the current item; copied instead of moved");
        }
        debug!(
            from = outcome.range.start,
            to = outcome.range.end,
            "moved entries"
        );
        Ok(outcome)
    }

    /// Shuffle (`true`) or restore the pre-shuffle order of (`false`) the
    /// auto queue, and record the flag. Shuffling again re-stamps everything.
    pub fn apply_shuffle(&mut self, enabled: bool) {
        self.shuffle = enabled;
        if enabled {
            shuffle::stamp_and_shuffle(&mut self.auto_queue, &mut self.rng);
        } else {
            shuffle::restore_order(&mut self.auto_queue);
        }
        debug!(shuffle = enabled, upcoming = self.auto_queue.len(), "applied shuffle");
    }

    /// Returns whether the flag changed; the auto queue is only touched if it did.
    pub fn set_shuffle(&mut self, enabled: bool) -> bool {
        if self.shuffle == enabled {
            return false;
        }
        self.apply_shuffle(enabled);
        true
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.apply_shuffle(!self.shuffle);
        self.shuffle
    }

    pub fn set_repeat(&mut self, enabled: bool) -> bool {
        let changed = self.repeat != enabled;
        self.repeat = enabled;
        changed
    }

    pub fn toggle_repeat(&mut self) -> bool {
        self.repeat = !self.repeat;
        self.repeat
    }

    /// Advance playback and return the new current item.
    ///
    /// The user queue is drained before the auto queue. With repeat on, a
    /// finished item is re-queued at the end of the auto queue whenever the
    /// next item comes from there.
    pub fn next(&mut self) -> Option<&QueueItem> {
        let finished = self.current.take().map(|current| current.item);
        let finished_track = finished.as_ref().map(|item| item.track_id.clone());
        if let Some(item) = finished {
            self.past.push(item);
        }

        self.current = if !self.user_queue.is_empty() {
            Some(Current {
                item: self.user_queue.remove(0),
                from_auto_queue: false,
            })
        } else if !self.auto_queue.is_empty() {
            if self.repeat {
                if let Some(track_id) = finished_track {
                    let looped = self.mint(track_id);
                    self.auto_queue.push(looped);
                }
            }
            let mut item = self.auto_queue.remove(0);
            item.non_shuffle_pos = None;
            Some(Current {
                item,
                from_auto_queue: true,
            })
        } else {
            None
        };

        trace!(current = ?self.current().map(|item| item.id), "next");
        self.current()
    }

    /// Step back into history. The item that was current goes to the front
    /// of the user queue so it plays again afterwards. Without history this
    /// does nothing and returns `None`.
    pub fn prev(&mut self) -> Option<&QueueItem> {
        let item = self.past.pop()?;
        if let Some(held) = self.current.take() {
            self.user_queue.insert(0, held.item);
        }
        self.current = Some(Current {
            item,
            from_auto_queue: false,
        });

        trace!(current = ?self.current().map(|item| item.id), "prev");
        self.current()
    }

    /// Drop entries whose track no longer exists. A deleted current item is
    /// cleared, not skipped. Returns whether anything was removed.
    pub fn remove_deleted<E>(&mut self, exists: &E) -> bool
    where
        E: TrackExists + ?Sized,
    {
        let before = self.len();
        self.past.retain(|item| exists.exists(&item.track_id));
        let current_gone = self
            .current
            .as_ref()
            .is_some_and(|current| !exists.exists(&current.item.track_id));
        if current_gone {
            self.current = None;
        }
        self.user_queue.retain(|item| exists.exists(&item.track_id));
        self.auto_queue.retain(|item| exists.exists(&item.track_id));

        let pruned = before - self.len();
        if pruned > 0 {
            debug!(pruned, current_cleared = current_gone, "pruned deleted tracks");
        }
        pruned > 0
    }
}
