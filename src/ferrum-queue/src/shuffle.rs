//! Invertible shuffling of the auto queue.
//!
//! Shuffling stamps each item with its position first, so turning shuffle
//! off can rebuild the original order even after removals. Items that joined
//! the auto queue later carry no stamp and end up after the restored block.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::queue::QueueItem;

/// Stamp every item with its current index, then Fisher-Yates shuffle in place.
pub(crate) fn stamp_and_shuffle<R: Rng + ?Sized>(items: &mut [QueueItem], rng: &mut R) {
    for (pos, item) in items.iter_mut().enumerate() {
        item.non_shuffle_pos = Some(pos as u32);
    }
    items.shuffle(rng);
}

/// Put stamped items back in stamp order, followed by unstamped items in
/// their current order. Clears every stamp.
pub(crate) fn restore_order(items: &mut Vec<QueueItem>) {
    let slots = items
        .iter()
        .filter_map(|item| item.non_shuffle_pos)
        .max()
        .map_or(0, |max| max as usize + 1);

    let mut stamped: Vec<Option<QueueItem>> = vec![None; slots];
    let mut unstamped = Vec::new();
    for mut item in items.drain(..) {
        match item.non_shuffle_pos.take().map(|pos| pos as usize) {
            Some(pos) if stamped[pos].is_none() => stamped[pos] = Some(item),
            _ => unstamped.push(item),
        }
    }

    items.extend(stamped.into_iter().flatten());
    items.extend(unstamped);
}
