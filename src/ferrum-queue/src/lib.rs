//! Playback queue for Ferrum.
//!
//! The queue is four segments read as one sequence:
//!
//! ```text
//! past (oldest first) | current | user queue ("play next") | auto queue
//! ```
//!
//! [`Queue`] owns the segments and all of the index arithmetic. [`PlaybackQueue`]
//! wraps a queue and tells registered [`QueueObserver`]s about every change.

mod error;
mod observer;
mod queue;
mod session;
mod shuffle;

pub use error::{QueueError, QueueResult};
pub use ferrum_core::TrackId;
pub use observer::{QueueEvent, QueueObserver, QueueSnapshot, SubscriptionId};
pub use queue::{Current, MoveOutcome, MovedItem, Queue, QueueId, QueueItem, TrackExists};
pub use session::PlaybackQueue;
