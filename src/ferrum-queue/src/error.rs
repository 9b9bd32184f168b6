use thiserror::Error;

/// Misuse of the queue's index space. Every operation that returns one of
/// these has left the queue untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("index {index} is out of range for a queue of length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("index {index} lies in played history or the current item (boundary {boundary})")]
    ProtectedIndex { index: usize, boundary: usize },

    #[error("start index {start} is out of range for {len} track ids")]
    InvalidStart { start: usize, len: usize },
}

pub type QueueResult<T> = Result<T, QueueError>;
