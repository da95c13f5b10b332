//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum UppoError {
    /// A transition was stored into a buffer that is already full.
    #[error("Transition buffer is full (capacity {capacity})")]
    CapacityExceeded {
        /// Capacity of the buffer.
        capacity: usize,
    },

    /// The buffer was drained before it was full.
    #[error("Transition buffer holds {len} of {capacity} transitions")]
    InsufficientData {
        /// Number of stored transitions.
        len: usize,
        /// Capacity of the buffer.
        capacity: usize,
    },

    /// The number of ensemble members in a checkpoint differs from the configuration.
    #[error("Checkpoint has {found} ensemble members, {expected} are configured")]
    CheckpointMismatch {
        /// Configured number of members.
        expected: usize,
        /// Number of members in the checkpoint.
        found: usize,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}
