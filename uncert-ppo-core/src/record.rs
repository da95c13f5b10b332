//! Types and traits for recording training metrics.
//!
//! The [`Trainer`](crate::Trainer) emits one [`Record`] per training episode
//! and the [`Evaluator`](crate::Evaluator) one per evaluation batch. Records
//! are handed to a [`Recorder`], which writes them to some destination.
//!
//! ```rust
//! use uncert_ppo_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("Episode Score", RecordValue::Scalar(-120.5));
//! record.insert("Episode Steps", RecordValue::Scalar(200.0));
//! assert_eq!(record.get_scalar("Episode Steps").unwrap(), 200.0);
//! ```
mod base;
mod buffered_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use recorder::{LogRecorder, Recorder, TeeRecorder};
