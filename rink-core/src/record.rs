//! Types and traits for recording training metrics.
//!
//! * [`Record`] - A container for key-value pairs of various data types
//! * [`RecordValue`] - The types of values that can be stored in a [`Record`]
//! * [`Recorder`] - Writes records to an output destination
//! * [`AggregateRecorder`] - Stores records and writes aggregated values later
//! * [`RecordStorage`] - A storage with aggregation (min/max/mean/median)
//! * [`BufferedRecorder`] - A recorder keeping records in memory
//! * [`NullRecorder`] - A recorder that discards all records
//!
//! ```rust
//! use rink_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("episode", RecordValue::Scalar(1.0));
//! record.insert("reward", RecordValue::Scalar(-0.5));
//! assert_eq!(record.get_scalar("reward").unwrap(), -0.5);
//! ```
//!
//! The [`Trainer`](crate::Trainer) writes one record per episode with
//! [`Recorder::write`] and stores records of optimization steps with
//! [`AggregateRecorder::store`].
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;
