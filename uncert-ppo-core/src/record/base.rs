//! Base implementation of records for logging.
use crate::error::UppoError;
use chrono::prelude::{DateTime, Local};
use std::collections::{hash_map::Iter, HashMap};

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A metric like a score or a loss.
    Scalar(f32),

    /// The time when the record was made.
    DateTime(DateTime<Local>),
}

/// Key-value pairs emitted by the trainer and the evaluator.
///
/// # Examples
///
/// ```rust
/// use uncert_ppo_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("policy_loss", 0.5);
/// record.insert("value_loss", RecordValue::Scalar(0.1));
///
/// let loss = record.get_scalar("policy_loss").unwrap();
/// assert_eq!(loss, 0.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a key-value pair, replacing the value of an existing key.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Iterates over the key-value pairs.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// The value of the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Moves the entries of `record` into this one. Values of `record` win
    /// on shared keys.
    pub fn merge_inplace(&mut self, record: Record) {
        self.0.extend(record.0);
    }

    /// Gets a scalar value from the record.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not exist or the value is not a scalar.
    pub fn get_scalar(&self, k: &str) -> Result<f32, UppoError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(UppoError::RecordValueTypeError("Scalar".to_string())),
            None => Err(UppoError::RecordKeyError(k.to_string())),
        }
    }
}
