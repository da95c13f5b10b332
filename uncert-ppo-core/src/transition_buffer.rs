//! Fixed-capacity buffer of on-policy transitions.
use crate::error::UppoError;
use anyhow::Result;

/// A transition `(o_t, a_t, r_t, o_t+1)` with the log probability of `a_t`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Observation.
    pub state: Vec<f32>,

    /// Action in `[0, 1]`, before being rescaled to the range of the environment.
    pub action: Vec<f32>,

    /// Reward.
    pub reward: f32,

    /// Next observation.
    pub next_state: Vec<f32>,

    /// Log probability of the action under the behavior policy.
    pub action_log_prob: f32,
}

impl Transition {
    /// Constructs a [`Transition`].
    pub fn new(
        state: Vec<f32>,
        action: Vec<f32>,
        reward: f32,
        next_state: Vec<f32>,
        action_log_prob: f32,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            action_log_prob,
        }
    }
}

/// Accumulates exactly `capacity` transitions, then hands them out at once.
///
/// The buffer is filled with [`TransitionBuffer::store`] until it reports
/// being full, then emptied with [`TransitionBuffer::drain`]. Stored
/// transitions are never reordered nor modified.
#[derive(Debug)]
pub struct TransitionBuffer {
    capacity: usize,
    data: Vec<Transition>,
}

impl TransitionBuffer {
    /// Constructs an empty buffer.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            data: Vec::with_capacity(capacity),
        }
    }

    /// Appends a transition.
    ///
    /// Returns `true` if the buffer holds `capacity` transitions after this call.
    /// Storing into a full buffer is an error of the caller and fails with
    /// [`UppoError::CapacityExceeded`].
    pub fn store(&mut self, transition: Transition) -> Result<bool> {
        if self.is_full() {
            return Err(UppoError::CapacityExceeded {
                capacity: self.capacity,
            }
            .into());
        }
        self.data.push(transition);
        Ok(self.is_full())
    }

    /// Takes all the transitions in insertion order and empties the buffer.
    ///
    /// Fails with [`UppoError::InsufficientData`] if the buffer is not full.
    pub fn drain(&mut self) -> Result<Vec<Transition>> {
        if !self.is_full() {
            return Err(UppoError::InsufficientData {
                len: self.data.len(),
                capacity: self.capacity,
            }
            .into());
        }
        Ok(std::mem::replace(
            &mut self.data,
            Vec::with_capacity(self.capacity),
        ))
    }

    /// Removes all transitions.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// The number of stored transitions.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no transition is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if `capacity` transitions are stored.
    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    /// Capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
