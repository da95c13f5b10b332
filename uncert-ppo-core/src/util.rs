//! Utilities for interaction of agents and environments.
use crate::ActionSpace;

/// Rescales an action in `[0, 1]` into the range of the action space.
///
/// Each dimension is mapped as `low + a * (high - low)`.
pub fn adjust_range(action: &[f32], space: &ActionSpace) -> Vec<f32> {
    debug_assert_eq!(action.len(), space.dim());
    action
        .iter()
        .zip(space.low.iter().zip(space.high.iter()))
        .map(|(a, (lo, hi))| lo + a * (hi - lo))
        .collect()
}
