//! Checked moves between lifecycle states.

use std::fmt::Debug;

use super::ValidationError;

/// A lifecycle enum that only moves along allowed edges.
pub trait StateMachine: Copy + Debug {
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns `target` when the edge exists.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if !self.can_transition_to(&target) {
            return Err(ValidationError::invalid_format(
                "state",
                format!("{:?} cannot move to {:?}", self, target),
            ));
        }
        Ok(target)
    }
}
