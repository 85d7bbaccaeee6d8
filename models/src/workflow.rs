// models/src/workflow.rs

use std::fmt;

use crate::errors::TransitionError;

/// A closed status enum with an explicit set of allowed moves.
pub trait Workflow: Copy + Eq + fmt::Display {
    /// Entity name used in transition errors.
    const ENTITY: &'static str;

    /// Whether moving from `self` to a *different* status `to` is allowed.
    fn allows(self, to: Self) -> bool;

    /// Validates a move. Re-applying the current status is always accepted.
    fn transition(self, to: Self) -> Result<Self, TransitionError> {
        if self == to || self.allows(to) {
            Ok(to)
        } else {
            Err(TransitionError {
                entity: Self::ENTITY,
                from: self.to_string(),
                to: to.to_string(),
            })
        }
    }
}
