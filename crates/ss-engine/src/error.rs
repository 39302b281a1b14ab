//! Step-time error types.

use thiserror::Error;

/// Errors that can occur while executing a loaded program.
///
/// Runtime errors are data, not faults: they are returned from a step or
/// resume call together with the failing instruction's index, the engine
/// state is left untouched, and the engine remains steppable. The host
/// decides whether to halt the story, skip the instruction, or retry a
/// suspended answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// A variable was read before it was ever assigned.
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    /// An inventory operation named an inventory that was never created.
    #[error("unknown inventory: {0}")]
    UnknownInventory(String),

    /// `remove_item` named an item the inventory does not hold.
    #[error("item not found in {inventory}: {item}")]
    ItemNotFound {
        /// The inventory searched.
        inventory: String,
        /// The missing item.
        item: String,
    },

    /// `divide_by` with a zero divisor; the variable is left unchanged.
    #[error("division by zero on variable {0}")]
    DivisionByZero(String),

    /// `switch` found no arm matching the variable's value.
    #[error("no switch arm matches value `{value}` of variable {variable}")]
    UnmatchedSwitchValue {
        /// The variable dispatched on.
        variable: String,
        /// The unmatched value, rendered as text.
        value: String,
    },

    /// A choice/confirm answer outside `1..=limit`. The suspension is
    /// preserved so the host can retry.
    #[error("answer {answer} is out of range 1..={limit}")]
    AnswerOutOfRange {
        /// The rejected answer.
        answer: usize,
        /// The number of options on offer.
        limit: usize,
    },

    /// A value of the wrong type reached a typed operation.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the operation required.
        expected: String,
        /// What it actually received.
        found: String,
    },

    /// A character operation named a character not in the registry.
    #[error("unknown character: {0}")]
    UnknownCharacter(String),

    /// `randomize` with a non-positive range; there is nothing to draw from.
    #[error("empty random range {range} for variable {variable}")]
    EmptyRange {
        /// The variable that would have been written.
        variable: String,
        /// The rejected range bound.
        range: i64,
    },

    /// `resume` was called with no pending suspension.
    #[error("no pending choice or input to answer")]
    NothingPending,

    /// A branch target missing at runtime despite load-time validation.
    /// Indicates an internal-consistency fault, not a program error.
    #[error("internal fault: unresolved jump to `{0}`")]
    UnresolvedJump(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            RuntimeError::UndefinedVariable("gold".into()).to_string(),
            "undefined variable: gold"
        );
        assert_eq!(
            RuntimeError::AnswerOutOfRange {
                answer: 4,
                limit: 2
            }
            .to_string(),
            "answer 4 is out of range 1..=2"
        );
        assert_eq!(
            RuntimeError::DivisionByZero("x".into()).to_string(),
            "division by zero on variable x"
        );
    }
}
