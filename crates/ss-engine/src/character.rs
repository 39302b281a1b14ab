//! The character registry.

use serde::{Deserialize, Serialize};

/// A registered story character.
///
/// All fields default to empty text on creation and are overwritten by the
/// corresponding instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Current emotion.
    pub emotion: String,
    /// Descriptive text.
    pub description: String,
    /// Free-form status.
    pub status: String,
}
