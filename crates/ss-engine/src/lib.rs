//! Step-at-a-time execution engine for compiled StoryScript programs.
//!
//! The engine consumes a validated [`ss_program::Program`] and drives it to
//! completion one instruction per [`Engine::step`], maintaining variable,
//! inventory, character, and scene state, and suspending at choices and
//! input prompts until the host answers through [`Engine::resume`]. Runtime
//! errors are surfaced as data; they never corrupt engine state.

/// The character registry record.
pub mod character;
/// The execution engine and its step protocol.
pub mod engine;
/// Step-time error types.
pub mod error;
/// The mutable story state.
pub mod state;

pub use character::Character;
pub use engine::{Answer, ChoicePrompt, Engine, EngineStatus, StepResult};
pub use error::RuntimeError;
pub use state::{SceneState, StateStore};
