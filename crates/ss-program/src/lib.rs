//! Instruction model and loader for compiled StoryScript programs.
//!
//! The compiled stream is a newline-delimited text format: label lines
//! (`identifier:`) and instruction lines (`command(args...)` with an
//! optional `-> target` branch suffix). The loader parses the whole stream,
//! builds a label table, and eagerly validates every branch target, so a
//! program either loads completely or fails with a [`ParseError`] before a
//! single instruction runs.

/// Pretty error rendering against source text.
pub mod diagnostics;
/// Load-time error types.
pub mod error;
/// The closed instruction set.
pub mod instruction;
/// Lexer for the stream format.
pub mod lexer;
/// Two-pass stream loader.
pub mod loader;
/// The loaded, validated program.
pub mod program;
/// The runtime value model.
pub mod value;

pub use error::{ParseError, ProgramResult};
pub use instruction::{Instruction, Operand, SwitchArm};
pub use loader::load;
pub use program::{LabelDef, Program};
pub use value::Value;
