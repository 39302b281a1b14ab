//! Load-time error types.

use std::ops::Range;

use thiserror::Error;

/// Result type for loader operations.
pub type ProgramResult<T> = Result<T, ParseError>;

/// Errors that abort a load attempt.
///
/// A `ParseError` is fatal to the whole load: no instruction from a stream
/// that failed parsing or label resolution is ever executed. Every variant
/// carries the 1-based source line, the offending text, and a byte span for
/// diagnostic rendering.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// A line that is neither a valid label declaration nor a well-formed
    /// instruction.
    #[error("line {line}: malformed line `{text}`: {reason}")]
    MalformedLine {
        /// 1-based source line number.
        line: usize,
        /// The raw offending text.
        text: String,
        /// What was wrong with it.
        reason: String,
        /// Byte range in the source.
        span: Range<usize>,
    },

    /// An instruction name outside the closed command set.
    #[error("line {line}: unknown command `{command}`")]
    UnknownCommand {
        /// 1-based source line number.
        line: usize,
        /// The unrecognized command name.
        command: String,
        /// Byte range in the source.
        span: Range<usize>,
    },

    /// A label name declared more than once.
    #[error("line {line}: duplicate label `{label}`")]
    DuplicateLabel {
        /// 1-based source line number.
        line: usize,
        /// The re-declared label name.
        label: String,
        /// Byte range in the source.
        span: Range<usize>,
    },

    /// A branch target that no label declaration defines.
    #[error("line {line}: unresolved label `{label}`")]
    UnresolvedLabel {
        /// 1-based source line number of the referencing instruction.
        line: usize,
        /// The missing label name.
        label: String,
        /// Byte range in the source.
        span: Range<usize>,
    },
}

impl ParseError {
    /// The byte range of the offending source text.
    pub fn span(&self) -> Range<usize> {
        match self {
            ParseError::MalformedLine { span, .. }
            | ParseError::UnknownCommand { span, .. }
            | ParseError::DuplicateLabel { span, .. }
            | ParseError::UnresolvedLabel { span, .. } => span.clone(),
        }
    }

    /// The 1-based source line of the offending text.
    pub fn line(&self) -> usize {
        match self {
            ParseError::MalformedLine { line, .. }
            | ParseError::UnknownCommand { line, .. }
            | ParseError::DuplicateLabel { line, .. }
            | ParseError::UnresolvedLabel { line, .. } => *line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_line_and_text() {
        let err = ParseError::MalformedLine {
            line: 3,
            text: "narrate".into(),
            reason: "missing argument list".into(),
            span: 10..17,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("line 3"));
        assert!(rendered.contains("narrate"));
        assert!(rendered.contains("missing argument list"));
    }

    #[test]
    fn span_accessor() {
        let err = ParseError::UnknownCommand {
            line: 1,
            command: "frobnicate".into(),
            span: 0..10,
        };
        assert_eq!(err.span(), 0..10);
        assert_eq!(err.line(), 1);
    }
}
