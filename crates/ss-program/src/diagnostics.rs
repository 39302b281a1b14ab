//! Pretty rendering of load-time errors against the source text.

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::error::ParseError;

/// Render a parse error using ariadne for pretty terminal output.
///
/// `filename` is a display name only; the source text itself is passed in
/// because the loader never touches the filesystem.
pub fn render_parse_error(source: &str, filename: &str, error: &ParseError) -> String {
    let mut output = Vec::new();

    let span = (filename, error.span());
    let label = match error {
        ParseError::MalformedLine { reason, .. } => reason.clone(),
        ParseError::UnknownCommand { .. } => "not a known command".to_string(),
        ParseError::DuplicateLabel { .. } => "already declared".to_string(),
        ParseError::UnresolvedLabel { .. } => "no label with this name".to_string(),
    };

    Report::build(ReportKind::Error, span)
        .with_message(error.to_string())
        .with_label(
            Label::new((filename, error.span()))
                .with_message(label)
                .with_color(Color::Red),
        )
        .finish()
        .write((filename, Source::from(source)), &mut output)
        .ok();

    String::from_utf8(output).unwrap_or_default()
}
