//! Error types for test expressions

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::diagnostics::OriginTrail;
use crate::expr::SyntaxError;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A test expression that could not be parsed
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot evaluate expression \"{expression}\": {message}{}", trail_suffix(.origin))]
pub struct ExpressionError {
    /// The expression as written in the template
    pub expression: String,
    pub message: String,
    /// Location of the fault within `expression`
    pub span: Span,
    pub expected: Vec<String>,
    pub origin: OriginTrail,
}

impl ExpressionError {
    pub(crate) fn syntax(expression: &str, err: SyntaxError) -> Self {
        Self {
            expression: expression.to_string(),
            message: err.message,
            span: err.span,
            expected: err.expected,
            origin: OriginTrail::default(),
        }
    }

    pub(crate) fn invalid(expression: &str, message: impl Into<String>) -> Self {
        Self {
            expression: expression.to_string(),
            message: message.into(),
            span: 0..expression.len(),
            expected: Vec::new(),
            origin: OriginTrail::default(),
        }
    }

    /// Attach the origin trail of the directive that holds the expression
    pub fn with_origin(mut self, origin: OriginTrail) -> Self {
        self.origin = origin;
        self
    }

    /// Format the error with the expression as source context using ariadne.
    ///
    /// The report is plain text; see [`ExpressionError::format_colored`] for
    /// terminal output.
    pub fn format(&self, filename: &str) -> String {
        self.report(filename, false)
    }

    /// Like [`ExpressionError::format`], with ANSI colors
    pub fn format_colored(&self, filename: &str) -> String {
        self.report(filename, true)
    }

    fn report(&self, filename: &str, color: bool) -> String {
        let mut buf = Vec::new();
        let expected_str = if self.expected.is_empty() {
            String::new()
        } else {
            format!("\nExpected: {}", self.expected.join(", "))
        };

        let end = self.span.end.min(self.expression.len());
        let span = self.span.start.min(end)..end;
        let mut report = Report::build(ReportKind::Error, filename, span.start)
            .with_config(
                Config::default()
                    .with_color(color)
                    .with_index_type(IndexType::Byte),
            )
            .with_message(&self.message)
            .with_label(
                Label::new((filename, span))
                    .with_message(format!("{}{}", self.message, expected_str))
                    .with_color(Color::Red),
            );
        if !self.origin.is_empty() {
            report = report.with_note(self.origin.to_string());
        }

        if report
            .finish()
            .write((filename, Source::from(self.expression.as_str())), &mut buf)
            .is_err()
        {
            return self.to_string();
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Origin trail appended to an error message, on its own lines
pub(crate) fn trail_suffix(origin: &OriginTrail) -> String {
    if origin.is_empty() {
        String::new()
    } else {
        format!("\n{}", origin)
    }
}
