use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range into the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    /// Span covering the whole of the given 1-based line.
    pub fn of_line(source: &str, line: usize) -> Self {
        let mut start = 0;
        for (index, text) in source.split_inclusive('\n').enumerate() {
            if index + 1 == line {
                let trimmed = text.trim_end_matches(['\n', '\r']).len();
                return Self::new(start, start + trimmed.max(1));
            }
            start += text.len();
        }
        Self::single(source.len())
    }
}

/// Every failure the interpreter can raise.
///
/// `WrongArgumentsNumber` never escapes a call site: the caller turns it
/// into `FunctionCall` carrying its own line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunError {
    #[error("Syntax error: {message} at line {line}")]
    Syntax {
        message: String,
        line: usize,
        span: Span,
        help: Option<String>,
    },

    #[error("Unknown identifier '{name}' at line {line}")]
    UnknownIdentifier { name: String, line: usize },

    #[error("Redefinition of '{name}' in the current scope at line {line}")]
    Redefinition { name: String, line: usize },

    #[error("Forbidden arithmetic operation at line {line}")]
    Arithmetic { line: usize },

    #[error("Wrong number of arguments in call to '{name}' at line {line}")]
    FunctionCall { name: String, line: usize },

    #[error("Wrong number of arguments: expected {expected}, found {found}")]
    WrongArgumentsNumber { expected: usize, found: usize },

    #[error("Evaluation was stopped")]
    Stopped,
}

impl FunError {
    pub fn syntax(line: usize, span: Span, message: impl Into<String>) -> Self {
        FunError::Syntax {
            message: message.into(),
            line,
            span,
            help: None,
        }
    }

    pub fn syntax_with_help(
        line: usize,
        span: Span,
        message: impl Into<String>,
        help: impl Into<String>,
    ) -> Self {
        FunError::Syntax {
            message: message.into(),
            line,
            span,
            help: Some(help.into()),
        }
    }

    /// Source line the error points at, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            FunError::Syntax { line, .. }
            | FunError::UnknownIdentifier { line, .. }
            | FunError::Redefinition { line, .. }
            | FunError::Arithmetic { line }
            | FunError::FunctionCall { line, .. } => Some(*line),
            FunError::WrongArgumentsNumber { .. } | FunError::Stopped => None,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            FunError::Syntax { .. } => "Syntax Error",
            FunError::UnknownIdentifier { .. } => "Unknown Identifier",
            FunError::Redefinition { .. } => "Redefinition Error",
            FunError::Arithmetic { .. } => "Arithmetic Error",
            FunError::FunctionCall { .. } | FunError::WrongArgumentsNumber { .. } => {
                "Function Call Error"
            }
            FunError::Stopped => "Stopped",
        }
    }

    fn label(&self) -> String {
        match self {
            FunError::Syntax { message, .. } => message.clone(),
            FunError::UnknownIdentifier { name, .. } => format!("'{}' is not defined", name),
            FunError::Redefinition { name, .. } => {
                format!("'{}' is already defined in this scope", name)
            }
            FunError::Arithmetic { .. } => "division or remainder by zero".to_string(),
            FunError::FunctionCall { name, .. } => {
                format!("'{}' called with the wrong number of arguments", name)
            }
            other => other.to_string(),
        }
    }

    /// Print an annotated diagnostic for this error to stderr.
    pub fn report(&self, source: &str, filename: Option<&str>) {
        let filename = filename.unwrap_or("<input>");

        let color = match self {
            FunError::Syntax { .. } => Color::Yellow,
            _ => Color::Magenta,
        };

        let span = match self {
            FunError::Syntax { span, .. } => span.clone(),
            other => match other.line() {
                Some(line) => Span::of_line(source, line),
                None => Span::single(0),
            },
        };

        let mut report_builder = Report::build(ReportKind::Error, filename, span.start)
            .with_message(format!("{}: {}", self.title().fg(color), self))
            .with_label(
                Label::new((filename, span.start..span.end))
                    .with_message(self.label())
                    .with_color(color),
            );

        if let FunError::Syntax {
            help: Some(help_text),
            ..
        } = self
        {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        if let Err(error) = report_builder
            .finish()
            .eprint((filename, Source::from(source)))
        {
            tracing::warn!(%error, "failed to print diagnostic");
        }
    }
}
