//! Diagnostics shared by the parser, the resolver and the writers.
//!
//! Each pass keeps its own [`Diagnostics`] list and exposes it through the
//! `has_error()` / `error()` pair. Rendering for humans goes through
//! `ariadne`, with the source text supplied by the caller.

use std::fmt;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use yansi::Paint;

use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub message: String,
    /// Name of the diagnostic rule that produced this entry, if any.
    pub rule: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, span: Span, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            span,
            message: message.into(),
            rule: None,
        }
    }

    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, span, message)
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.begin.is_known() {
            write!(f, "{}: {}", self.span.begin, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    list: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.list.push(diagnostic);
    }

    pub fn add_error(&mut self, span: Span, message: impl Into<String>) {
        self.push(Diagnostic::error(span, message));
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.list.extend(other.list);
    }

    pub fn has_error(&self) -> bool {
        self.list.iter().any(|d| d.severity == Severity::Error)
    }

    /// All errors, one per line, formatted `<line>:<column>: <message>`.
    pub fn error(&self) -> String {
        self.errors()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.list.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.list.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Renders every diagnostic as an annotated report against `source`.
    pub fn report(&self, file: &str, source: &str, color: bool) -> String {
        let mut out = Vec::new();
        for diagnostic in &self.list {
            let kind = match diagnostic.severity {
                Severity::Error => ReportKind::Error,
                Severity::Warning => ReportKind::Warning,
                Severity::Note => ReportKind::Advice,
            };
            let label_color = match diagnostic.severity {
                Severity::Error => Color::Red,
                Severity::Warning => Color::Yellow,
                Severity::Note => Color::Blue,
            };
            let span = (file.to_string(), diagnostic.span.range.clone());
            let mut report = Report::build(kind, span.clone())
                .with_config(Config::default().with_color(color))
                .with_message(&diagnostic.message)
                .with_label(
                    Label::new(span)
                        .with_message(&diagnostic.message)
                        .with_color(label_color),
                );
            if let Some(rule) = &diagnostic.rule {
                let rule = if color {
                    rule.yellow().bold().to_string()
                } else {
                    rule.clone()
                };
                report = report.with_note(format!(
                    "this diagnostic is controlled by the '{}' rule",
                    rule
                ));
            }
            let cache = (file.to_string(), Source::from(source.to_string()));
            if report.finish().write(cache, &mut out).is_err() {
                out.extend_from_slice(diagnostic.to_string().as_bytes());
                out.push(b'\n');
            }
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.list.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}
