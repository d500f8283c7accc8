//! Diagnostics collected alongside the parse tree.
//!
//! Parse and analysis findings are scope-local and non-fatal: the engine
//! records them here and keeps going. Only [`crate::error::FatalError`]
//! conditions abort a parse.

use std::fmt;

use crate::source::Span;

/// Classification of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagKind {
    /// No candidate statement kind matched; an opaque leaf was recorded.
    SyntaxMismatch,
    /// An end statement's name/label does not match its opener, or a block
    /// was still open at end of input. The block closes anyway.
    StructuralMismatch,
    /// A name was declared twice in one scope. The first declaration wins.
    Redeclaration,
    /// CONTAINS misuse or subprogram/declaration ordering violation.
    ScopeOrder,
    /// IMPLICIT NONE combined with explicit implicit ranges.
    ImplicitConflict,
}

impl DiagKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DiagKind::SyntaxMismatch => "syntax",
            DiagKind::StructuralMismatch => "structure",
            DiagKind::Redeclaration => "redeclaration",
            DiagKind::ScopeOrder => "scope-order",
            DiagKind::ImplicitConflict => "implicit-conflict",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One recorded finding, with the source span it refers to.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagKind,
    pub severity: Severity,
    pub span: Span,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sev = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(
            f,
            "{}: {} [{}]: {}",
            self.span,
            sev,
            self.kind.label(),
            self.message
        )
    }
}

/// Ordered list of diagnostics accumulated during parse and analysis.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, kind: DiagKind, span: Span, message: impl Into<String>) {
        self.items.push(Diagnostic {
            kind,
            severity: Severity::Warning,
            span,
            message: message.into(),
        });
    }

    pub fn error(&mut self, kind: DiagKind, span: Span, message: impl Into<String>) {
        self.items.push(Diagnostic {
            kind,
            severity: Severity::Error,
            span,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    /// Diagnostics of one kind, in recording order.
    pub fn of_kind(&self, kind: DiagKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
