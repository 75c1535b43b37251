//! Recovered problems noticed while building a dataset.
//!
//! A build does not abort on problems it can work around (a duplicate
//! component, a removal of a column that does not exist, a missing
//! bibliography). Those are recorded here and returned with the build
//! result, and are also emitted as `tracing` events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of problem or notable event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A component was already registered; registration was skipped.
    DuplicateComponent,
    /// A column requested for removal is not part of the component.
    MissingColumn,
    /// A column was removed from a component.
    RemovedColumn,
    /// A native table carries a column the component does not define.
    UndefinedColumn,
    /// A column was registered on a table.
    AddedColumn,
    /// No bibliography was supplied, or the bibliography file is missing.
    NoSources,
}

impl DiagnosticKind {
    /// Get a human-readable label for the diagnostic kind.
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::DuplicateComponent => "Duplicate Component",
            DiagnosticKind::MissingColumn => "Missing Column",
            DiagnosticKind::RemovedColumn => "Removed Column",
            DiagnosticKind::UndefinedColumn => "Undefined Column",
            DiagnosticKind::AddedColumn => "Added Column",
            DiagnosticKind::NoSources => "No Sources",
        }
    }
}

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only.
    Info,
    /// Potential issue that should be reviewed.
    Warning,
    /// Definite issue; the build worked around it.
    Error,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// A single recorded diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Kind of problem.
    #[serde(rename = "type")]
    pub kind: DiagnosticKind,
    /// Severity level.
    pub severity: Severity,
    /// Affected table handle or url.
    pub table: String,
    /// Affected column, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// When recorded.
    pub recorded_at: DateTime<Utc>,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(
        kind: DiagnosticKind,
        severity: Severity,
        table: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            table: table.into(),
            column: None,
            message: message.into(),
            recorded_at: Utc::now(),
        }
    }

    /// Set the affected column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

/// Collector threaded through one dataset build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and emit it as a tracing event.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Info => tracing::info!(
                target: "cldfkit",
                table = %diagnostic.table,
                column = ?diagnostic.column,
                "{}",
                diagnostic.message
            ),
            Severity::Warning => tracing::warn!(
                target: "cldfkit",
                table = %diagnostic.table,
                column = ?diagnostic.column,
                "{}",
                diagnostic.message
            ),
            Severity::Error => tracing::error!(
                target: "cldfkit",
                table = %diagnostic.table,
                column = ?diagnostic.column,
                "{}",
                diagnostic.message
            ),
        }
        self.entries.push(diagnostic);
    }

    /// Record an info-level diagnostic.
    pub fn info(
        &mut self,
        kind: DiagnosticKind,
        table: impl Into<String>,
        column: Option<&str>,
        message: impl Into<String>,
    ) {
        self.record(kind, Severity::Info, table, column, message);
    }

    /// Record a warning-level diagnostic.
    pub fn warn(
        &mut self,
        kind: DiagnosticKind,
        table: impl Into<String>,
        column: Option<&str>,
        message: impl Into<String>,
    ) {
        self.record(kind, Severity::Warning, table, column, message);
    }

    /// Record an error-level diagnostic.
    pub fn error(
        &mut self,
        kind: DiagnosticKind,
        table: impl Into<String>,
        column: Option<&str>,
        message: impl Into<String>,
    ) {
        self.record(kind, Severity::Error, table, column, message);
    }

    fn record(
        &mut self,
        kind: DiagnosticKind,
        severity: Severity,
        table: impl Into<String>,
        column: Option<&str>,
        message: impl Into<String>,
    ) {
        let mut diagnostic = Diagnostic::new(kind, severity, table, message);
        if let Some(column) = column {
            diagnostic = diagnostic.with_column(column);
        }
        self.push(diagnostic);
    }

    /// All recorded diagnostics, in recording order.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    /// Whether any diagnostic of the given kind touches `column`.
    pub fn has(&self, kind: DiagnosticKind, column: &str) -> bool {
        self.of_kind(kind)
            .any(|d| d.column.as_deref() == Some(column))
    }

    /// Number of diagnostics at the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|d| d.severity == severity).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_with_column() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn(
            DiagnosticKind::UndefinedColumn,
            "forms",
            Some("Arbitrary"),
            "Undefined column Arbitrary in data",
        );

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.has(DiagnosticKind::UndefinedColumn, "Arbitrary"));
        assert_eq!(diagnostics.count(Severity::Warning), 1);
        assert_eq!(diagnostics.entries()[0].table, "forms");
    }

    #[test]
    fn test_of_kind_filters() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.error(DiagnosticKind::NoSources, "sources", None, "No sources");
        diagnostics.info(DiagnosticKind::AddedColumn, "wordforms.csv", Some("Form"), "added");

        assert_eq!(diagnostics.of_kind(DiagnosticKind::NoSources).count(), 1);
        assert!(!diagnostics.has(DiagnosticKind::AddedColumn, "ID"));
        assert_eq!(diagnostics.count(Severity::Error), 1);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }
}
