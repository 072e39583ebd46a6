//! Structured problem reports produced by validation.
//!
//! A [`Diagnostic`] is plain data: it names the offending element, carries a
//! machine-readable [`DiagnosticCode`] and a human-readable message, and can be
//! serialized as-is for an editor to surface next to the block or connection.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// The broad family a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    /// Shape of the graph: entry, reachability, endpoints, arity, cycles.
    Structural,
    /// Block kinds, connector names and property values.
    Schema,
    /// Subsystem initialization order.
    Ordering,
    /// Cross-checks between the manifest and the graph.
    Manifest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    MissingEntry,
    DuplicateEntry,
    EntryHasIncoming,
    DuplicateBlockId,
    InvalidBlockId,
    UnreachableBlock,
    DanglingConnection,
    DuplicateConnection,
    ArityViolation,
    CycleDetected,
    PathWithoutExit,
    UnknownBlockKind,
    UnknownConnector,
    WrongConnectorDirection,
    MissingProperty,
    InvalidPropertyType,
    PropertyOutOfRange,
    UnknownProperty,
    InitDoesNotDominate,
    DuplicateInit,
    InvalidManifestField,
    MissingRequirement,
    /// The project could not be turned into a graph at all.
    AnalysisFailed,
}

impl DiagnosticCode {
    pub fn category(self) -> DiagnosticCategory {
        use DiagnosticCode::*;
        match self {
            MissingEntry | DuplicateEntry | EntryHasIncoming | DuplicateBlockId
            | InvalidBlockId | UnreachableBlock | DanglingConnection | DuplicateConnection | ArityViolation
            | CycleDetected | PathWithoutExit | AnalysisFailed => DiagnosticCategory::Structural,
            UnknownBlockKind | UnknownConnector | WrongConnectorDirection | MissingProperty
            | InvalidPropertyType | PropertyOutOfRange | UnknownProperty => {
                DiagnosticCategory::Schema
            }
            InitDoesNotDominate | DuplicateInit => DiagnosticCategory::Ordering,
            InvalidManifestField | MissingRequirement => DiagnosticCategory::Manifest,
        }
    }
}

/// The graph element a diagnostic points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementRef {
    Graph,
    Block {
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        property: Option<String>,
    },
    /// A connection, by its position in the project's connection list.
    Connection { index: usize },
    Manifest { field: String },
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementRef::Graph => write!(f, "graph"),
            ElementRef::Block { id, property: None } => write!(f, "block '{}'", id),
            ElementRef::Block {
                id,
                property: Some(property),
            } => write!(f, "block '{}' property '{}'", id, property),
            ElementRef::Connection { index } => write!(f, "connection #{}", index),
            ElementRef::Manifest { field } => write!(f, "manifest field '{}'", field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub category: DiagnosticCategory,
    pub code: DiagnosticCode,
    pub element: ElementRef,
    pub message: String,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, element: ElementRef, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category: code.category(),
            code,
            element,
            message: message.into(),
        }
    }

    pub fn warning(code: DiagnosticCode, element: ElementRef, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, element, message)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// The id of the offending block, when the diagnostic points at one.
    pub fn block_id(&self) -> Option<&str> {
        match &self.element {
            ElementRef::Block { id, .. } => Some(id),
            _ => None,
        }
    }

    /// The offending property name, when the diagnostic points at one.
    pub fn property(&self) -> Option<&str> {
        match &self.element {
            ElementRef::Block {
                property: Some(property),
                ..
            } => Some(property),
            _ => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}[{:?}] {}: {}", severity, self.code, self.element, self.message)
    }
}

/// Returns `true` when any diagnostic in the list is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}
