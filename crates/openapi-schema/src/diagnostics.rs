//! Non-fatal conversion diagnostics.
//!
//! Nothing in the conversion core aborts a run. Conditions that degrade a tool (an unresolvable
//! `$ref`, an operation without `operationId`, an unsupported request body) are reported to a
//! [`DiagnosticSink`] and conversion continues.

use thiserror::Error;

/// One non-fatal conversion problem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A pointer that is missing from the document or not rooted at it.
    #[error("unresolved $ref '{pointer}' ({context})")]
    UnresolvedReference { pointer: String, context: String },

    /// A cycle through a pointer that has no `$defs` form, so it was cut with a raw pointer.
    #[error("cyclic $ref '{pointer}' cannot be expressed as a local definition")]
    CyclicReference { pointer: String },

    #[error("{method} {path} has no operationId; skipped")]
    MissingOperationId { method: String, path: String },

    #[error("{method} {path} is not a valid operation: {message}")]
    MalformedOperation {
        method: String,
        path: String,
        message: String,
    },

    /// The request body cannot be represented as flat tool arguments.
    #[error("{method} {path} request body is not supported ({detail})")]
    UnsupportedBody {
        method: String,
        path: String,
        detail: String,
    },

    #[error("tool '{tool}' declares argument '{name}' more than once; keeping the first")]
    ParameterCollision { tool: String, name: String },

    /// A local pointer survived into a tool schema without a matching definition.
    #[error("tool '{tool}' references '{name}' which has no definition")]
    DanglingDefinition { tool: String, name: String },
}

impl Diagnostic {
    /// Short machine-friendly kind, used as a structured log field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::UnresolvedReference { .. } => "unresolved_reference",
            Diagnostic::CyclicReference { .. } => "cyclic_reference",
            Diagnostic::MissingOperationId { .. } => "missing_operation_id",
            Diagnostic::MalformedOperation { .. } => "malformed_operation",
            Diagnostic::UnsupportedBody { .. } => "unsupported_body",
            Diagnostic::ParameterCollision { .. } => "parameter_collision",
            Diagnostic::DanglingDefinition { .. } => "dangling_definition",
        }
    }
}

/// Receiver for non-fatal diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Logs every diagnostic as a `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(kind = diagnostic.kind(), "{diagnostic}");
    }
}

/// Collects diagnostics in order (useful for callers that surface them later, and for tests).
impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}
