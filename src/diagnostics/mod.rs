//! Diagnostics for external tooling.

pub mod emitter;

pub use emitter::{Diagnostic, DiagnosticCode, DiagnosticEmitter, Severity, SuggestedFix};
