//! Rendering of analysis outcomes into diagnostics.
//!
//! Message texts are a stable interface: code-fix tooling matches on them.

use crate::catalog::registry::SignatureCatalog;
use crate::catalog::signature::AttributeId;
use crate::core::error::CatalogError;
use crate::member::chain::ChainKey;
use crate::resolution::pipeline::{ChainReport, Verdict};
use crate::resolution::reorder::ReorderOutcome;
use crate::resolution::resolver::ResolutionFailure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable diagnostic identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Attribute type with empty or ambiguous signatures
    #[serde(rename = "EASY002")]
    MalformedAttribute,
    /// Same attribute type twice in one chain
    #[serde(rename = "EASY009")]
    DuplicateAttribute,
    #[serde(rename = "EASY010")]
    NeedsReorder,
    #[serde(rename = "EASY011")]
    NeedsGuard,
    /// Incompatible with no automatic fix
    #[serde(rename = "EASY012")]
    Incompatible,
}

impl DiagnosticCode {
    /// The code as shown to users.
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::MalformedAttribute => "EASY002",
            DiagnosticCode::DuplicateAttribute => "EASY009",
            DiagnosticCode::NeedsReorder => "EASY010",
            DiagnosticCode::NeedsGuard => "EASY011",
            DiagnosticCode::Incompatible => "EASY012",
        }
    }

    /// Short title.
    pub fn title(self) -> &'static str {
        match self {
            DiagnosticCode::MalformedAttribute => "Malformed attribute type",
            DiagnosticCode::DuplicateAttribute => "Duplicate attribute in chain",
            DiagnosticCode::NeedsReorder => "Validation chain can be reordered",
            DiagnosticCode::NeedsGuard => "Validation chain needs a null guard",
            DiagnosticCode::Incompatible => "Incompatible validation chain",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Machine-readable fix attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuggestedFix {
    /// Rewrite the chain's attributes in this order
    Reorder { order: Vec<String> },
    /// Insert a guard attribute before the stage at `position`
    InsertGuard { attribute: String, position: usize },
}

/// A single diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    /// Member the diagnostic is about; `None` for catalog diagnostics
    pub member: Option<String>,
    pub chain: ChainKey,
    pub message: String,
    /// Fixes in the order they apply
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<SuggestedFix>,
}

impl Diagnostic {
    fn error(code: DiagnosticCode, member: Option<&str>, chain: &ChainKey, message: String) -> Self {
        Self {
            code,
            severity: Severity::Error,
            member: member.map(str::to_string),
            chain: chain.clone(),
            message,
            fixes: Vec::new(),
        }
    }

    fn with_fix(mut self, fix: SuggestedFix) -> Self {
        self.fixes.push(fix);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

// ============================================================================
// Message templates
// ============================================================================

/// EASY010 message.
pub fn reorder_message(chain: &ChainKey, member: &str, order: &[String]) -> String {
    format!(
        "{}Validation for member '{}' is incompatible but can be reordered. Suggested order: {}.",
        chain.label(),
        member,
        order.join(" -> ")
    )
}

/// EASY011 message.
pub fn guard_message(chain: &ChainKey, member: &str, guard: &str, position: usize) -> String {
    format!(
        "{}Validation for member '{}' is incompatible due to null types. Add {} attribute at position {}.",
        chain.label(),
        member,
        guard,
        position
    )
}

/// EASY012 message.
pub fn incompatible_message(chain: &ChainKey, member: &str, detail: &str) -> String {
    format!(
        "{}Validation for member '{}' has incompatible attribute types that cannot be resolved: {}",
        chain.label(),
        member,
        detail
    )
}

/// EASY009 message.
pub fn duplicate_message(chain: &ChainKey, member: &str, attribute: &str) -> String {
    format!(
        "Multiple validation attributes with the same chain name '{} with chain '{}'' found on member '{}'. Chain names must be unique within a member.",
        attribute, chain, member
    )
}

// ============================================================================
// Emitter
// ============================================================================

/// Maps chain reports to diagnostics, naming attributes by their short names.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticEmitter<'a> {
    catalog: &'a SignatureCatalog,
}

impl<'a> DiagnosticEmitter<'a> {
    /// Create an emitter reading names from `catalog`.
    pub fn new(catalog: &'a SignatureCatalog) -> Self {
        Self { catalog }
    }

    /// Diagnostics for one chain: at most one duplicate diagnostic and at
    /// most one compatibility diagnostic.
    pub fn emit(&self, report: &ChainReport) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let member = report.member.as_str();
        let chain = &report.chain.name;

        if let Some(&first) = report.duplicates.first() {
            diagnostics.push(Diagnostic::error(
                DiagnosticCode::DuplicateAttribute,
                Some(member),
                chain,
                duplicate_message(chain, member, self.catalog.short_name(first)),
            ));
        }

        match &report.verdict {
            Verdict::Compatible => {}
            Verdict::Reorderable { order } => {
                let names = self.names(order);
                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticCode::NeedsReorder,
                        Some(member),
                        chain,
                        reorder_message(chain, member, &names),
                    )
                    .with_fix(SuggestedFix::Reorder { order: names }),
                );
            }
            Verdict::NeedsGuard {
                guard,
                position,
                then_order,
            } => {
                let guard = self.catalog.short_name(*guard).to_string();
                let mut diagnostic = Diagnostic::error(
                    DiagnosticCode::NeedsGuard,
                    Some(member),
                    chain,
                    guard_message(chain, member, &guard, *position),
                )
                .with_fix(SuggestedFix::InsertGuard {
                    attribute: guard,
                    position: *position,
                });
                // Applies to the chain once the guard is in place
                if let Some(order) = then_order {
                    diagnostic = diagnostic.with_fix(SuggestedFix::Reorder {
                        order: self.names(order),
                    });
                }
                diagnostics.push(diagnostic);
            }
            Verdict::Unresolvable { bound_exceeded } => {
                let mut detail = self.failure_detail(report.resolution.failure.as_ref());
                if *bound_exceeded {
                    if let Some(reorder) = &report.reorder {
                        if let ReorderOutcome::SearchBoundExceeded { stages, cap } = reorder.outcome {
                            detail.push_str(&format!(
                                " (too many stages to search automatically: {} exceed the limit of {})",
                                stages, cap
                            ));
                        }
                    }
                }
                diagnostics.push(Diagnostic::error(
                    DiagnosticCode::Incompatible,
                    Some(member),
                    chain,
                    incompatible_message(chain, member, &detail),
                ));
            }
        }

        diagnostics
    }

    /// One diagnostic per malformed attribute type.
    pub fn emit_catalog_errors(errors: &[CatalogError]) -> Vec<Diagnostic> {
        errors
            .iter()
            .map(|error| {
                Diagnostic::error(
                    DiagnosticCode::MalformedAttribute,
                    None,
                    &ChainKey::Default,
                    error.to_string(),
                )
            })
            .collect()
    }

    fn names(&self, ids: &[AttributeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| self.catalog.short_name(id).to_string())
            .collect()
    }

    fn failure_detail(&self, failure: Option<&ResolutionFailure>) -> String {
        match failure {
            Some(ResolutionFailure::StageRejected { attribute, found, .. }) => {
                let expected = self
                    .catalog
                    .get(*attribute)
                    .map(|e| e.input_names().join(", "))
                    .unwrap_or_default();
                format!(
                    "{} expects one of [{}] but got {}",
                    self.catalog.short_name(*attribute),
                    expected,
                    found
                )
            }
            Some(ResolutionFailure::ResultNotAssignable { result, member }) => {
                format!("chain result {} is not assignable to member type {}", result, member)
            }
            None => "no compatible order exists".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reorder_template() {
        let order = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(
            reorder_message(&ChainKey::named("chainName"), "X", &order),
            "(chainName) Validation for member 'X' is incompatible but can be reordered. Suggested order: A -> B -> C."
        );
        assert_eq!(
            reorder_message(&ChainKey::Default, "X", &order),
            "Validation for member 'X' is incompatible but can be reordered. Suggested order: A -> B -> C."
        );
    }

    #[test]
    fn test_guard_template() {
        assert_eq!(
            guard_message(&ChainKey::named("c"), "Email", "NotNull", 0),
            "(c) Validation for member 'Email' is incompatible due to null types. Add NotNull attribute at position 0."
        );
    }

    #[test]
    fn test_empty_chain_name_distinct_from_default() {
        let empty = duplicate_message(&ChainKey::named(""), "X", "Range");
        let default = duplicate_message(&ChainKey::Default, "X", "Range");
        assert!(empty.contains("'Range with chain '''"));
        assert!(default.contains("'Range with chain 'default''"));
        assert_ne!(
            incompatible_message(&ChainKey::named(""), "X", "d"),
            incompatible_message(&ChainKey::Default, "X", "d")
        );
    }

    #[test]
    fn test_code_serialization() {
        let json = serde_json::to_string(&DiagnosticCode::NeedsGuard).unwrap();
        assert_eq!(json, "\"EASY011\"");
        assert_eq!(DiagnosticCode::Incompatible.to_string(), "EASY012");
    }

    #[test]
    fn test_catalog_diagnostics() {
        let diagnostics = DiagnosticEmitter::emit_catalog_errors(&[CatalogError::EmptySignatures {
            attribute: "Broken".to_string(),
        }]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::MalformedAttribute);
        assert!(diagnostics[0].member.is_none());
        assert_eq!(
            diagnostics[0].to_string(),
            "error[EASY002]: attribute 'Broken' declares no signatures"
        );
    }
}
