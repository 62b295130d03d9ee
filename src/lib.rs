//! # attrchain - Validation-chain type resolution
//!
//! attrchain checks ordered chains of validation attributes for type
//! compatibility. Each attribute type offers one or more signatures
//! (input type -> output type); a chain type-checks when a flow type,
//! starting at the member's declared type, can be threaded through every
//! stage in order.
//!
//! ## Features
//!
//! - **Linear resolution**: Full flow trace or the exact failure point
//! - **Reordering search**: Finds the order closest to the declared one that type-checks
//! - **Null guards**: Detects where a nullable member needs a `NotNull` before non-null stages
//! - **Stable diagnostics**: Fixed message templates and codes for code-fix tooling
//! - **Parallel analysis**: Members are analyzed concurrently against a shared, immutable catalog
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use attrchain::prelude::*;
//!
//! let catalog = SignatureCatalog::with_builtins();
//!
//! let member = Member::new("Email", "string?".parse()?)
//!     .with_attribute(catalog.lookup("NotEmpty").unwrap())
//!     .with_attribute(catalog.lookup("EmailAddress").unwrap());
//!
//! let analyzer = ChainAnalyzer::new(&catalog, ResolverOptions::default());
//! let report = analyzer.analyze_members(&[member]);
//!
//! for diagnostic in &report.diagnostics {
//!     println!("{}", diagnostic);
//! }
//! // error[EASY011]: Validation for member 'Email' is incompatible due to null types.
//! //                 Add NotNull attribute at position 0.
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Flow types, errors and configuration
//! - [`catalog`]: Signature catalog and built-in attribute declarations
//! - [`member`]: Members, chains and the JSON input format
//! - [`resolution`]: Resolver, reordering search, guard analysis and pipeline
//! - [`diagnostics`]: Diagnostic records and message templates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod core;
pub mod diagnostics;
pub mod member;
pub mod resolution;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use attrchain::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::config::{Config, ResolverOptions};
    pub use crate::core::error::{
        AttrChainError, AttrChainResult, CatalogError, ConfigError, InputError,
    };
    pub use crate::core::types::{NumericKind, TypeRef};

    // Catalog
    pub use crate::catalog::registry::{CatalogBuilder, SignatureCatalog};
    pub use crate::catalog::signature::{AttributeDeclaration, AttributeEntry, AttributeId, Signature};

    // Members
    pub use crate::member::chain::{Chain, ChainKey, StageUsage};
    pub use crate::member::serialization::SerializedInput;
    pub use crate::member::structure::Member;

    // Resolution
    pub use crate::resolution::guard::{GuardResult, NullGuardAnalyzer};
    pub use crate::resolution::pipeline::{AnalysisReport, ChainAnalyzer, ChainReport, Verdict};
    pub use crate::resolution::reorder::{ReorderOutcome, ReorderResult, ReorderingSearch};
    pub use crate::resolution::resolver::{ResolutionResult, TypeCompatibilityResolver};

    // Diagnostics
    pub use crate::diagnostics::emitter::{
        Diagnostic, DiagnosticCode, DiagnosticEmitter, Severity, SuggestedFix,
    };
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "attrchain");
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = SignatureCatalog::with_builtins();

        for name in ["NotNull", "NotEmpty", "Range", "Url", "MinLength", "FutureDate"] {
            assert!(catalog.lookup(name).is_some(), "missing built-in {}", name);
        }
    }

    #[test]
    fn test_end_to_end_with_builtins() {
        let catalog = SignatureCatalog::with_builtins();
        let lookup = |name: &str| catalog.lookup(name).unwrap();

        let members = vec![
            Member::new("Email", TypeRef::Text.nullable())
                .with_attribute(lookup("NotEmpty"))
                .with_attribute(lookup("EmailAddress")),
            Member::new("Score", TypeRef::Text)
                .with_attribute(lookup("Positive"))
                .with_attribute(lookup("Numeric")),
            Member::new("Homepage", TypeRef::Text)
                .with_attribute(lookup("NotEmpty"))
                .with_attribute(lookup("Url")),
        ];

        let report = ChainAnalyzer::new(&catalog, ResolverOptions::default()).analyze_members(&members);
        let codes: Vec<_> = report.diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![DiagnosticCode::NeedsGuard, DiagnosticCode::NeedsReorder]);
        assert_eq!(
            report.diagnostics[1].message,
            "Validation for member 'Score' is incompatible but can be reordered. Suggested order: Numeric -> Positive."
        );
    }
}
