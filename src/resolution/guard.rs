//! Detection of missing null guards.

use crate::catalog::signature::AttributeId;
use crate::member::chain::Chain;
use crate::resolution::resolver::TypeCompatibilityResolver;
use serde::{Deserialize, Serialize};

/// Result of a guard analysis.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GuardResult {
    pub needed: bool,
    /// Position the guard should be inserted at
    pub insert_at: Option<usize>,
    /// Guard the catalog offers for the insertion, if it has one
    pub guard: Option<AttributeId>,
    /// Whether the chain resolves once the guard is inserted
    pub resolves_chain: bool,
}

impl GuardResult {
    fn not_needed() -> Self {
        Self::default()
    }
}

/// Finds the first place where a nullable flow reaches a stage that only
/// takes the non-nullable form.
#[derive(Debug, Clone, Copy)]
pub struct NullGuardAnalyzer<'a> {
    resolver: TypeCompatibilityResolver<'a>,
}

impl<'a> NullGuardAnalyzer<'a> {
    /// Create an analyzer sharing the resolver's catalog and options.
    pub fn new(resolver: TypeCompatibilityResolver<'a>) -> Self {
        Self { resolver }
    }

    /// Analyze a chain in its current order.
    ///
    /// Walks the chain like the resolver does. The gap is the first stage
    /// that rejects a nullable flow type but would accept its non-nullable
    /// form. Nothing is reported for non-nullable members, after a guard
    /// stage has run, or when the walk fails for a reason unrelated to null.
    pub fn analyze(&self, chain: &Chain) -> GuardResult {
        if !chain.is_member_nullable() {
            return GuardResult::not_needed();
        }

        let mut current = chain.member_type.clone();
        for (index, stage) in chain.stages.iter().enumerate() {
            if stage.is_guard {
                return GuardResult::not_needed();
            }
            if let Some(accepted) = self.resolver.step(stage, &current) {
                current = accepted.output;
                continue;
            }
            if current.is_nullable() && self.resolver.step(stage, current.non_null()).is_some() {
                return self.gap_at(chain, index);
            }
            return GuardResult::not_needed();
        }
        GuardResult::not_needed()
    }

    fn gap_at(&self, chain: &Chain, index: usize) -> GuardResult {
        let guard = self.resolver.catalog().guard_attribute();
        let resolves_chain = guard
            .map(|g| self.resolver.resolve(&chain.with_guard_at(index, g)).compatible)
            .unwrap_or(false);

        log::debug!(
            "Chain '{}' needs a null guard at position {} (resolves: {})",
            chain.name,
            index,
            resolves_chain
        );
        GuardResult {
            needed: true,
            insert_at: Some(index),
            guard: guard.map(|g| g.id),
            resolves_chain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::registry::SignatureCatalog;
    use crate::catalog::signature::AttributeDeclaration;
    use crate::core::types::{NumericKind, TypeRef};
    use crate::member::structure::Member;

    fn catalog(with_guard: bool) -> SignatureCatalog {
        let mut declarations = vec![
            AttributeDeclaration::new("NotEmpty").validates(TypeRef::Text),
            AttributeDeclaration::new("Anything").validates(TypeRef::Any),
            AttributeDeclaration::new("ParseInt").transforms(TypeRef::Text, TypeRef::numeric(NumericKind::Int)),
            AttributeDeclaration::new("Flag").validates(TypeRef::Boolean),
        ];
        if with_guard {
            declarations.push(AttributeDeclaration::new("NotNull").validates(TypeRef::Any).as_guard());
        }
        SignatureCatalog::from_declarations(declarations).unwrap()
    }

    fn chain(catalog: &SignatureCatalog, member_type: TypeRef, names: &[&str]) -> Chain {
        names
            .iter()
            .fold(Member::new("M", member_type), |m, name| {
                m.with_attribute(catalog.lookup(name).unwrap())
            })
            .chains()
            .remove(0)
    }

    fn analyze(catalog: &SignatureCatalog, chain: &Chain) -> GuardResult {
        NullGuardAnalyzer::new(TypeCompatibilityResolver::new(catalog)).analyze(chain)
    }

    #[test]
    fn test_gap_at_first_stage() {
        let catalog = catalog(true);
        let result = analyze(&catalog, &chain(&catalog, TypeRef::Text.nullable(), &["NotEmpty"]));
        assert!(result.needed);
        assert_eq!(result.insert_at, Some(0));
        assert_eq!(result.guard, catalog.id_of("NotNull"));
        assert!(result.resolves_chain);
    }

    #[test]
    fn test_gap_after_nullable_tolerant_stage() {
        let catalog = catalog(true);
        let result = analyze(&catalog, &chain(&catalog, TypeRef::Text.nullable(), &["Anything", "NotEmpty", "ParseInt"]));
        assert_eq!(result.insert_at, Some(1));
        assert!(result.resolves_chain);
    }

    #[test]
    fn test_not_needed_for_plain_member() {
        let catalog = catalog(true);
        assert!(!analyze(&catalog, &chain(&catalog, TypeRef::Text, &["Flag"])).needed);
    }

    #[test]
    fn test_existing_guard_suppresses() {
        let catalog = catalog(true);
        let guarded = chain(&catalog, TypeRef::Text.nullable(), &["NotNull", "NotEmpty"]);
        assert!(!analyze(&catalog, &guarded).needed);
    }

    #[test]
    fn test_unrelated_failure_is_not_a_gap() {
        let catalog = catalog(true);
        let result = analyze(&catalog, &chain(&catalog, TypeRef::Text.nullable(), &["Flag", "NotEmpty"]));
        assert!(!result.needed);
    }

    #[test]
    fn test_guard_that_does_not_resolve() {
        let catalog = catalog(true);
        let result = analyze(&catalog, &chain(&catalog, TypeRef::Text.nullable(), &["NotEmpty", "Flag"]));
        assert!(result.needed);
        assert!(!result.resolves_chain);
    }

    #[test]
    fn test_catalog_without_guard() {
        let catalog = catalog(false);
        let result = analyze(&catalog, &chain(&catalog, TypeRef::Text.nullable(), &["NotEmpty"]));
        assert!(result.needed);
        assert_eq!(result.guard, None);
        assert!(!result.resolves_chain);
    }
}
