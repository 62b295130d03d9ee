//! Linear type resolution of one chain in its current order.
//!
//! The resolver threads a flow type through the stages: it starts at the
//! member type (nullable members start nullable), and every stage picks the
//! signature that accepts the current flow type and replaces it with the
//! signature's output. The first stage with no accepting signature stops
//! the walk.

use crate::catalog::registry::SignatureCatalog;
use crate::catalog::signature::{Accepted, AttributeId};
use crate::core::config::ResolverOptions;
use crate::core::types::TypeRef;
use crate::member::chain::{Chain, StageUsage};
use serde::{Deserialize, Serialize};

/// Why a chain failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionFailure {
    /// No signature of the stage accepts the flow type
    StageRejected {
        index: usize,
        attribute: AttributeId,
        found: TypeRef,
    },
    /// The final flow type cannot be assigned back to the member
    ResultNotAssignable { result: TypeRef, member: TypeRef },
}

/// Outcome of resolving one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub compatible: bool,
    /// Stage index of the failure; equal to the chain length when only the
    /// assignment-back check failed
    pub failure_index: Option<usize>,
    /// Flow types computed so far, starting with the member type.
    /// On success this has one entry more than the chain has stages.
    pub flow_trace: Vec<TypeRef>,
    /// Selected signature index for each stage that was accepted
    pub selected: Vec<usize>,
    pub failure: Option<ResolutionFailure>,
}

impl ResolutionResult {
    /// Flow type after the last accepted stage.
    pub fn final_type(&self) -> Option<&TypeRef> {
        self.flow_trace.last()
    }
}

/// Resolves chains against a catalog.
#[derive(Debug, Clone, Copy)]
pub struct TypeCompatibilityResolver<'a> {
    catalog: &'a SignatureCatalog,
    require_assignable_result: bool,
}

impl<'a> TypeCompatibilityResolver<'a> {
    /// Create a resolver with default options.
    pub fn new(catalog: &'a SignatureCatalog) -> Self {
        Self::with_options(catalog, &ResolverOptions::default())
    }

    /// Create a resolver honoring `options`.
    pub fn with_options(catalog: &'a SignatureCatalog, options: &ResolverOptions) -> Self {
        Self {
            catalog,
            require_assignable_result: options.require_assignable_result,
        }
    }

    /// The catalog this resolver reads.
    pub fn catalog(&self) -> &'a SignatureCatalog {
        self.catalog
    }

    /// Try one stage against a flow type.
    ///
    /// Stages whose attribute is missing from the catalog accept nothing.
    pub fn step(&self, stage: &StageUsage, current: &TypeRef) -> Option<Accepted> {
        self.catalog.get(stage.attribute)?.accept(current)
    }

    /// Check the assignment-back rule for a final flow type, if enabled.
    pub fn result_assignable(&self, result: &TypeRef, member: &TypeRef) -> bool {
        !self.require_assignable_result || result.assignable_to(member)
    }

    /// Resolve a chain in its current stage order.
    pub fn resolve(&self, chain: &Chain) -> ResolutionResult {
        let mut current = chain.member_type.clone();
        let mut flow_trace = Vec::with_capacity(chain.len() + 1);
        let mut selected = Vec::with_capacity(chain.len());
        flow_trace.push(current.clone());

        for (index, stage) in chain.stages.iter().enumerate() {
            match self.step(stage, &current) {
                Some(accepted) => {
                    selected.push(accepted.signature);
                    current = accepted.output;
                    flow_trace.push(current.clone());
                }
                None => {
                    log::debug!(
                        "Stage {} ({}) rejects {} in chain '{}'",
                        index,
                        self.catalog.short_name(stage.attribute),
                        current,
                        chain.name
                    );
                    return ResolutionResult {
                        compatible: false,
                        failure_index: Some(index),
                        flow_trace,
                        selected,
                        failure: Some(ResolutionFailure::StageRejected {
                            index,
                            attribute: stage.attribute,
                            found: current,
                        }),
                    };
                }
            }
        }

        if !self.result_assignable(&current, &chain.member_type) {
            log::debug!(
                "Chain '{}' ends on {} which is not assignable to {}",
                chain.name,
                current,
                chain.member_type
            );
            return ResolutionResult {
                compatible: false,
                failure_index: Some(chain.len()),
                flow_trace,
                selected,
                failure: Some(ResolutionFailure::ResultNotAssignable {
                    result: current,
                    member: chain.member_type.clone(),
                }),
            };
        }

        ResolutionResult {
            compatible: true,
            failure_index: None,
            flow_trace,
            selected,
            failure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::signature::AttributeDeclaration;
    use crate::core::types::NumericKind;
    use crate::member::structure::Member;

    fn int() -> TypeRef {
        TypeRef::numeric(NumericKind::Int)
    }

    fn catalog() -> SignatureCatalog {
        SignatureCatalog::from_declarations([
            AttributeDeclaration::new("ParseInt").transforms(TypeRef::Text, int()),
            AttributeDeclaration::new("Flag").validates(TypeRef::Boolean),
            AttributeDeclaration::new("NotEmpty").validates(TypeRef::Text),
            AttributeDeclaration::new("AtMost").validates(TypeRef::numeric(NumericKind::Long)),
            AttributeDeclaration::new("NotNull").validates(TypeRef::Any).as_guard(),
        ])
        .unwrap()
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

    #[test]
    fn test_compatible_trace() {
        let catalog = catalog();
        let resolver = TypeCompatibilityResolver::new(&catalog);
        let result = resolver.resolve(&chain(&catalog, TypeRef::Text, &["NotEmpty", "ParseInt", "AtMost"]));

        assert!(result.compatible);
        assert_eq!(result.failure_index, None);
        assert_eq!(result.flow_trace, vec![TypeRef::Text, TypeRef::Text, int(), int()]);
        assert_eq!(result.final_type(), Some(&int()));
    }

    #[test]
    fn test_failure_stops_walk() {
        let catalog = catalog();
        let resolver = TypeCompatibilityResolver::new(&catalog);
        let result = resolver.resolve(&chain(&catalog, TypeRef::Text, &["ParseInt", "Flag", "AtMost"]));

        assert!(!result.compatible);
        assert_eq!(result.failure_index, Some(1));
        assert_eq!(result.flow_trace, vec![TypeRef::Text, int()]);
        assert!(matches!(
            result.failure,
            Some(ResolutionFailure::StageRejected { index: 1, ref found, .. }) if *found == int()
        ));
    }

    #[test]
    fn test_nullable_member_needs_guard() {
        let catalog = catalog();
        let resolver = TypeCompatibilityResolver::new(&catalog);

        let unguarded = resolver.resolve(&chain(&catalog, TypeRef::Text.nullable(), &["NotEmpty"]));
        assert_eq!(unguarded.failure_index, Some(0));

        let guarded = resolver.resolve(&chain(&catalog, TypeRef::Text.nullable(), &["NotNull", "NotEmpty"]));
        assert!(guarded.compatible);
        assert_eq!(guarded.flow_trace[1], TypeRef::Text);
    }

    #[test]
    fn test_assignment_back_is_opt_in() {
        let catalog = catalog();
        let c = chain(&catalog, TypeRef::Text, &["ParseInt"]);

        assert!(TypeCompatibilityResolver::new(&catalog).resolve(&c).compatible);

        let strict = ResolverOptions::new().with_assignable_result(true);
        let result = TypeCompatibilityResolver::with_options(&catalog, &strict).resolve(&c);
        assert!(!result.compatible);
        assert_eq!(result.failure_index, Some(1));
        assert_eq!(result.flow_trace.len(), 2);
    }

    #[test]
    fn test_empty_chain_is_compatible() {
        let catalog = catalog();
        let empty = Chain::new(Default::default(), TypeRef::Text);
        let result = TypeCompatibilityResolver::new(&catalog).resolve(&empty);
        assert!(result.compatible);
        assert_eq!(result.flow_trace.len(), 1);
    }
}
