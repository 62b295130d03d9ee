//! Chain analysis pipeline.
//!
//! Runs the resolver on every chain of every member and, for chains that do
//! not resolve, the reordering search and the guard analysis. The outcome of
//! each chain is condensed into a [`Verdict`] and rendered into diagnostics.

use crate::catalog::registry::SignatureCatalog;
use crate::catalog::signature::AttributeId;
use crate::core::config::ResolverOptions;
use crate::diagnostics::emitter::{Diagnostic, DiagnosticEmitter, SuggestedFix};
use crate::member::chain::Chain;
use crate::member::structure::Member;
use crate::resolution::guard::{GuardResult, NullGuardAnalyzer};
use crate::resolution::reorder::{ReorderResult, ReorderingSearch};
use crate::resolution::resolver::{ResolutionResult, TypeCompatibilityResolver};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// What should happen to a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// Resolves as declared
    Compatible,
    /// Resolves in another order of the same stages
    Reorderable { order: Vec<AttributeId> },
    /// Resolves once `guard` is inserted at `position`. When the guarded
    /// chain still has to be reordered, `then_order` is that order; it
    /// includes the guard.
    NeedsGuard {
        guard: AttributeId,
        position: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        then_order: Option<Vec<AttributeId>>,
    },
    /// No automatic fix
    Unresolvable { bound_exceeded: bool },
}

impl Verdict {
    /// Whether the chain resolves as declared.
    pub fn is_compatible(&self) -> bool {
        matches!(self, Verdict::Compatible)
    }
}

/// Full analysis of one chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainReport {
    pub member: String,
    /// The chain as declared
    pub chain: Chain,
    /// Resolution of the declared order
    pub resolution: ResolutionResult,
    /// Reordering search, run when the declared order fails
    pub reorder: Option<ReorderResult>,
    /// Guard analysis of the declared order
    pub guard: Option<GuardResult>,
    /// Guard analysis of the suggested order
    pub guard_after_reorder: Option<GuardResult>,
    /// Reordering search on the chain with a guard inserted at position 0,
    /// run when neither fix works alone
    pub guarded_reorder: Option<ReorderResult>,
    /// Attribute types used more than once in the chain
    pub duplicates: Vec<AttributeId>,
    pub verdict: Verdict,
    /// The chain with the suggested fix applied
    pub fixed: Option<Chain>,
}

/// Analyzes chains against one catalog.
#[derive(Debug, Clone)]
pub struct ChainAnalyzer<'a> {
    catalog: &'a SignatureCatalog,
    options: ResolverOptions,
}

impl<'a> ChainAnalyzer<'a> {
    /// Create an analyzer.
    pub fn new(catalog: &'a SignatureCatalog, options: ResolverOptions) -> Self {
        Self { catalog, options }
    }

    /// The options in use.
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolver configured like this analyzer.
    pub fn resolver(&self) -> TypeCompatibilityResolver<'a> {
        TypeCompatibilityResolver::with_options(self.catalog, &self.options)
    }

    /// Analyze one chain of a member.
    pub fn analyze_chain(&self, member: &str, chain: Chain) -> ChainReport {
        let resolver = self.resolver();
        let resolution = resolver.resolve(&chain);
        let duplicates = chain.duplicate_attributes();

        let mut report = ChainReport {
            member: member.to_string(),
            chain,
            resolution,
            reorder: None,
            guard: None,
            guard_after_reorder: None,
            guarded_reorder: None,
            duplicates,
            verdict: Verdict::Compatible,
            fixed: None,
        };
        if report.resolution.compatible {
            return report;
        }

        let search = ReorderingSearch::new(resolver, &self.options);
        let guards = NullGuardAnalyzer::new(resolver);
        let chain = &report.chain;

        let reorder = search.search(chain);
        let guard = self.options.suggest_guards.then(|| guards.analyze(chain));

        if let (Some(order), Some(indices)) = (&reorder.suggested_order, &reorder.suggested_indices) {
            let fixed = chain.reordered(indices);
            report.guard_after_reorder = self.options.suggest_guards.then(|| guards.analyze(&fixed));
            report.verdict = Verdict::Reorderable { order: order.clone() };
            report.fixed = Some(fixed);
        } else if let Some((guard_id, position)) = guard.as_ref().and_then(resolving_guard) {
            report.fixed = self
                .catalog
                .get(guard_id)
                .map(|entry| chain.with_guard_at(position, entry));
            report.verdict = Verdict::NeedsGuard {
                guard: guard_id,
                position,
                then_order: None,
            };
        } else if let Some((guard_id, guarded, combined)) = self.reorder_behind_guard(chain, &reorder, &search) {
            report.fixed = combined
                .suggested_indices
                .as_ref()
                .map(|indices| guarded.reordered(indices));
            report.verdict = Verdict::NeedsGuard {
                guard: guard_id,
                position: 0,
                then_order: combined.suggested_order.clone(),
            };
            report.guarded_reorder = Some(combined);
        } else {
            report.verdict = Verdict::Unresolvable {
                bound_exceeded: reorder.bound_exceeded(),
            };
        }

        log::debug!(
            "Member '{}' chain '{}': {:?}",
            report.member,
            report.chain.name,
            report.verdict
        );
        report.reorder = Some(reorder);
        report.guard = guard;
        report
    }

    /// Search again with a guard pinned in front of a nullable member's chain.
    ///
    /// Covers chains that need both fixes: no order works on the nullable
    /// flow, and the guard alone does not fix the declared order.
    fn reorder_behind_guard(
        &self,
        chain: &Chain,
        reorder: &ReorderResult,
        search: &ReorderingSearch<'_>,
    ) -> Option<(AttributeId, Chain, ReorderResult)> {
        if !self.options.suggest_guards
            || !chain.is_member_nullable()
            || reorder.bound_exceeded()
            || chain.stages.iter().any(|s| s.is_guard)
        {
            return None;
        }
        let guard = self.catalog.guard_attribute()?;
        let guarded = chain.with_guard_at(0, guard);
        let result = search.search(&guarded);
        result.found.then_some((guard.id, guarded, result))
    }

    /// Analyze every chain of a member, in order of first appearance.
    pub fn analyze_member(&self, member: &Member) -> Vec<ChainReport> {
        member
            .chains()
            .into_iter()
            .map(|chain| self.analyze_chain(&member.name, chain))
            .collect()
    }

    /// Analyze members, in parallel when enabled.
    ///
    /// Reports keep member order regardless of parallelism.
    pub fn analyze_members(&self, members: &[Member]) -> AnalysisReport {
        let start = Instant::now();

        let per_member: Vec<Vec<ChainReport>> = if self.options.parallel {
            members.par_iter().map(|m| self.analyze_member(m)).collect()
        } else {
            members.iter().map(|m| self.analyze_member(m)).collect()
        };

        let emitter = DiagnosticEmitter::new(self.catalog);
        let chains: Vec<ChainReport> = per_member.into_iter().flatten().collect();
        let diagnostics = chains.iter().flat_map(|r| emitter.emit(r)).collect();

        AnalysisReport {
            members: members.len(),
            chains,
            diagnostics,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

fn resolving_guard(guard: &GuardResult) -> Option<(AttributeId, usize)> {
    if !guard.needed || !guard.resolves_chain {
        return None;
    }
    Some((guard.guard?, guard.insert_at?))
}

/// Counts of chain verdicts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub compatible: usize,
    pub reorderable: usize,
    pub needs_guard: usize,
    pub unresolvable: usize,
}

/// Result of analyzing a set of members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Number of members analyzed
    pub members: usize,
    /// One report per chain, member order first
    pub chains: Vec<ChainReport>,
    pub diagnostics: Vec<Diagnostic>,
    /// Time taken in milliseconds
    pub duration_ms: u64,
}

impl AnalysisReport {
    /// Whether any error diagnostic was emitted.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    /// Tally verdicts.
    pub fn counts(&self) -> VerdictCounts {
        let mut counts = VerdictCounts::default();
        for report in &self.chains {
            match report.verdict {
                Verdict::Compatible => counts.compatible += 1,
                Verdict::Reorderable { .. } => counts.reorderable += 1,
                Verdict::NeedsGuard { .. } => counts.needs_guard += 1,
                Verdict::Unresolvable { .. } => counts.unresolvable += 1,
            }
        }
        counts
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        let counts = self.counts();
        if !self.has_errors() {
            return format!(
                "✓ {} chain(s) on {} member(s) resolve",
                self.chains.len(),
                self.members
            );
        }
        format!(
            "✗ {} diagnostic(s): {} reorderable, {} need a guard, {} unresolvable ({} of {} chain(s) resolve)",
            self.diagnostics.len(),
            counts.reorderable,
            counts.needs_guard,
            counts.unresolvable,
            counts.compatible,
            self.chains.len()
        )
    }

    /// Get numbered diagnostic lines with suggested fixes.
    pub fn detailed_diagnostics(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .enumerate()
            .map(|(i, diagnostic)| {
                let mut msg = format!("{}. {}", i + 1, diagnostic);
                for fix in &diagnostic.fixes {
                    msg.push_str(&format!("\n   → Fix: {}", describe_fix(fix)));
                }
                msg
            })
            .collect()
    }
}

fn describe_fix(fix: &SuggestedFix) -> String {
    match fix {
        SuggestedFix::Reorder { order } => format!("reorder to {}", order.join(" -> ")),
        SuggestedFix::InsertGuard { attribute, position } => {
            format!("insert {} at position {}", attribute, position)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::signature::AttributeDeclaration;
    use crate::core::types::{NumericKind, TypeRef};
    use crate::diagnostics::emitter::DiagnosticCode;
    use crate::member::chain::ChainKey;
    use crate::resolution::reorder::ReorderOutcome;

    fn int() -> TypeRef {
        TypeRef::numeric(NumericKind::Int)
    }

    fn catalog() -> SignatureCatalog {
        SignatureCatalog::from_declarations([
            AttributeDeclaration::new("A").transforms(TypeRef::Text, int()),
            AttributeDeclaration::new("B").validates(int()),
            AttributeDeclaration::new("Flag").validates(TypeRef::Boolean),
            AttributeDeclaration::new("NotEmpty").validates(TypeRef::Text),
            AttributeDeclaration::new("NotNull").validates(TypeRef::Any).as_guard(),
        ])
        .unwrap()
    }

    fn member(catalog: &SignatureCatalog, name: &str, member_type: TypeRef, attrs: &[&str]) -> Member {
        attrs.iter().fold(Member::new(name, member_type), |m, a| {
            m.with_attribute(catalog.lookup(a).unwrap())
        })
    }

    fn analyze(catalog: &SignatureCatalog, member: &Member) -> ChainReport {
        ChainAnalyzer::new(catalog, ResolverOptions::default())
            .analyze_member(member)
            .remove(0)
    }

    #[test]
    fn test_compatible_chain_has_no_followups() {
        let catalog = catalog();
        let report = analyze(&catalog, &member(&catalog, "Age", TypeRef::Text, &["A", "B"]));
        assert!(report.verdict.is_compatible());
        assert!(report.reorder.is_none());
        assert!(report.fixed.is_none());
    }

    #[test]
    fn test_reorderable() {
        let catalog = catalog();
        let report = analyze(&catalog, &member(&catalog, "Age", TypeRef::Text, &["B", "A"]));
        let a = catalog.id_of("A").unwrap();
        let b = catalog.id_of("B").unwrap();
        assert_eq!(
            report.verdict,
            Verdict::Reorderable { order: vec![a, b] }
        );
        assert!(report.guard_after_reorder.as_ref().is_some_and(|g| !g.needed));
        assert_eq!(report.fixed.unwrap().attribute_ids(), vec![a, b]);
    }

    #[test]
    fn test_needs_guard() {
        let catalog = catalog();
        let report = analyze(&catalog, &member(&catalog, "Email", TypeRef::Text.nullable(), &["NotEmpty"]));
        assert_eq!(
            report.verdict,
            Verdict::NeedsGuard {
                guard: catalog.id_of("NotNull").unwrap(),
                position: 0,
                then_order: None
            }
        );
        assert!(report.guarded_reorder.is_none());
    }

    #[test]
    fn test_guard_and_reorder_combined() {
        let catalog = catalog();
        let report = analyze(&catalog, &member(&catalog, "Age", TypeRef::Text.nullable(), &["B", "A"]));
        let id = |n: &str| catalog.id_of(n).unwrap();
        let guarded_order = vec![id("NotNull"), id("A"), id("B")];
        assert_eq!(
            report.verdict,
            Verdict::NeedsGuard {
                guard: id("NotNull"),
                position: 0,
                then_order: Some(guarded_order.clone())
            }
        );

        // The search on the declared stages never adds the guard
        let reorder = report.reorder.as_ref().unwrap();
        assert!(!reorder.found);
        assert!(reorder.suggested_order.is_none());
        assert_eq!(report.guarded_reorder.as_ref().unwrap().suggested_order, Some(guarded_order.clone()));

        let fixed = report.fixed.clone().unwrap();
        assert_eq!(fixed.attribute_ids(), guarded_order);

        let diagnostics = DiagnosticEmitter::new(&catalog).emit(&report);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::NeedsGuard);
        assert_eq!(
            diagnostics[0].message,
            "Validation for member 'Age' is incompatible due to null types. Add NotNull attribute at position 0."
        );
        assert_eq!(
            diagnostics[0].fixes,
            vec![
                SuggestedFix::InsertGuard {
                    attribute: "NotNull".to_string(),
                    position: 0
                },
                SuggestedFix::Reorder {
                    order: vec!["NotNull".to_string(), "A".to_string(), "B".to_string()]
                },
            ]
        );
    }

    #[test]
    fn test_unresolvable() {
        let catalog = catalog();
        let report = analyze(&catalog, &member(&catalog, "Age", TypeRef::Text, &["A", "Flag"]));
        assert_eq!(report.verdict, Verdict::Unresolvable { bound_exceeded: false });
        assert!(report.fixed.is_none());
        assert_eq!(report.resolution.failure_index, Some(1));
    }

    #[test]
    fn test_cap_above_ceiling_reports_bound_exceeded() {
        let catalog = catalog();
        let analyzer = ChainAnalyzer::new(&catalog, ResolverOptions::new().with_max_permutable_stages(40));
        let names = vec!["B"; 33];
        let report = analyzer.analyze_members(&[member(&catalog, "Wide", TypeRef::Text, &names)]);

        assert_eq!(report.chains[0].verdict, Verdict::Unresolvable { bound_exceeded: true });
        assert_eq!(
            report.chains[0].reorder.as_ref().unwrap().outcome,
            ReorderOutcome::SearchBoundExceeded { stages: 33, cap: 16 }
        );
        assert!(report.diagnostics.iter().any(|d| d.message.ends_with("33 exceed the limit of 16)")));
    }

    #[test]
    fn test_guard_suggestions_disabled() {
        let catalog = catalog();
        let analyzer = ChainAnalyzer::new(&catalog, ResolverOptions::new().with_guard_suggestions(false));
        let report = analyzer
            .analyze_member(&member(&catalog, "Email", TypeRef::Text.nullable(), &["NotEmpty"]))
            .remove(0);
        assert_eq!(report.verdict, Verdict::Unresolvable { bound_exceeded: false });
        assert!(report.guard.is_none());
    }

    #[test]
    fn test_analyze_members_keeps_order() {
        let catalog = catalog();
        let members: Vec<Member> = (0..32)
            .map(|i| {
                let attrs: &[&str] = if i % 2 == 0 { &["A", "B"] } else { &["B", "A"] };
                member(&catalog, &format!("M{}", i), TypeRef::Text, attrs)
            })
            .collect();

        for parallel in [true, false] {
            let analyzer = ChainAnalyzer::new(&catalog, ResolverOptions::new().with_parallel(parallel));
            let report = analyzer.analyze_members(&members);
            let names: Vec<_> = report.chains.iter().map(|c| c.member.clone()).collect();
            let expected: Vec<_> = (0..32).map(|i| format!("M{}", i)).collect();
            assert_eq!(names, expected);
            assert_eq!(report.counts().reorderable, 16);
            assert_eq!(report.diagnostics.len(), 16);
            assert!(report.has_errors());
            assert!(report.summary().contains("16 reorderable"));
        }
    }

    #[test]
    fn test_duplicate_reported_once_per_chain() {
        let catalog = catalog();
        let b = catalog.lookup("B").unwrap();
        let m = Member::new("Count", int())
            .with_attribute(b)
            .with_attribute(b)
            .with_attribute(b)
            .with_attribute_in(b, ChainKey::named("other"));

        let report = ChainAnalyzer::new(&catalog, ResolverOptions::default()).analyze_members(&[m]);
        let duplicates: Vec<_> = report
            .diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::DuplicateAttribute)
            .collect();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].chain, ChainKey::Default);
    }

    #[test]
    fn test_detailed_diagnostics_list_fixes() {
        let catalog = catalog();
        let analyzer = ChainAnalyzer::new(&catalog, ResolverOptions::default());
        let report = analyzer.analyze_members(&[member(&catalog, "Age", TypeRef::Text, &["B", "A"])]);
        let lines = report.detailed_diagnostics();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("1. error[EASY010]"));
        assert!(lines[0].contains("→ Fix: reorder to A -> B"));
    }
}
