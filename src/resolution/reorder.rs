//! Search for a stage order that type-checks.
//!
//! Depth-first backtracking over the non-pinned stages of a chain:
//! - Pinned stages stay at their declared positions; the search fills the
//!   other positions with the remaining stages.
//! - Candidates are tried in declared order, so the first order found is the
//!   lexicographically smallest one, the one closest to what was written.
//! - A branch is abandoned as soon as no unused stage accepts the flow type.
//! - Failed (position, used-set, flow type) states are remembered, so a dead suffix is
//!   explored once however many prefixes lead to it.
//! - Chains with more movable stages than the configured cap are not searched.

use crate::catalog::signature::AttributeId;
use crate::core::config::{ResolverOptions, MAX_PERMUTABLE_CEILING};
use crate::core::types::TypeRef;
use crate::member::chain::Chain;
use crate::resolution::resolver::TypeCompatibilityResolver;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a search ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReorderOutcome {
    /// A compatible order exists
    Found,
    /// Every order was ruled out
    Exhausted,
    /// Too many movable stages; nothing was searched
    SearchBoundExceeded { stages: usize, cap: usize },
    /// Fewer than two movable stages, so there is no other order to try
    NothingToPermute,
}

/// Result of a reordering search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderResult {
    pub found: bool,
    /// Attribute types in the suggested order
    pub suggested_order: Option<Vec<AttributeId>>,
    /// Suggested order as positions into the searched chain; feed to
    /// [`Chain::reordered`]
    pub suggested_indices: Option<Vec<usize>>,
    pub outcome: ReorderOutcome,
    /// Search nodes visited
    pub explored: usize,
}

impl ReorderResult {
    fn not_found(outcome: ReorderOutcome, explored: usize) -> Self {
        Self {
            found: false,
            suggested_order: None,
            suggested_indices: None,
            outcome,
            explored,
        }
    }

    /// Whether the search stopped at the permutation cap.
    pub fn bound_exceeded(&self) -> bool {
        matches!(self.outcome, ReorderOutcome::SearchBoundExceeded { .. })
    }
}

/// Reordering search over one chain at a time.
#[derive(Debug, Clone, Copy)]
pub struct ReorderingSearch<'a> {
    resolver: TypeCompatibilityResolver<'a>,
    max_permutable_stages: usize,
}

impl<'a> ReorderingSearch<'a> {
    /// Create a search using the resolver's catalog and the options' cap.
    ///
    /// Caps above [`MAX_PERMUTABLE_CEILING`] are clamped to it.
    pub fn new(resolver: TypeCompatibilityResolver<'a>, options: &ResolverOptions) -> Self {
        let requested = options.max_permutable_stages;
        if requested > MAX_PERMUTABLE_CEILING {
            log::warn!(
                "Permutation cap {} is above the ceiling of {}; using {}",
                requested,
                MAX_PERMUTABLE_CEILING,
                MAX_PERMUTABLE_CEILING
            );
        }
        Self {
            resolver,
            max_permutable_stages: requested.min(MAX_PERMUTABLE_CEILING),
        }
    }

    /// The permutation cap.
    pub fn cap(&self) -> usize {
        self.max_permutable_stages
    }

    /// Search for a compatible order of `chain`.
    pub fn search(&self, chain: &Chain) -> ReorderResult {
        let movable: Vec<usize> = (0..chain.len()).filter(|&i| !chain.stages[i].pinned).collect();

        if movable.len() > self.max_permutable_stages {
            log::warn!(
                "Chain '{}' has {} movable stages, above the search limit of {}",
                chain.name,
                movable.len(),
                self.max_permutable_stages
            );
            return ReorderResult::not_found(
                ReorderOutcome::SearchBoundExceeded {
                    stages: movable.len(),
                    cap: self.max_permutable_stages,
                },
                0,
            );
        }
        if movable.len() < 2 {
            return ReorderResult::not_found(ReorderOutcome::NothingToPermute, 0);
        }

        let mut state = SearchState {
            chain,
            movable: &movable,
            order: Vec::with_capacity(chain.len()),
            dead: HashSet::new(),
            explored: 0,
            pruned: 0,
        };
        let found = self.descend(&mut state, 0, chain.member_type.clone());

        log::trace!(
            "Reorder search on chain '{}': {} nodes explored, {} branches pruned, {} dead states",
            chain.name,
            state.explored,
            state.pruned,
            state.dead.len()
        );

        if !found {
            return ReorderResult::not_found(ReorderOutcome::Exhausted, state.explored);
        }

        let indices = state.order;
        debug_assert!(self.resolver.resolve(&chain.reordered(&indices)).compatible);
        ReorderResult {
            found: true,
            suggested_order: Some(indices.iter().map(|&i| chain.stages[i].attribute).collect()),
            suggested_indices: Some(indices),
            outcome: ReorderOutcome::Found,
            explored: state.explored,
        }
    }

    /// Fill `state.order` from position `len()` onward. `used` has bit `k`
    /// set when `movable[k]` is already placed.
    fn descend(&self, state: &mut SearchState<'_>, used: u32, current: TypeRef) -> bool {
        state.explored += 1;
        let position = state.order.len();

        if position == state.chain.len() {
            return self.resolver.result_assignable(&current, &state.chain.member_type);
        }

        let key = (position, used, current);
        if state.dead.contains(&key) {
            return false;
        }
        let (_, used, current) = key;

        let (chain, movable) = (state.chain, state.movable);
        let stage = &chain.stages[position];
        if stage.pinned {
            if let Some(accepted) = self.resolver.step(stage, &current) {
                state.order.push(position);
                if self.descend(state, used, accepted.output) {
                    return true;
                }
                state.order.pop();
            }
            state.dead.insert((position, used, current));
            return false;
        }

        let mut any_accepted = false;
        for (bit, &candidate) in movable.iter().enumerate() {
            if used & (1 << bit) != 0 {
                continue;
            }
            let Some(accepted) = self.resolver.step(&chain.stages[candidate], &current) else {
                continue;
            };
            any_accepted = true;
            state.order.push(candidate);
            if self.descend(state, used | (1 << bit), accepted.output) {
                return true;
            }
            state.order.pop();
        }

        if !any_accepted {
            state.pruned += 1;
        }
        state.dead.insert((position, used, current));
        false
    }
}

struct SearchState<'c> {
    chain: &'c Chain,
    movable: &'c [usize],
    order: Vec<usize>,
    dead: HashSet<(usize, u32, TypeRef)>,
    explored: usize,
    pruned: usize,
}
