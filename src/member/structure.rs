//! Annotated members and their grouping into chains.

use crate::catalog::signature::AttributeEntry;
use crate::core::types::TypeRef;
use crate::member::chain::{Chain, ChainKey, StageUsage};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A member (field or property) with its validation attributes in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Member name as shown in diagnostics
    pub name: String,
    /// Declared type; `Nullable` for members that may hold null
    pub member_type: TypeRef,
    /// All attribute placements, across chains
    pub stages: Vec<StageUsage>,
}

impl Member {
    /// Create a member with no attributes.
    pub fn new(name: impl Into<String>, member_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            member_type,
            stages: Vec::new(),
        }
    }

    /// Add an attribute in the default chain.
    pub fn with_attribute(self, entry: &AttributeEntry) -> Self {
        self.with_attribute_in(entry, ChainKey::Default)
    }

    /// Add an attribute in the given chain.
    pub fn with_attribute_in(mut self, entry: &AttributeEntry, chain: ChainKey) -> Self {
        let index = self.stages.len();
        self.stages.push(StageUsage::new(entry, index).in_chain(chain));
        self
    }

    /// Add a prebuilt stage. Its declared order index is overwritten with
    /// the member position.
    pub fn with_stage(mut self, mut stage: StageUsage) -> Self {
        stage.declared_order_index = self.stages.len();
        self.stages.push(stage);
        self
    }

    /// Group stages into chains.
    ///
    /// Chains come out in order of first appearance; stages within a chain
    /// keep their declared order. Every stage sharing a key lands in the same
    /// chain, so each key is resolved (and reported) once.
    pub fn chains(&self) -> Vec<Chain> {
        let mut grouped: IndexMap<&ChainKey, Chain> = IndexMap::new();
        for stage in &self.stages {
            grouped
                .entry(&stage.chain)
                .or_insert_with(|| Chain::new(stage.chain.clone(), self.member_type.clone()))
                .stages
                .push(stage.clone());
        }
        grouped.into_values().collect()
    }

    /// The chain for one key, if any stage uses it.
    pub fn chain(&self, key: &ChainKey) -> Option<Chain> {
        self.chains().into_iter().find(|c| &c.name == key)
    }

    /// Number of distinct chain keys.
    pub fn chain_count(&self) -> usize {
        let mut keys: Vec<&ChainKey> = self.stages.iter().map(|s| &s.chain).collect();
        keys.sort();
        keys.dedup();
        keys.len()
    }
}
