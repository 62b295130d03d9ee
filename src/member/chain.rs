//! Chains and the stages placed in them.

use crate::catalog::signature::{AttributeEntry, AttributeId};
use crate::core::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Key grouping stages of one member into chains.
///
/// `Default` is what a stage gets when it names no chain at all; it is a
/// different key from a chain explicitly named `""`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum ChainKey {
    Default,
    Named(String),
}

impl ChainKey {
    /// Shorthand for a named chain.
    pub fn named(name: impl Into<String>) -> Self {
        ChainKey::Named(name.into())
    }

    /// Prefix used in diagnostic messages: nothing for the default chain,
    /// `"(name) "` for a named one (including `"() "` for an empty name).
    pub fn label(&self) -> String {
        match self {
            ChainKey::Default => String::new(),
            ChainKey::Named(name) => format!("({}) ", name),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ChainKey::Default)
    }
}

impl Default for ChainKey {
    fn default() -> Self {
        ChainKey::Default
    }
}

impl fmt::Display for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainKey::Default => f.write_str("default"),
            ChainKey::Named(name) => f.write_str(name),
        }
    }
}

impl From<Option<String>> for ChainKey {
    fn from(value: Option<String>) -> Self {
        value.map(ChainKey::Named).unwrap_or_default()
    }
}

impl From<ChainKey> for Option<String> {
    fn from(value: ChainKey) -> Self {
        match value {
            ChainKey::Default => None,
            ChainKey::Named(name) => Some(name),
        }
    }
}

/// One attribute's placement on a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageUsage {
    /// Attribute type, resolved against the catalog
    pub attribute: AttributeId,
    /// Position among all of the member's attributes
    pub declared_order_index: usize,
    pub chain: ChainKey,
    /// Copied from the catalog entry
    pub is_guard: bool,
    /// Must stay at its declared position when reordering
    pub pinned: bool,
}

impl StageUsage {
    /// Create a stage for a catalog entry in the default chain.
    pub fn new(entry: &AttributeEntry, declared_order_index: usize) -> Self {
        Self {
            attribute: entry.id,
            declared_order_index,
            chain: ChainKey::Default,
            is_guard: entry.guard,
            pinned: false,
        }
    }

    /// Place in a chain.
    pub fn in_chain(mut self, chain: ChainKey) -> Self {
        self.chain = chain;
        self
    }

    /// Pin to its declared position.
    pub fn pin(mut self) -> Self {
        self.pinned = true;
        self
    }
}

/// A named, ordered run of stages on one member, resolved as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub name: ChainKey,
    /// Declared member type; nullable members carry the `Nullable` wrapper
    pub member_type: TypeRef,
    /// Stages in declared order
    pub stages: Vec<StageUsage>,
}

impl Chain {
    /// Create an empty chain.
    pub fn new(name: ChainKey, member_type: TypeRef) -> Self {
        Self {
            name,
            member_type,
            stages: Vec::new(),
        }
    }

    /// Append a stage.
    pub fn with_stage(mut self, stage: StageUsage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Whether the member may hold null.
    pub fn is_member_nullable(&self) -> bool {
        self.member_type.is_nullable()
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if the chain has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Attribute ids in stage order.
    pub fn attribute_ids(&self) -> Vec<AttributeId> {
        self.stages.iter().map(|s| s.attribute).collect()
    }

    /// Number of stages the reordering search may move.
    pub fn permutable_count(&self) -> usize {
        self.stages.iter().filter(|s| !s.pinned).count()
    }

    /// Attribute types that occur more than once, in order of first repeat.
    pub fn duplicate_attributes(&self) -> Vec<AttributeId> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for stage in &self.stages {
            if !seen.insert(stage.attribute) && !duplicates.contains(&stage.attribute) {
                duplicates.push(stage.attribute);
            }
        }
        duplicates
    }

    /// The chain with its stages rearranged: position `p` gets the stage at
    /// `order[p]`. Declared order indices keep their slots, so the result
    /// reads as if the attributes had been written in the new order.
    ///
    /// `order` must be a permutation of `0..len()`.
    pub fn reordered(&self, order: &[usize]) -> Chain {
        debug_assert_eq!(order.len(), self.stages.len());
        let stages = order
            .iter()
            .zip(self.stages.iter().map(|s| s.declared_order_index))
            .map(|(&from, slot)| StageUsage {
                declared_order_index: slot,
                ..self.stages[from].clone()
            })
            .collect();
        Chain {
            name: self.name.clone(),
            member_type: self.member_type.clone(),
            stages,
        }
    }

    /// The chain with a pinned guard inserted before position `index`.
    ///
    /// The guard takes the declared order index of the stage it displaces and
    /// every later index moves up by one, so indices stay unique.
    pub fn with_guard_at(&self, index: usize, guard: &AttributeEntry) -> Chain {
        let index = index.min(self.stages.len());
        let slot = self
            .stages
            .get(index)
            .map(|s| s.declared_order_index)
            .or_else(|| self.stages.iter().map(|s| s.declared_order_index + 1).max())
            .unwrap_or(0);

        let mut stages = self.stages.clone();
        for stage in stages.iter_mut().filter(|s| s.declared_order_index >= slot) {
            stage.declared_order_index += 1;
        }
        stages.insert(
            index,
            StageUsage::new(guard, slot).in_chain(self.name.clone()).pin(),
        );
        Chain {
            name: self.name.clone(),
            member_type: self.member_type.clone(),
            stages,
        }
    }
}
