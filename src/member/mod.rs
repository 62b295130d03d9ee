//! Annotated members, chains and the host input format.
//!
//! A member carries attributes in declared order; attributes sharing a chain
//! key form one chain that is resolved as a unit.

pub mod chain;
pub mod serialization;
pub mod structure;

// Re-export commonly used types
pub use chain::{Chain, ChainKey, StageUsage};
pub use serialization::{SerializedInput, SerializedMember, SerializedStage};
pub use structure::Member;
