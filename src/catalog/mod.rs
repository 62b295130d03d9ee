//! Signature catalog: which (input -> output) signatures each attribute type supports.

pub mod builtin;
pub mod registry;
pub mod signature;

pub use registry::{CatalogBuilder, SignatureCatalog};
pub use signature::{Accepted, AttributeDeclaration, AttributeEntry, AttributeId, Signature};
