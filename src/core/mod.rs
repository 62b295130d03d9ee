//! Core types for the attrchain resolver.
//!
//! This module contains the foundations shared by every other module:
//! - Flow types and the numeric widening table
//! - Error types
//! - Resolver options and configuration files

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ResolverOptions};
pub use error::{AttrChainError, CatalogError, ConfigError, InputError};
pub use types::{NumericKind, TypeParseError, TypeRef};
