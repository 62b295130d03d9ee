//! Signatures and attribute entries.
//!
//! An attribute type declares one or more signatures. A one-type declaration
//! `[T]` validates a `T` without changing it; a two-type declaration
//! `[I, O]` transforms (e.g. parse-and-validate) an `I` into an `O`.

use crate::core::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One (input type -> output type) capability of an attribute type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    /// Type the signature accepts
    pub input: TypeRef,
    /// Type the signature produces
    pub output: TypeRef,
}

impl Signature {
    /// A validating signature: input and output are the same type.
    pub fn identity(ty: TypeRef) -> Self {
        Self {
            input: ty.clone(),
            output: ty,
        }
    }

    /// A transforming signature.
    pub fn transform(input: TypeRef, output: TypeRef) -> Self {
        Self { input, output }
    }

    /// Whether this signature changes the flowing type.
    pub fn is_transform(&self) -> bool {
        self.input != self.output
    }

    /// Flow type after this signature has consumed `current`.
    ///
    /// Validating signatures pass the value through untouched, so a widened
    /// `int` stays `int` after a `long` check.
    pub fn resolve_output(&self, current: &TypeRef) -> TypeRef {
        if self.is_transform() {
            self.output.clone()
        } else {
            current.clone()
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_transform() {
            write!(f, "{} -> {}", self.input, self.output)
        } else {
            write!(f, "{}", self.input)
        }
    }
}

/// Host-supplied declaration of an attribute type, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDeclaration {
    /// Attribute name, optionally namespaced (`Checks.NotEmpty`)
    pub name: String,
    /// Signatures as type-argument lists of arity 1 or 2
    #[serde(default)]
    pub signatures: Vec<Vec<TypeRef>>,
    /// Whether this attribute is a null guard
    #[serde(default)]
    pub guard: bool,
}

impl AttributeDeclaration {
    /// Start a declaration with no signatures.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signatures: Vec::new(),
            guard: false,
        }
    }

    /// Add a validating signature.
    pub fn validates(mut self, ty: TypeRef) -> Self {
        self.signatures.push(vec![ty]);
        self
    }

    /// Add a transforming signature.
    pub fn transforms(mut self, input: TypeRef, output: TypeRef) -> Self {
        self.signatures.push(vec![input, output]);
        self
    }

    /// Mark as a null guard.
    pub fn as_guard(mut self) -> Self {
        self.guard = true;
        self
    }
}

/// Stable identifier of an attribute type within one catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeId(pub u32);

impl AttributeId {
    /// Position of the entry in the catalog arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A validated attribute type stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeEntry {
    pub id: AttributeId,
    /// Full (possibly namespaced) name
    pub name: String,
    /// Non-empty, immutable signature list in declaration order
    pub signatures: Vec<Signature>,
    pub guard: bool,
}

/// How a stage consumed a flow type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    /// Index of the selected signature
    pub signature: usize,
    /// Flow type after the stage
    pub output: TypeRef,
}

impl AttributeEntry {
    /// Name without namespace qualifiers, as shown in suggestions.
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    /// Select the signature for a flowing `current` type.
    ///
    /// An exact input match wins; otherwise the first signature (in
    /// declaration order) whose input accepts `current`. Guards accept every
    /// type and strip nullability.
    pub fn accept(&self, current: &TypeRef) -> Option<Accepted> {
        let signature = self
            .signatures
            .iter()
            .position(|sig| sig.input == *current)
            .or_else(|| self.signatures.iter().position(|sig| sig.input.accepts(current)));

        if self.guard {
            return Some(Accepted {
                signature: signature.unwrap_or(0),
                output: current.non_null().clone(),
            });
        }

        signature.map(|index| Accepted {
            signature: index,
            output: self.signatures[index].resolve_output(current),
        })
    }

    /// Whether any signature accepts `current`.
    pub fn accepts(&self, current: &TypeRef) -> bool {
        self.guard || self.signatures.iter().any(|sig| sig.input.accepts(current))
    }

    /// Input types, for messages.
    pub fn input_names(&self) -> Vec<String> {
        self.signatures.iter().map(|sig| sig.input.display_name()).collect()
    }
}

/// Strip namespace qualifiers (`a.b.Name`, `a::Name`) from a name.
pub fn short_name(name: &str) -> &str {
    name.rsplit(['.', ':']).next().unwrap_or(name)
}
