//! Flow types threaded through a validation chain.
//!
//! The type universe is a closed enum so that compatibility is decided by
//! exhaustive matching instead of runtime inspection:
//! - Numeric kinds carry an explicit widening table
//! - Nullability is a wrapper, never a flag, so `T?` and `T` are distinct values
//! - Sequences are covariant in their element type

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Built-in numeric kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericKind {
    SByte,
    Byte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    Decimal,
}

/// A type as seen at a signature boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    /// Accepts every value, nullable ones included
    Any,
    Boolean,
    /// UTF-8 text
    Text,
    Char,
    DateTime,
    Numeric(NumericKind),
    /// Homogeneous sequence of elements
    Sequence(Box<TypeRef>),
    /// Any other host type, compared by name
    Named(String),
    /// Nullable form of the inner type
    Nullable(Box<TypeRef>),
}

/// Error parsing the textual form of a type.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeParseError {
    #[error("empty type name")]
    Empty,

    #[error("invalid type name '{0}'")]
    InvalidName(String),

    #[error("type '{0}' is already nullable")]
    DoubleNullable(String),

    #[error("unbalanced generic arguments in '{0}'")]
    Unbalanced(String),
}

// ============================================================================
// NumericKind Implementation
// ============================================================================

impl NumericKind {
    /// All numeric kinds, narrowest first.
    pub const ALL: [NumericKind; 11] = [
        NumericKind::SByte,
        NumericKind::Byte,
        NumericKind::Short,
        NumericKind::UShort,
        NumericKind::Int,
        NumericKind::UInt,
        NumericKind::Long,
        NumericKind::ULong,
        NumericKind::Float,
        NumericKind::Double,
        NumericKind::Decimal,
    ];

    /// Kinds this kind converts to implicitly (not including itself).
    ///
    /// This table is the single source of truth for numeric compatibility.
    /// Signed and unsigned ladders are kept apart: an unsigned kind may widen
    /// into a larger signed kind, a signed kind never widens into an unsigned one.
    pub const fn widening_targets(self) -> &'static [NumericKind] {
        use NumericKind::*;
        match self {
            SByte => &[Short, Int, Long, Float, Double, Decimal],
            Byte => &[Short, UShort, Int, UInt, Long, ULong, Float, Double, Decimal],
            Short => &[Int, Long, Float, Double, Decimal],
            UShort => &[Int, UInt, Long, ULong, Float, Double, Decimal],
            Int => &[Long, Float, Double, Decimal],
            UInt => &[Long, ULong, Float, Double, Decimal],
            Long => &[Float, Double, Decimal],
            ULong => &[Float, Double, Decimal],
            Float => &[Double],
            Double => &[],
            Decimal => &[],
        }
    }

    /// Check whether a value of this kind can be passed where `target` is expected.
    pub fn widens_to(self, target: NumericKind) -> bool {
        self == target || self.widening_targets().contains(&target)
    }

    /// Keyword used in the textual form.
    pub fn keyword(self) -> &'static str {
        match self {
            NumericKind::SByte => "sbyte",
            NumericKind::Byte => "byte",
            NumericKind::Short => "short",
            NumericKind::UShort => "ushort",
            NumericKind::Int => "int",
            NumericKind::UInt => "uint",
            NumericKind::Long => "long",
            NumericKind::ULong => "ulong",
            NumericKind::Float => "float",
            NumericKind::Double => "double",
            NumericKind::Decimal => "decimal",
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.keyword() == word)
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

// ============================================================================
// TypeRef Implementation
// ============================================================================

impl TypeRef {
    /// Shorthand for a numeric type.
    pub fn numeric(kind: NumericKind) -> Self {
        TypeRef::Numeric(kind)
    }

    /// Shorthand for a named host type.
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    /// Shorthand for a sequence type.
    pub fn sequence(element: TypeRef) -> Self {
        TypeRef::Sequence(Box::new(element))
    }

    /// Wrap in `Nullable`. Idempotent.
    pub fn nullable(self) -> Self {
        match self {
            TypeRef::Nullable(_) => self,
            other => TypeRef::Nullable(Box::new(other)),
        }
    }

    /// Whether this is the nullable form of a type.
    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeRef::Nullable(_))
    }

    /// The non-nullable form of this type.
    pub fn non_null(&self) -> &TypeRef {
        match self {
            TypeRef::Nullable(inner) => inner,
            other => other,
        }
    }

    /// Check whether a signature input of this type accepts a flowing `value`.
    pub fn accepts(&self, value: &TypeRef) -> bool {
        match (self, value) {
            (TypeRef::Any, _) => true,
            (TypeRef::Nullable(input), TypeRef::Nullable(inner)) => input.accepts(inner),
            (TypeRef::Nullable(input), plain) => input.accepts(plain),
            (_, TypeRef::Nullable(_)) => false,
            (TypeRef::Numeric(target), TypeRef::Numeric(source)) => source.widens_to(*target),
            (TypeRef::Sequence(input), TypeRef::Sequence(element)) => input.accepts(element),
            (a, b) => a == b,
        }
    }

    /// Check whether a flowing value of this type can be assigned back to `member`.
    pub fn assignable_to(&self, member: &TypeRef) -> bool {
        member.accepts(self)
    }

    /// Get a display name for this type.
    pub fn display_name(&self) -> String {
        match self {
            TypeRef::Any => "any".to_string(),
            TypeRef::Boolean => "bool".to_string(),
            TypeRef::Text => "string".to_string(),
            TypeRef::Char => "char".to_string(),
            TypeRef::DateTime => "datetime".to_string(),
            TypeRef::Numeric(kind) => kind.keyword().to_string(),
            TypeRef::Sequence(inner) => format!("list<{}>", inner.display_name()),
            TypeRef::Named(name) => name.clone(),
            TypeRef::Nullable(inner) => format!("{}?", inner.display_name()),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for TypeRef {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TypeParseError::Empty);
        }

        if let Some(inner) = s.strip_suffix('?') {
            let inner: TypeRef = inner.parse()?;
            if inner.is_nullable() {
                return Err(TypeParseError::DoubleNullable(s.to_string()));
            }
            return Ok(inner.nullable());
        }

        if let Some(element) = s.strip_suffix("[]") {
            return Ok(TypeRef::sequence(element.parse()?));
        }

        if let Some(open) = s.find('<') {
            let head = &s[..open];
            let args = s[open + 1..]
                .strip_suffix('>')
                .ok_or_else(|| TypeParseError::Unbalanced(s.to_string()))?;
            return match head {
                "list" | "seq" => Ok(TypeRef::sequence(args.parse()?)),
                _ => Err(TypeParseError::InvalidName(s.to_string())),
            };
        }
        if s.contains('>') {
            return Err(TypeParseError::Unbalanced(s.to_string()));
        }

        let parsed = match s {
            "any" | "object" => TypeRef::Any,
            "bool" => TypeRef::Boolean,
            "string" => TypeRef::Text,
            "char" => TypeRef::Char,
            "datetime" => TypeRef::DateTime,
            word => match NumericKind::from_keyword(word) {
                Some(kind) => TypeRef::Numeric(kind),
                None if is_identifier(word) => TypeRef::Named(word.to_string()),
                None => return Err(TypeParseError::InvalidName(word.to_string())),
            },
        };
        Ok(parsed)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = TypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.display_name()
    }
}

/// Host type names: dotted or `::`-separated identifier paths.
fn is_identifier(word: &str) -> bool {
    word.split(['.', ':'])
        .filter(|part| !part.is_empty())
        .all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
        && word.chars().next().is_some_and(|c| c != '.' && c != ':')
}
