//! Built-in attribute declarations.
//!
//! Signatures only: the predicates themselves live with the code generator.

use crate::catalog::signature::AttributeDeclaration;
use crate::core::types::{NumericKind, TypeRef};

/// Numeric kinds accepted by sign-sensitive checks (no unsigned kinds).
const SIGNED: [NumericKind; 7] = [
    NumericKind::SByte,
    NumericKind::Short,
    NumericKind::Int,
    NumericKind::Long,
    NumericKind::Float,
    NumericKind::Double,
    NumericKind::Decimal,
];

/// Integral kinds, for checks that only make sense on whole numbers.
const INTEGRAL: [NumericKind; 8] = [
    NumericKind::SByte,
    NumericKind::Byte,
    NumericKind::Short,
    NumericKind::UShort,
    NumericKind::Int,
    NumericKind::UInt,
    NumericKind::Long,
    NumericKind::ULong,
];

/// All built-in declarations, in registration order.
pub fn declarations() -> Vec<AttributeDeclaration> {
    let mut all = Vec::new();
    all.extend(general());
    all.extend(strings());
    all.extend(collections());
    all.extend(numerics());
    all.extend(dates());
    all
}

fn general() -> Vec<AttributeDeclaration> {
    let any = TypeRef::Any;
    vec![
        AttributeDeclaration::new("NotNull").validates(any.clone()).as_guard(),
        AttributeDeclaration::new("Optional").validates(any.clone()).as_guard(),
        AttributeDeclaration::new("EqualTo").validates(any.clone()),
        AttributeDeclaration::new("NotEqualTo").validates(any.clone()),
        AttributeDeclaration::new("NotDefault").validates(any),
    ]
}

fn strings() -> Vec<AttributeDeclaration> {
    let text = || TypeRef::Text;
    let mut declarations: Vec<AttributeDeclaration> = [
        "NotEmpty",
        "EmailAddress",
        "Lowercase",
        "Uppercase",
        "Alpha",
        "AlphaNumeric",
        "NoWhitespace",
        "StartsWith",
        "EndsWith",
        "Contains",
        "Matches",
        "Phone",
        "CreditCard",
    ]
    .into_iter()
    .map(|name| AttributeDeclaration::new(name).validates(text()))
    .collect();

    declarations.push(
        AttributeDeclaration::new("Numeric").transforms(text(), TypeRef::numeric(NumericKind::Double)),
    );
    declarations.push(AttributeDeclaration::new("Url").transforms(text(), TypeRef::named("Uri")));
    declarations.push(AttributeDeclaration::new("Guid").transforms(text(), TypeRef::named("Guid")));
    declarations
}

fn collections() -> Vec<AttributeDeclaration> {
    ["MinLength", "MaxLength", "Length", "HasElements", "UniqueElements"]
        .into_iter()
        .map(|name| {
            AttributeDeclaration::new(name)
                .validates(TypeRef::sequence(TypeRef::Any))
                .validates(TypeRef::Text)
        })
        .collect()
}

fn overloads(name: &str, kinds: &[NumericKind]) -> AttributeDeclaration {
    kinds.iter().fold(AttributeDeclaration::new(name), |decl, &kind| {
        decl.validates(TypeRef::numeric(kind))
    })
}

fn numerics() -> Vec<AttributeDeclaration> {
    let mut declarations = Vec::new();
    for name in ["Positive", "Negative"] {
        declarations.push(overloads(name, &SIGNED));
    }
    for name in ["NonZero", "Range", "GreaterThan", "LessThan", "GreaterThanOrEqualTo", "LessThanOrEqualTo", "DivisibleBy"] {
        declarations.push(overloads(name, &NumericKind::ALL));
    }
    for name in ["EvenNumber", "OddNumber", "Prime", "PowerOf", "MinDigits", "MaxDigits"] {
        declarations.push(overloads(name, &INTEGRAL));
    }
    declarations
}

fn dates() -> Vec<AttributeDeclaration> {
    ["FutureDate", "PastDate", "NotInFuture", "NotInPast", "UTC", "NotUTC", "MinAge", "MaxAge", "LeapYear"]
        .into_iter()
        .map(|name| AttributeDeclaration::new(name).validates(TypeRef::DateTime))
        .collect()
}
