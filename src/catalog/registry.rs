//! Signature catalog for the attribute-type universe.

use crate::catalog::signature::{AttributeDeclaration, AttributeEntry, AttributeId, Signature};
use crate::core::error::CatalogError;
use indexmap::IndexMap;

/// Immutable table of attribute types and their signatures.
///
/// Built once per attribute-type universe and read-only afterwards; entries
/// live in an arena indexed by [`AttributeId`]. Share it across threads by
/// reference or `Arc`.
#[derive(Debug, Clone, Default)]
pub struct SignatureCatalog {
    entries: Vec<AttributeEntry>,
    by_name: IndexMap<String, AttributeId>,
}

impl SignatureCatalog {
    /// Build a catalog from declarations only.
    pub fn from_declarations(
        declarations: impl IntoIterator<Item = AttributeDeclaration>,
    ) -> Result<Self, Vec<CatalogError>> {
        let mut builder = CatalogBuilder::new().with_builtins(false);
        for declaration in declarations {
            builder = builder.declare(declaration);
        }
        builder.build()
    }

    /// Build the catalog of built-in attribute types.
    pub fn with_builtins() -> Self {
        Self::or_empty(CatalogBuilder::new().build())
    }

    /// Logs every build error and falls back to an empty catalog.
    fn or_empty(built: Result<Self, Vec<CatalogError>>) -> Self {
        built.unwrap_or_else(|errors| {
            for error in &errors {
                log::error!("Invalid built-in attribute declaration: {}", error);
            }
            Self::default()
        })
    }

    /// Signatures for an attribute type.
    pub fn signatures_for(&self, id: AttributeId) -> &[Signature] {
        self.entries
            .get(id.index())
            .map(|e| e.signatures.as_slice())
            .unwrap_or(&[])
    }

    /// Get an entry by id.
    pub fn get(&self, id: AttributeId) -> Option<&AttributeEntry> {
        self.entries.get(id.index())
    }

    /// Look up an attribute by full or short name.
    pub fn lookup(&self, name: &str) -> Option<&AttributeEntry> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    /// Resolve a name to an id.
    ///
    /// Full names match first; a short name matches only when it is unique.
    pub fn id_of(&self, name: &str) -> Option<AttributeId> {
        if let Some(&id) = self.by_name.get(name) {
            return Some(id);
        }
        let mut matches = self.entries.iter().filter(|e| e.short_name() == name);
        match (matches.next(), matches.next()) {
            (Some(entry), None) => Some(entry.id),
            _ => None,
        }
    }

    /// The guard inserted by null-guard suggestions: `NotNull` when present,
    /// otherwise the first guard declared.
    pub fn guard_attribute(&self) -> Option<&AttributeEntry> {
        self.entries
            .iter()
            .find(|e| e.guard && e.short_name() == "NotNull")
            .or_else(|| self.entries.iter().find(|e| e.guard))
    }

    /// Display name for an id.
    pub fn short_name(&self, id: AttributeId) -> &str {
        self.get(id).map(|e| e.short_name()).unwrap_or("?")
    }

    /// All entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = &AttributeEntry> {
        self.entries.iter()
    }

    /// Search entries whose name contains `query` (case-insensitive).
    pub fn search(&self, query: &str) -> Vec<&AttributeEntry> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.name.to_lowercase().contains(&query))
            .collect()
    }

    /// Number of attribute types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder that validates declarations into a [`SignatureCatalog`].
pub struct CatalogBuilder {
    declarations: IndexMap<String, AttributeDeclaration>,
    include_builtins: bool,
}

impl CatalogBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            declarations: IndexMap::new(),
            include_builtins: true,
        }
    }

    /// Include or exclude built-in declarations.
    pub fn with_builtins(mut self, include: bool) -> Self {
        self.include_builtins = include;
        self
    }

    /// Declare an attribute type. A later declaration with the same name
    /// replaces the earlier one.
    pub fn declare(mut self, declaration: AttributeDeclaration) -> Self {
        self.declarations
            .insert(declaration.name.clone(), declaration);
        self
    }

    /// Declare several attribute types.
    pub fn declare_all(mut self, declarations: impl IntoIterator<Item = AttributeDeclaration>) -> Self {
        for declaration in declarations {
            self = self.declare(declaration);
        }
        self
    }

    /// Validate all declarations.
    ///
    /// Returns every malformed attribute type, one error per type.
    pub fn build(self) -> Result<SignatureCatalog, Vec<CatalogError>> {
        let mut declarations = IndexMap::new();
        if self.include_builtins {
            for declaration in crate::catalog::builtin::declarations() {
                declarations.insert(declaration.name.clone(), declaration);
            }
        }
        for (name, declaration) in self.declarations {
            declarations.insert(name, declaration);
        }

        let mut catalog = SignatureCatalog::default();
        let mut errors = Vec::new();

        for (name, declaration) in declarations {
            match validate_declaration(&declaration) {
                Ok(signatures) => {
                    let id = AttributeId(catalog.entries.len() as u32);
                    catalog.entries.push(AttributeEntry {
                        id,
                        name: name.clone(),
                        signatures,
                        guard: declaration.guard,
                    });
                    catalog.by_name.insert(name, id);
                }
                Err(error) => {
                    log::error!("{}", error);
                    errors.push(error);
                }
            }
        }

        if errors.is_empty() {
            log::debug!("Built signature catalog with {} attribute types", catalog.len());
            Ok(catalog)
        } else {
            Err(errors)
        }
    }
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn one declaration into signatures, or the first problem found.
fn validate_declaration(declaration: &AttributeDeclaration) -> Result<Vec<Signature>, CatalogError> {
    let attribute = || declaration.name.clone();

    if declaration.signatures.is_empty() {
        return Err(CatalogError::EmptySignatures {
            attribute: attribute(),
        });
    }

    let mut signatures: Vec<Signature> = Vec::with_capacity(declaration.signatures.len());
    for args in &declaration.signatures {
        let signature = match args.as_slice() {
            [ty] => Signature::identity(ty.clone()),
            [input, output] => Signature::transform(input.clone(), output.clone()),
            _ => {
                return Err(CatalogError::InvalidArity {
                    attribute: attribute(),
                    arity: args.len(),
                })
            }
        };

        if let Some(existing) = signatures.iter().find(|s| s.input == signature.input) {
            if existing.output != signature.output {
                return Err(CatalogError::AmbiguousSignatures {
                    attribute: attribute(),
                    input: signature.input,
                    first: existing.output.clone(),
                    second: signature.output,
                });
            }
            // Exact repeat, keep the first
            continue;
        }
        signatures.push(signature);
    }

    Ok(signatures)
}
