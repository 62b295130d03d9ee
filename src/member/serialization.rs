//! Host input document: members and their attributes as JSON.
//!
//! ```json
//! { "version": "1.0.0",
//!   "members": [ { "name": "Email", "type": "string?",
//!                  "stages": [ { "attribute": "NotEmpty", "chain": null } ] } ] }
//! ```

use crate::catalog::registry::SignatureCatalog;
use crate::core::error::{AttrChainResult, InputError, InputResult};
use crate::core::types::TypeRef;
use crate::member::chain::{ChainKey, StageUsage};
use crate::member::structure::Member;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serializable representation of one attribute placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedStage {
    /// Attribute name (full or unique short name)
    pub attribute: String,
    /// Chain name; absent or `null` selects the default chain
    #[serde(default)]
    pub chain: ChainKey,
    /// Whether the stage must stay in place
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pinned: bool,
}

/// Serializable representation of a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedMember {
    pub name: String,
    /// Textual type, e.g. `string?` or `list<int>`
    #[serde(rename = "type")]
    pub member_type: String,
    #[serde(default)]
    pub stages: Vec<SerializedStage>,
}

/// Serializable representation of a whole input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedInput {
    /// Document format version
    pub version: String,
    pub members: Vec<SerializedMember>,
}

impl SerializedInput {
    /// Current format version.
    pub const VERSION: &'static str = "1.0.0";

    /// Major version this reader understands.
    pub const SUPPORTED_MAJOR: u64 = 1;

    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            version: Self::VERSION.to_string(),
            members: Vec::new(),
        }
    }

    /// Describe members in document form.
    pub fn from_members(members: &[Member], catalog: &SignatureCatalog) -> Self {
        let members = members
            .iter()
            .map(|member| SerializedMember {
                name: member.name.clone(),
                member_type: member.member_type.display_name(),
                stages: member
                    .stages
                    .iter()
                    .map(|stage| SerializedStage {
                        attribute: catalog
                            .get(stage.attribute)
                            .map(|e| e.name.clone())
                            .unwrap_or_default(),
                        chain: stage.chain.clone(),
                        pinned: stage.pinned,
                    })
                    .collect(),
            })
            .collect();
        Self {
            version: Self::VERSION.to_string(),
            members,
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read a document from a file.
    pub fn load(path: impl AsRef<Path>) -> AttrChainResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&text)?)
    }

    /// Check that the document version is one this reader understands.
    pub fn check_version(&self) -> InputResult<()> {
        let unsupported = || InputError::UnsupportedVersion {
            found: self.version.clone(),
            supported: format!("{}.x", Self::SUPPORTED_MAJOR),
        };
        let version = semver::Version::parse(&self.version).map_err(|_| unsupported())?;
        if version.major != Self::SUPPORTED_MAJOR {
            return Err(unsupported());
        }
        Ok(())
    }

    /// Resolve attribute names and types against a catalog.
    pub fn into_members(self, catalog: &SignatureCatalog) -> InputResult<Vec<Member>> {
        self.check_version()?;
        self.members
            .into_iter()
            .map(|member| member.into_member(catalog))
            .collect()
    }
}

impl Default for SerializedInput {
    fn default() -> Self {
        Self::new()
    }
}

impl SerializedMember {
    fn into_member(self, catalog: &SignatureCatalog) -> InputResult<Member> {
        let member_type: TypeRef = self
            .member_type
            .parse()
            .map_err(|error| InputError::InvalidType {
                member: self.name.clone(),
                error,
            })?;

        let mut member = Member::new(self.name, member_type);
        for stage in self.stages {
            let entry = catalog
                .lookup(&stage.attribute)
                .ok_or_else(|| InputError::UnknownAttribute {
                    member: member.name.clone(),
                    attribute: stage.attribute.clone(),
                })?;
            let mut usage = StageUsage::new(entry, 0).in_chain(stage.chain);
            if stage.pinned {
                usage = usage.pin();
            }
            member = member.with_stage(usage);
        }
        Ok(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "version": "1.2.0",
        "members": [
            { "name": "Email", "type": "string?",
              "stages": [
                { "attribute": "NotEmpty" },
                { "attribute": "EmailAddress", "chain": null },
                { "attribute": "NotNull", "chain": "", "pinned": true }
              ] }
        ]
    }"#;

    #[test]
    fn test_parse_and_resolve() {
        let catalog = SignatureCatalog::with_builtins();
        let members = SerializedInput::from_json(SAMPLE)
            .unwrap()
            .into_members(&catalog)
            .unwrap();

        assert_eq!(members.len(), 1);
        let member = &members[0];
        assert_eq!(member.member_type, TypeRef::Text.nullable());
        assert_eq!(member.stages.len(), 3);
        assert_eq!(member.stages[0].chain, ChainKey::Default);
        assert_eq!(member.stages[1].chain, ChainKey::Default);
        assert_eq!(member.stages[2].chain, ChainKey::named(""));
        assert!(member.stages[2].pinned);
        assert!(member.stages[2].is_guard);
        assert_eq!(member.stages[2].declared_order_index, 2);
        assert_eq!(member.chains().len(), 2);
    }

    #[test]
    fn test_unknown_attribute() {
        let catalog = SignatureCatalog::with_builtins();
        let json = r#"{"version":"1.0.0","members":[{"name":"X","type":"int","stages":[{"attribute":"Bogus"}]}]}"#;
        let err = SerializedInput::from_json(json).unwrap().into_members(&catalog).unwrap_err();
        assert_eq!(
            err,
            InputError::UnknownAttribute {
                member: "X".to_string(),
                attribute: "Bogus".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_type() {
        let catalog = SignatureCatalog::with_builtins();
        let json = r#"{"version":"1.0.0","members":[{"name":"X","type":"int??"}]}"#;
        let err = SerializedInput::from_json(json).unwrap().into_members(&catalog).unwrap_err();
        assert!(matches!(err, InputError::InvalidType { .. }));
    }

    #[test]
    fn test_version_check() {
        let mut input = SerializedInput::new();
        assert!(input.check_version().is_ok());
        input.version = "2.0.0".to_string();
        assert!(matches!(input.check_version(), Err(InputError::UnsupportedVersion { .. })));
        input.version = "one".to_string();
        assert!(input.check_version().is_err());
    }

    #[test]
    fn test_export_and_reload() {
        let catalog = SignatureCatalog::with_builtins();
        let members = SerializedInput::from_json(SAMPLE)
            .unwrap()
            .into_members(&catalog)
            .unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = SerializedInput::from_members(&members, &catalog).to_json().unwrap();
        write!(file, "{}", json).unwrap();

        let reloaded = SerializedInput::load(file.path())
            .unwrap()
            .into_members(&catalog)
            .unwrap();
        assert_eq!(reloaded, members);
    }
}
