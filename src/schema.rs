//! Schema identifiers and definitions

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::store::Attributes;

/// Attribute key holding the schema identifier
pub const SCHEMA_KEY: &str = "schema";

/// Anchor fields every schema version must carry through migration
pub const ANCHOR_FIELDS: [&str; 2] = ["id", "representation"];

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9_.\-]+):([A-Za-z0-9_]+)-(\d+)\.(\d+)$").expect("valid schema id pattern")
    })
}

/// Parsed schema identifier, `<namespace>:<kind>-<major>.<minor>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaId {
    pub namespace: String,
    pub kind: String,
    /// Major and minor version; patch is always 0
    pub version: Version,
}

impl SchemaId {
    pub fn new(namespace: impl Into<String>, kind: impl Into<String>, major: u64, minor: u64) -> Self {
        Self {
            namespace: namespace.into(),
            kind: kind.into(),
            version: Version::new(major, minor, 0),
        }
    }

    /// Parse an identifier string; malformed input is an unknown schema
    pub fn parse(value: &str) -> Result<Self, SchemaError> {
        let unknown = || SchemaError::UnknownSchema {
            schema: value.to_string(),
        };
        let captures = identifier_pattern().captures(value).ok_or_else(unknown)?;
        let major = captures[3].parse().map_err(|_| unknown())?;
        let minor = captures[4].parse().map_err(|_| unknown())?;
        Ok(Self::new(&captures[1], &captures[2], major, minor))
    }

    /// Whether `other` belongs to the same namespace and kind
    pub fn same_lineage(&self, other: &SchemaId) -> bool {
        self.namespace == other.namespace && self.kind == other.kind
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}.{}",
            self.namespace, self.kind, self.version.major, self.version.minor
        )
    }
}

impl FromStr for SchemaId {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SchemaId {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SchemaId> for String {
    fn from(id: SchemaId) -> Self {
        id.to_string()
    }
}

impl PartialOrd for SchemaId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SchemaId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version
            .cmp(&other.version)
            .then_with(|| self.namespace.cmp(&other.namespace))
            .then_with(|| self.kind.cmp(&other.kind))
    }
}

/// How strictly a field must be populated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Present and non-empty
    Required,
    /// Present, may be empty
    Present,
}

/// A field declared by a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub presence: Presence,
}

impl FieldRule {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            presence: Presence::Required,
        }
    }

    pub const fn present(name: &'static str) -> Self {
        Self {
            name,
            presence: Presence::Present,
        }
    }

    /// Whether `raw` satisfies this rule
    pub fn is_satisfied(&self, raw: &Attributes) -> bool {
        match (raw.get(self.name), self.presence) {
            (None, _) => false,
            (Some(value), Presence::Required) => !value.is_empty(),
            (Some(_), Presence::Present) => true,
        }
    }
}

/// One-step upgrade of a raw record to the next newer schema.
///
/// Receives the record and the schema it currently conforms to. The registry
/// stamps the new `schema` value after the step, so migrations only reshape
/// fields.
pub type Migration = fn(Attributes, &SchemaId) -> Result<Attributes, SchemaError>;

/// A schema version: its field rules and how to leave it
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    pub id: SchemaId,
    pub fields: Vec<FieldRule>,
    /// Upgrade to the next newer schema; `None` for the newest
    pub migrate: Option<Migration>,
}

impl SchemaDefinition {
    pub fn new(id: SchemaId, fields: Vec<FieldRule>) -> Self {
        Self {
            id,
            fields,
            migrate: None,
        }
    }

    /// Attach the step that upgrades this schema to its successor
    pub fn with_migration(mut self, migrate: Migration) -> Self {
        self.migrate = Some(migrate);
        self
    }

    /// First field rule that `raw` violates, if any
    pub fn first_violation(&self, raw: &Attributes) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| !rule.is_satisfied(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_id_parsing() {
        let id = SchemaId::parse("pipeline:container-2.0").unwrap();
        assert_eq!(id.namespace, "pipeline");
        assert_eq!(id.kind, "container");
        assert_eq!(id.version, Version::new(2, 0, 0));
        assert_eq!(id.to_string(), "pipeline:container-2.0");
    }

    #[test]
    fn test_schema_id_with_dashed_namespace() {
        let id: SchemaId = "avalon-core:container-1.0".parse().unwrap();
        assert_eq!(id.namespace, "avalon-core");
        assert_eq!(id.version.major, 1);
    }

    #[test]
    fn test_malformed_schema_id() {
        for bad in ["", "container-2.0", "pipeline:container", "pipeline:container-2", "a:b-x.y"] {
            assert!(
                matches!(SchemaId::parse(bad), Err(SchemaError::UnknownSchema { .. })),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn test_schema_id_ordering() {
        let old = SchemaId::parse("pipeline:container-1.0").unwrap();
        let minor = SchemaId::parse("pipeline:container-1.10").unwrap();
        let new = SchemaId::parse("pipeline:container-2.0").unwrap();
        assert!(old < minor);
        assert!(minor < new);
    }

    #[test]
    fn test_field_rules() {
        let mut raw = Attributes::new();
        raw.insert("loader".to_string(), String::new());
        raw.insert("name".to_string(), String::new());

        assert!(FieldRule::present("loader").is_satisfied(&raw));
        assert!(!FieldRule::required("name").is_satisfied(&raw));
        assert!(!FieldRule::present("missing").is_satisfied(&raw));
    }
}
