//! Schema Registry
//!
//! Ordered lineage of container schemas, oldest to newest. Raw attribute maps
//! are resolved by walking the lineage from their declared schema to the
//! current one, one migration step at a time. Records without a `schema`
//! attribute predate schema tagging and are read as the oldest schema.

use tracing::debug;

use crate::error::SchemaError;
use crate::schema::{FieldRule, SchemaDefinition, SchemaId, ANCHOR_FIELDS, SCHEMA_KEY};
use crate::store::Attributes;

/// Namespace of the built-in container lineage
pub const DEFAULT_NAMESPACE: &str = "pipeline";

/// Kind of the built-in container lineage
pub const CONTAINER_KIND: &str = "container";

/// Value given to `loader` on records that predate it
pub const DEFAULT_LOADER: &str = "";

/// Registry of known schema versions
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    /// Oldest first
    schemas: Vec<SchemaDefinition>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in container lineage under `namespace`
    ///
    /// - `<namespace>:container-1.0`: untagged legacy records, no `loader`
    /// - `<namespace>:container-2.0`: adds `loader`
    pub fn container_lineage(namespace: &str) -> Self {
        Self::lineage(namespace, CONTAINER_KIND)
    }

    /// The container lineage shape under an arbitrary namespace and kind
    pub fn lineage(namespace: &str, kind: &str) -> Self {
        let mut registry = Self::new();
        let v1 = SchemaDefinition::new(
            SchemaId::new(namespace, kind, 1, 0),
            vec![
                FieldRule::present(SCHEMA_KEY),
                FieldRule::required("id"),
                FieldRule::required("name"),
                FieldRule::present("namespace"),
                FieldRule::required("representation"),
            ],
        )
        .with_migration(add_loader);
        let v2 = SchemaDefinition::new(
            SchemaId::new(namespace, kind, 2, 0),
            vec![
                FieldRule::present(SCHEMA_KEY),
                FieldRule::required("id"),
                FieldRule::required("name"),
                FieldRule::present("namespace"),
                FieldRule::present("loader"),
                FieldRule::required("representation"),
            ],
        );

        registry.schemas.push(v1);
        registry.schemas.push(v2);
        registry
    }

    /// Append a newer schema version.
    ///
    /// The lineage is append-only: the definition must share the namespace and
    /// kind of the current schema and carry a strictly greater version.
    pub fn register(&mut self, definition: SchemaDefinition) -> Result<(), SchemaError> {
        if let Some(latest) = self.schemas.last() {
            if !latest.id.same_lineage(&definition.id) || definition.id.version <= latest.id.version {
                return Err(SchemaError::OutOfOrder {
                    schema: definition.id.to_string(),
                    latest: latest.id.to_string(),
                });
            }
        }
        debug!(schema = %definition.id, "registered schema");
        self.schemas.push(definition);
        Ok(())
    }

    /// All known schemas, oldest first
    pub fn schemas(&self) -> &[SchemaDefinition] {
        &self.schemas
    }

    /// The oldest known schema (assumed for untagged records)
    pub fn oldest(&self) -> Option<&SchemaDefinition> {
        self.schemas.first()
    }

    /// The schema every write produces
    pub fn current(&self) -> Option<&SchemaDefinition> {
        self.schemas.last()
    }

    /// Look up a schema by identifier string
    pub fn get(&self, schema: &str) -> Option<&SchemaDefinition> {
        self.position(schema).map(|index| &self.schemas[index])
    }

    /// Whether `schema` names the current schema
    pub fn is_current(&self, schema: &str) -> bool {
        self.current().is_some_and(|current| current.id.to_string() == schema)
    }

    fn position(&self, schema: &str) -> Option<usize> {
        let id = SchemaId::parse(schema).ok()?;
        self.schemas.iter().position(|definition| definition.id == id)
    }

    /// The schema a raw record declares, defaulting to the oldest
    pub fn declared_schema(&self, raw: &Attributes) -> Result<&SchemaDefinition, SchemaError> {
        match raw.get(SCHEMA_KEY) {
            Some(schema) => self.get(schema).ok_or_else(|| SchemaError::UnknownSchema {
                schema: schema.clone(),
            }),
            None => self.oldest().ok_or_else(|| SchemaError::UnknownSchema {
                schema: String::new(),
            }),
        }
    }

    /// Upgrade `raw` to the current schema without checking field rules.
    ///
    /// An already-current record comes back unchanged apart from its `schema`
    /// value, which is always rewritten in canonical form.
    pub fn migrate(&self, raw: Attributes) -> Result<Attributes, SchemaError> {
        let start = self.declared_schema(&raw)?.id.to_string();
        let mut index = self.position(&start).unwrap_or_default();
        let mut record = raw;
        record.insert(SCHEMA_KEY.to_string(), start);

        while index + 1 < self.schemas.len() {
            let from = &self.schemas[index];
            let to = &self.schemas[index + 1];
            let step = from.migrate.ok_or_else(|| SchemaError::MigrationGap {
                from: from.id.to_string(),
                to: to.id.to_string(),
                reason: "no migration registered".to_string(),
            })?;

            let mut upgraded = step(record.clone(), &from.id)?;
            check_anchors(&record, &upgraded, from, to)?;
            upgraded.insert(SCHEMA_KEY.to_string(), to.id.to_string());

            debug!(from = %from.id, to = %to.id, "migrated record");
            record = upgraded;
            index += 1;
        }

        Ok(record)
    }

    /// Upgrade `raw` to the current schema and check its field rules.
    pub fn resolve(&self, raw: Attributes) -> Result<Attributes, SchemaError> {
        let record = self.migrate(raw)?;
        if let Some(rule) = self.current_violation(&record) {
            return Err(SchemaError::MissingField {
                schema: record.get(SCHEMA_KEY).cloned().unwrap_or_default(),
                field: rule.name.to_string(),
            });
        }
        Ok(record)
    }

    /// First rule of the current schema that `record` violates
    pub fn current_violation(&self, record: &Attributes) -> Option<&FieldRule> {
        self.current()?.first_violation(record)
    }
}

fn check_anchors(
    before: &Attributes,
    after: &Attributes,
    from: &SchemaDefinition,
    to: &SchemaDefinition,
) -> Result<(), SchemaError> {
    for anchor in ANCHOR_FIELDS {
        if let Some(value) = before.get(anchor) {
            if after.get(anchor) != Some(value) {
                return Err(SchemaError::MigrationGap {
                    from: from.id.to_string(),
                    to: to.id.to_string(),
                    reason: format!("anchor field '{anchor}' not preserved"),
                });
            }
        }
    }
    Ok(())
}

/// container-1.0 -> container-2.0
fn add_loader(mut raw: Attributes, _from: &SchemaId) -> Result<Attributes, SchemaError> {
    raw.entry("loader".to_string())
        .or_insert_with(|| DEFAULT_LOADER.to_string());
    Ok(raw)
}
