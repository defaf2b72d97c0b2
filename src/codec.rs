//! Container Codec
//!
//! Writes container records onto nodes and reads them back through the schema
//! registry. Writes always produce the current schema and current identifier;
//! reads accept every schema in the lineage and every recognised identifier.

use tracing::{debug, warn};

use crate::config::ContainerConfig;
use crate::discovery::{list_containers, Containers};
use crate::error::{Result, ValidationError};
use crate::record::{Container, ContainerIds, ContainerRecord};
use crate::registry::SchemaRegistry;
use crate::schema::Presence;
use crate::store::AttributeStore;

/// Reads and writes containers for one schema lineage and identifier table
#[derive(Debug, Clone)]
pub struct ContainerCodec {
    registry: SchemaRegistry,
    ids: ContainerIds,
}

impl Default for ContainerCodec {
    fn default() -> Self {
        Self::from_config(&ContainerConfig::default())
    }
}

impl ContainerCodec {
    pub fn new(registry: SchemaRegistry, ids: ContainerIds) -> Self {
        Self { registry, ids }
    }

    /// Codec for the built-in lineage under the configured namespace
    pub fn from_config(config: &ContainerConfig) -> Self {
        Self::new(
            SchemaRegistry::lineage(&config.schema.namespace, &config.schema.kind),
            config.identifiers.clone(),
        )
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn ids(&self) -> &ContainerIds {
        &self.ids
    }

    /// Identifier of the schema every write produces
    pub fn current_schema(&self) -> String {
        self.registry
            .current()
            .map(|definition| definition.id.to_string())
            .unwrap_or_default()
    }

    /// Build a current-schema record carrying the current identifier
    pub fn new_record(
        &self,
        name: impl Into<String>,
        namespace: impl Into<String>,
        loader: Option<&str>,
        representation: impl Into<String>,
    ) -> ContainerRecord {
        ContainerRecord {
            schema: self.current_schema(),
            id: self.ids.current.clone(),
            name: name.into(),
            namespace: namespace.into(),
            loader: loader.unwrap_or_default().to_string(),
            representation: representation.into(),
        }
    }

    /// Replace all metadata on `node` with `record`.
    ///
    /// Only current-schema records with the current identifier are written.
    pub fn imprint<S>(&self, store: &mut S, node: &S::Node, record: &ContainerRecord) -> Result<()>
    where
        S: AttributeStore + ?Sized,
    {
        if record.id != self.ids.current {
            return Err(ValidationError::NotCurrentIdentifier {
                id: record.id.clone(),
                current: self.ids.current.clone(),
            }
            .into());
        }
        self.validate(record)?;

        let attributes = record.to_attributes()?;
        store.set_attributes(node, attributes)?;
        debug!(node = ?node, name = %record.name, namespace = %record.namespace, "imprinted container");
        Ok(())
    }

    /// Read the container on `node`, migrating it to the current schema.
    ///
    /// With `validate`, structural violations fail with a validation error.
    /// Without it, the best-effort record is returned; schema errors (unknown
    /// schema, migration gap) still propagate.
    pub fn parse<S>(&self, store: &S, node: &S::Node, validate: bool) -> Result<Container<S::Node>>
    where
        S: AttributeStore + ?Sized,
    {
        self.parse_recognising(store, node, validate, &|id| self.ids.recognises(id))
    }

    /// [`Self::parse`] with the set of acceptable `id` values supplied by the
    /// caller; discovery passes the identifiers it scanned for.
    pub(crate) fn parse_recognising<S>(
        &self,
        store: &S,
        node: &S::Node,
        validate: bool,
        recognises: &dyn Fn(&str) -> bool,
    ) -> Result<Container<S::Node>>
    where
        S: AttributeStore + ?Sized,
    {
        let raw = store.get_attributes(node)?;
        let resolved = self.registry.migrate(raw)?;
        let record = ContainerRecord::from_attributes(&resolved)?;

        if validate {
            if let Some(rule) = self.registry.current_violation(&resolved) {
                let field = rule.name.to_string();
                return Err(match (resolved.contains_key(rule.name), rule.presence) {
                    (true, Presence::Required) => ValidationError::EmptyField { field },
                    _ => ValidationError::MissingField {
                        schema: record.schema.clone(),
                        field,
                    },
                }
                .into());
            }
            self.validate(&record)?;
            if !recognises(&record.id) {
                return Err(ValidationError::UnknownIdentifier { id: record.id }.into());
            }
        } else if let Err(err) = self.validate(&record) {
            warn!(node = ?node, error = %err, "returning incomplete container");
        }

        Ok(Container {
            record,
            object_name: store.node_path(node)?,
            node: node.clone(),
        })
    }

    /// Structural checks shared by reads and writes
    pub fn validate(&self, record: &ContainerRecord) -> std::result::Result<(), ValidationError> {
        let expected = self.current_schema();
        if record.schema != expected {
            return Err(ValidationError::StaleSchema {
                found: record.schema.clone(),
                expected,
            });
        }
        for (field, value) in [
            ("id", &record.id),
            ("name", &record.name),
            ("representation", &record.representation),
        ] {
            if value.is_empty() {
                return Err(ValidationError::EmptyField {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Imprint a new container on `node` and return it as parsed back.
    pub fn containerise<S>(
        &self,
        store: &mut S,
        node: &S::Node,
        name: &str,
        namespace: &str,
        loader: Option<&str>,
        representation: &str,
    ) -> Result<Container<S::Node>>
    where
        S: AttributeStore + ?Sized,
    {
        let record = self.new_record(name, namespace, loader, representation);
        self.imprint(store, node, &record)?;
        self.parse(store, node, true)
    }

    /// Re-imprint `container` pointing at a new representation.
    ///
    /// Legacy containers are rewritten with the current schema and identifier.
    pub fn rebind<S>(
        &self,
        store: &mut S,
        container: &Container<S::Node>,
        representation: &str,
    ) -> Result<Container<S::Node>>
    where
        S: AttributeStore + ?Sized,
    {
        let record = ContainerRecord {
            schema: self.current_schema(),
            id: self.ids.current.clone(),
            representation: representation.to_string(),
            ..container.record.clone()
        };
        self.imprint(store, &container.node, &record)?;
        self.parse(store, &container.node, true)
    }

    /// Discover every container in the scene using the configured identifiers
    pub fn ls<'a, S>(&'a self, store: &'a S) -> Result<Containers<'a, S>>
    where
        S: AttributeStore,
    {
        list_containers(store, self, self.ids.known().as_slice())
    }
}
