//! Container records
//!
//! A [`ContainerRecord`] is the persisted unit imprinted onto a node. Parsing
//! wraps it in a [`Container`] that also carries transient data derived from
//! the node itself; that data is never written back to storage.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::Attributes;

/// Identifier of containers written by this build
pub const DEFAULT_CONTAINER_ID: &str = "pipeline.container";

/// Identifier of containers written by earlier pipelines; read, never written
pub const DEFAULT_LEGACY_CONTAINER_ID: &str = "pipeline.legacy_container";

/// Attribute key holding the container identifier
pub const ID_KEY: &str = "id";

/// Persisted fields of a container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerRecord {
    /// Schema identifier, e.g. `pipeline:container-2.0`
    pub schema: String,
    /// Container sentinel, e.g. `pipeline.container`
    pub id: String,
    /// Human-readable label
    pub name: String,
    /// Disambiguates repeated loads of the same asset
    pub namespace: String,
    /// Loading strategy that produced the container; empty when unknown
    pub loader: String,
    /// Reference to the loaded asset version
    pub representation: String,
}

impl ContainerRecord {
    /// Flatten into the attribute map written to a node
    pub fn to_attributes(&self) -> Result<Attributes> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Decode from a resolved attribute map. Unknown keys are ignored and
    /// absent fields decode as empty strings.
    pub fn from_attributes(attributes: &Attributes) -> Result<Self> {
        let value = serde_json::to_value(attributes)?;
        Ok(serde_json::from_value(value)?)
    }
}

/// A parsed container: the persisted record plus transient node data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container<N> {
    pub record: ContainerRecord,
    /// Address of the owning node in its scene
    pub object_name: String,
    /// Handle to the owning node, for re-imprinting
    pub node: N,
}

impl<N> std::ops::Deref for Container<N> {
    type Target = ContainerRecord;

    fn deref(&self) -> &ContainerRecord {
        &self.record
    }
}

/// Container identifiers: the one written today and those still recognised
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerIds {
    pub current: String,
    #[serde(default)]
    pub legacy: Vec<String>,
}

impl ContainerIds {
    pub fn new(current: impl Into<String>, legacy: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            current: current.into(),
            legacy: legacy.into_iter().map(Into::into).collect(),
        }
    }

    /// Every recognised identifier, current first
    pub fn known(&self) -> Vec<String> {
        std::iter::once(self.current.clone())
            .chain(self.legacy.iter().cloned())
            .collect()
    }

    /// Whether `id` is the current or a legacy identifier
    pub fn recognises(&self, id: &str) -> bool {
        self.current == id || self.legacy.iter().any(|legacy| legacy == id)
    }
}

impl Default for ContainerIds {
    fn default() -> Self {
        Self::new(DEFAULT_CONTAINER_ID, [DEFAULT_LEGACY_CONTAINER_ID])
    }
}
