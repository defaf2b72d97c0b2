//! In-memory scene
//!
//! A reference host for the attribute store contract: nodes addressed by
//! path, opaque [`NodeId`] handles and hash-ordered enumeration, so callers
//! cannot rely on lookup order.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;
use crate::selection::Selection;
use crate::store::{AttributeStore, Attributes};

/// Opaque handle to a node in a [`MemoryScene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemoryNode {
    path: String,
    #[serde(default)]
    attributes: Attributes,
}

/// A scene graph held entirely in process memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryScene {
    nodes: HashMap<NodeId, MemoryNode>,
    next_id: u64,
    #[serde(default)]
    selection: Vec<NodeId>,
}

impl MemoryScene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node at `path`. Paths are unique within the scene.
    pub fn create_node(&mut self, path: impl Into<String>) -> Result<NodeId, StoreError> {
        let path = path.into();
        if self.find_node(&path).is_some() {
            return Err(StoreError::DuplicatePath { path });
        }

        let id = NodeId(self.next_id);
        self.next_id += 1;
        debug!(node = %id, path = %path, "created node");
        self.nodes.insert(
            id,
            MemoryNode {
                path,
                attributes: Attributes::new(),
            },
        );
        Ok(id)
    }

    /// Remove a node; its handle becomes invalid.
    pub fn delete_node(&mut self, node: NodeId) -> Result<(), StoreError> {
        self.nodes.remove(&node).ok_or_else(|| invalid(node))?;
        self.selection.retain(|selected| *selected != node);
        Ok(())
    }

    /// Look up a node by its path
    pub fn find_node(&self, path: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.path == path)
            .map(|(id, _)| *id)
    }

    /// Whether the handle refers to a live node
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, node: NodeId) -> Result<&MemoryNode, StoreError> {
        self.nodes.get(&node).ok_or_else(|| invalid(node))
    }
}

fn invalid(node: NodeId) -> StoreError {
    StoreError::InvalidNode {
        node: node.to_string(),
    }
}

impl AttributeStore for MemoryScene {
    type Node = NodeId;

    fn set_attributes(&mut self, node: &NodeId, attributes: Attributes) -> Result<(), StoreError> {
        let entry = self.nodes.get_mut(node).ok_or_else(|| invalid(*node))?;
        entry.attributes = attributes;
        Ok(())
    }

    fn get_attributes(&self, node: &NodeId) -> Result<Attributes, StoreError> {
        Ok(self.node(*node)?.attributes.clone())
    }

    fn find_nodes_by_attribute(&self, key: &str, value: &str) -> Result<Vec<NodeId>, StoreError> {
        Ok(self
            .nodes
            .iter()
            .filter(|(_, node)| node.attributes.get(key).map(String::as_str) == Some(value))
            .map(|(id, _)| *id)
            .collect())
    }

    fn node_path(&self, node: &NodeId) -> Result<String, StoreError> {
        Ok(self.node(*node)?.path.clone())
    }
}

impl Selection for MemoryScene {
    type Node = NodeId;

    fn selected_nodes(&self) -> Vec<NodeId> {
        self.selection.clone()
    }

    fn set_selection(&mut self, nodes: &[NodeId]) {
        self.selection = nodes
            .iter()
            .copied()
            .filter(|node| self.nodes.contains_key(node))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_set_attributes_overwrites() {
        let mut scene = MemoryScene::new();
        let node = scene.create_node("/obj/a").unwrap();

        scene.set_attributes(&node, attrs(&[("id", "x"), ("extra", "1")])).unwrap();
        scene.set_attributes(&node, attrs(&[("id", "y")])).unwrap();

        assert_eq!(scene.get_attributes(&node).unwrap(), attrs(&[("id", "y")]));
    }

    #[test]
    fn test_deleted_node_is_invalid() {
        let mut scene = MemoryScene::new();
        let node = scene.create_node("/obj/a").unwrap();
        scene.delete_node(node).unwrap();

        assert!(matches!(
            scene.get_attributes(&node),
            Err(StoreError::InvalidNode { .. })
        ));
        assert!(scene.set_attributes(&node, Attributes::new()).is_err());
        assert!(scene.node_path(&node).is_err());
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let mut scene = MemoryScene::new();
        scene.create_node("/obj/a").unwrap();
        assert_eq!(
            scene.create_node("/obj/a"),
            Err(StoreError::DuplicatePath {
                path: "/obj/a".to_string()
            })
        );
    }

    #[test]
    fn test_find_nodes_by_attributes() {
        let mut scene = MemoryScene::new();
        let a = scene.create_node("/obj/a").unwrap();
        let b = scene.create_node("/obj/b").unwrap();
        scene.set_attributes(&a, attrs(&[("id", "x"), ("family", "model")])).unwrap();
        scene.set_attributes(&b, attrs(&[("id", "x"), ("family", "rig")])).unwrap();

        let mut both = scene.find_nodes_by_attribute("id", "x").unwrap();
        both.sort();
        assert_eq!(both, vec![a, b]);

        let rigs = scene
            .find_nodes_by_attributes(&attrs(&[("id", "x"), ("family", "rig")]))
            .unwrap();
        assert_eq!(rigs, vec![b]);

        assert!(scene.find_nodes_by_attributes(&Attributes::new()).unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut scene = MemoryScene::new();
        let node = scene.create_node("/obj/a").unwrap();
        scene.set_attributes(&node, attrs(&[("id", "x")])).unwrap();

        let json = serde_json::to_string(&scene).unwrap();
        let restored: MemoryScene = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.find_node("/obj/a"), Some(node));
        assert_eq!(restored.get_attributes(&node).unwrap(), attrs(&[("id", "x")]));
    }
}
