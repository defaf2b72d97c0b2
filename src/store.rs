//! Attribute store contract
//!
//! The only capability the container registry needs from a host binding:
//! a flat string-to-string attribute map per node, plus lookup of nodes by
//! attribute value. Hosts implement [`AttributeStore`] over their own scene
//! graph; [`crate::memory::MemoryScene`] is the in-process reference.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

use crate::error::StoreError;

/// Flat attribute map stored on a node
pub type Attributes = BTreeMap<String, String>;

/// Host binding for node attribute storage
///
/// All operations are synchronous and host-local. Node handles are opaque to
/// the registry; it only clones, compares and orders them.
pub trait AttributeStore {
    /// Opaque, comparable handle to a node in the host scene
    type Node: Clone + Ord + Hash + fmt::Debug;

    /// Replace the node's attributes with exactly `attributes`.
    ///
    /// This is an overwrite, not a merge: keys absent from `attributes` are
    /// removed from the node.
    fn set_attributes(&mut self, node: &Self::Node, attributes: Attributes) -> Result<(), StoreError>;

    /// Read all attributes currently stored on the node (empty if none).
    fn get_attributes(&self, node: &Self::Node) -> Result<Attributes, StoreError>;

    /// Every live node whose attributes contain `key == value`.
    ///
    /// Order is unspecified.
    fn find_nodes_by_attribute(&self, key: &str, value: &str) -> Result<Vec<Self::Node>, StoreError>;

    /// Address of the node within its scene (e.g. `/obj/ASSET_CON`).
    fn node_path(&self, node: &Self::Node) -> Result<String, StoreError>;

    /// Every live node whose attributes contain all pairs in `query`.
    ///
    /// An empty query matches nothing.
    fn find_nodes_by_attributes(&self, query: &Attributes) -> Result<Vec<Self::Node>, StoreError> {
        let Some((key, value)) = query.iter().next() else {
            return Ok(Vec::new());
        };

        let mut matches = Vec::new();
        for node in self.find_nodes_by_attribute(key, value)? {
            let attributes = self.get_attributes(&node)?;
            if query.iter().all(|(k, v)| attributes.get(k) == Some(v)) {
                matches.push(node);
            }
        }
        Ok(matches)
    }
}
