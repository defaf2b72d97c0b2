//! Container Discovery
//!
//! Scans a scene for nodes carrying any recognised container identifier and
//! yields them parsed, in a deterministic order: by node path, then by node
//! handle for nodes sharing a path.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::codec::ContainerCodec;
use crate::error::Result;
use crate::record::{Container, ID_KEY};
use crate::store::AttributeStore;

/// Find every container whose `id` matches one of `known_ids`.
///
/// `known_ids` should list the current identifier first and legacy ones after;
/// all are scanned since old and new containers coexist in one scene. Store
/// failures during the scan are returned immediately; parsing happens lazily
/// as the returned iterator is consumed.
pub fn list_containers<'a, S, I>(
    store: &'a S,
    codec: &'a ContainerCodec,
    known_ids: &[I],
) -> Result<Containers<'a, S>>
where
    S: AttributeStore + ?Sized,
    I: AsRef<str>,
{
    let mut nodes = BTreeSet::new();
    for id in known_ids {
        let found = store.find_nodes_by_attribute(ID_KEY, id.as_ref())?;
        debug!(id = id.as_ref(), count = found.len(), "scanned for containers");
        nodes.extend(found);
    }

    let mut keyed = nodes
        .into_iter()
        .map(|node| -> Result<(String, S::Node)> { Ok((store.node_path(&node)?, node)) })
        .collect::<Result<Vec<_>>>()?;
    keyed.sort();

    Ok(Containers {
        store,
        codec,
        known: known_ids.iter().map(|id| id.as_ref().to_string()).collect(),
        pending: keyed.into_iter(),
        failed: false,
    })
}

/// Lazily parsed containers, in discovery order.
///
/// Single pass: each item costs one store read. Parsing is validating and
/// accepts the identifiers discovery scanned for, whether or not the codec is
/// configured with them. The first failure is yielded as an error and ends
/// the sequence.
pub struct Containers<'a, S: AttributeStore + ?Sized> {
    store: &'a S,
    codec: &'a ContainerCodec,
    /// Identifiers scanned for; every discovered `id` is one of these
    known: Vec<String>,
    /// Sorted `(path, node)` pairs
    pending: std::vec::IntoIter<(String, S::Node)>,
    failed: bool,
}

impl<S: AttributeStore + ?Sized> Containers<'_, S> {
    /// Nodes not yet parsed
    pub fn remaining(&self) -> usize {
        if self.failed {
            0
        } else {
            self.pending.len()
        }
    }
}

impl<S: AttributeStore + ?Sized> Iterator for Containers<'_, S> {
    type Item = Result<Container<S::Node>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let (_, node) = self.pending.next()?;
        let known = &self.known;
        let parsed = self
            .codec
            .parse_recognising(self.store, &node, true, &|id| known.iter().any(|k| k == id));
        if let Err(err) = &parsed {
            warn!(node = ?node, error = %err, "unreadable container");
            self.failed = true;
        }
        Some(parsed)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}

impl<S: AttributeStore + ?Sized> std::iter::FusedIterator for Containers<'_, S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryScene;
    use crate::store::Attributes;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_sorted_by_path() {
        let codec = ContainerCodec::default();
        let mut scene = MemoryScene::new();
        for path in ["/obj/c", "/obj/a", "/obj/b"] {
            let node = scene.create_node(path).unwrap();
            codec
                .containerise(&mut scene, &node, path, "main", None, "rep")
                .unwrap();
        }

        let paths: Vec<String> = codec
            .ls(&scene)
            .unwrap()
            .map(|container| container.unwrap().object_name)
            .collect();
        assert_eq!(paths, vec!["/obj/a", "/obj/b", "/obj/c"]);
    }

    #[test]
    fn test_ignores_nodes_without_container_id() {
        let codec = ContainerCodec::default();
        let mut scene = MemoryScene::new();
        let instance = scene.create_node("/out/model").unwrap();
        scene
            .set_attributes(&instance, attrs(&[("id", "pipeline.instance")]))
            .unwrap();

        assert_eq!(codec.ls(&scene).unwrap().count(), 0);
    }

    #[test]
    fn test_duplicate_ids_deduplicated() {
        let codec = ContainerCodec::default();
        let mut scene = MemoryScene::new();
        let node = scene.create_node("/obj/a").unwrap();
        codec
            .containerise(&mut scene, &node, "a", "main", None, "rep")
            .unwrap();

        let ids = ["pipeline.container", "pipeline.container"];
        let found = list_containers(&scene, &codec, &ids).unwrap();
        assert_eq!(found.remaining(), 1);
        assert_eq!(found.count(), 1);
    }

    #[test]
    fn test_accepts_ids_outside_codec_table() {
        let codec = ContainerCodec::default();
        let mut scene = MemoryScene::new();
        let node = scene.create_node("/obj/ASSET_model_CON").unwrap();
        scene
            .set_attributes(
                &node,
                attrs(&[
                    ("schema", "pipeline:container-2.0"),
                    ("id", "namespace.container"),
                    ("name", "ASSET"),
                    ("namespace", "main"),
                    ("loader", "ModelLoader"),
                    ("representation", "64a1f2"),
                ]),
            )
            .unwrap();

        let found: Vec<_> = list_containers(
            &scene,
            &codec,
            &["namespace.container", "namespace.legacy_container"],
        )
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "namespace.container");
        assert_eq!(found[0].object_name, "/obj/ASSET_model_CON");
    }

    #[test]
    fn test_stops_after_first_failure() {
        let codec = ContainerCodec::default();
        let mut scene = MemoryScene::new();
        let broken = scene.create_node("/obj/a").unwrap();
        scene
            .set_attributes(&broken, attrs(&[("id", "pipeline.container")]))
            .unwrap();
        let good = scene.create_node("/obj/b").unwrap();
        codec
            .containerise(&mut scene, &good, "b", "main", None, "rep")
            .unwrap();

        let mut found = codec.ls(&scene).unwrap();
        assert!(found.next().unwrap().is_err());
        assert!(found.next().is_none());
        assert_eq!(found.remaining(), 0);
    }
}
