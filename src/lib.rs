//! Scene Containers
//!
//! Tracks the provenance of assets loaded into host scene graphs. Loading an
//! asset stamps a *container* record onto a node; later tooling discovers
//! every container in the scene and reads back what was loaded, from which
//! representation, by which loader and under which namespace.
//!
//! ## Architecture
//!
//! ```text
//! discovery  ──► codec ──► registry ──► schema
//!                  │
//!                  └─────► store (AttributeStore, implemented by hosts)
//! ```
//!
//! - **store**: the host contract, a flat string attribute map per node
//! - **registry**: ordered schema lineage with one-step migrations
//! - **codec**: imprint records onto nodes, parse them back at the current schema
//! - **discovery**: deterministic, lazy scan of every container in a scene
//!
//! ## Example
//!
//! ```
//! use scene_containers::{ContainerCodec, MemoryScene};
//!
//! let codec = ContainerCodec::default();
//! let mut scene = MemoryScene::new();
//! let node = scene.create_node("/obj/ASSET_model_CON").unwrap();
//!
//! let record = codec.new_record("ASSET", "main", Some("ModelLoader"), "64a1f2");
//! codec.imprint(&mut scene, &node, &record).unwrap();
//!
//! let found: Vec<_> = codec.ls(&scene).unwrap().collect::<Result<_, _>>().unwrap();
//! assert_eq!(found[0].record, record);
//! assert_eq!(found[0].object_name, "/obj/ASSET_model_CON");
//! ```

pub mod codec;
pub mod config;
pub mod discovery;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod record;
pub mod registry;
pub mod schema;
pub mod selection;
pub mod store;

pub use codec::ContainerCodec;
pub use config::ContainerConfig;
pub use discovery::{list_containers, Containers};
pub use error::{ContainerError, Result, SchemaError, StoreError, ValidationError};
pub use lifecycle::{HostEvent, HostIntegration};
pub use memory::{MemoryScene, NodeId};
pub use record::{Container, ContainerIds, ContainerRecord};
pub use registry::SchemaRegistry;
pub use schema::{FieldRule, Migration, SchemaDefinition, SchemaId};
pub use selection::{maintained_selection, Selection};
pub use store::{AttributeStore, Attributes};
