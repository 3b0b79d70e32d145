//! World definition - the immutable node graph and its catalogs.
//!
//! The graph is declared in `world.toml`, embedded at compile time and parsed
//! once at startup. Loading validates the data so the rest of the engine can
//! trust every cross-reference it finds.

mod gate;
mod node;

pub use gate::*;
pub use node::*;

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Node id every fresh state starts at.
pub const START_NODE: &str = "hub.home";

/// Errors raised while loading or querying the world definition.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("world definition failed to parse: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("start node hub.home is missing")]
    MissingStart,

    #[error("start node hub.home must be ungated")]
    GatedStart,

    #[error("node {node} references unknown {kind}: {target}")]
    DanglingReference {
        node: String,
        kind: &'static str,
        target: String,
    },

    #[error("unknown node: {0}")]
    UnknownNode(String),
}

/// Raw document shape of `world.toml`.
#[derive(Debug, Deserialize)]
struct WorldDoc {
    #[serde(default)]
    items: BTreeMap<String, String>,
    #[serde(default)]
    scripts: BTreeMap<String, String>,
    #[serde(default)]
    nodes: Vec<Node>,
}

/// The complete, validated narrative graph.
#[derive(Debug, Clone)]
pub struct World {
    nodes: HashMap<String, Node>,
    items: BTreeMap<String, String>,
    scripts: BTreeMap<String, String>,
}

impl World {
    /// Parse and validate the embedded world definition.
    pub fn load() -> Result<Self, WorldError> {
        Self::from_toml(include_str!("world.toml"))
    }

    /// Parse and validate a world definition from TOML source.
    pub fn from_toml(source: &str) -> Result<Self, WorldError> {
        let doc: WorldDoc = toml::from_str(source)?;

        let mut nodes = HashMap::with_capacity(doc.nodes.len());
        for node in doc.nodes {
            if nodes.contains_key(&node.id) {
                return Err(WorldError::DuplicateNode(node.id));
            }
            nodes.insert(node.id.clone(), node);
        }

        let world = World {
            nodes,
            items: doc.items,
            scripts: doc.scripts,
        };
        world.validate()?;
        Ok(world)
    }

    /// Check every cross-reference in the graph.
    fn validate(&self) -> Result<(), WorldError> {
        let start = self.nodes.get(START_NODE).ok_or(WorldError::MissingStart)?;
        if !start.entry.is_open() {
            return Err(WorldError::GatedStart);
        }

        for node in self.nodes.values() {
            let dangling = |kind: &'static str, target: &str| WorldError::DanglingReference {
                node: node.id.clone(),
                kind,
                target: target.to_string(),
            };

            for link in &node.links {
                if !self.nodes.contains_key(link) {
                    return Err(dangling("link", link));
                }
            }
            for item in &node.entry.items {
                if !self.items.contains_key(item) {
                    return Err(dangling("entry item", item));
                }
            }
            for file in &node.files {
                match file.kind {
                    FileKind::Script => {
                        let id = file.script_id.as_deref().unwrap_or("");
                        if !self.scripts.contains_key(id) {
                            return Err(dangling("script", id));
                        }
                    }
                    FileKind::Item => {
                        let id = file.item_id.as_deref().unwrap_or("");
                        if !self.items.contains_key(id) {
                            return Err(dangling("item", id));
                        }
                    }
                    FileKind::Text => {}
                }
            }
        }
        Ok(())
    }

    /// Get a node by id.
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a node by id, erroring on unknown ids.
    pub fn node(&self, id: &str) -> Result<&Node, WorldError> {
        self.nodes
            .get(id)
            .ok_or_else(|| WorldError::UnknownNode(id.to_string()))
    }

    /// Whether a node id exists in the graph.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Catalog blurb for an item id.
    pub fn item_blurb(&self, id: &str) -> Option<&str> {
        self.items.get(id).map(String::as_str)
    }

    /// Catalog blurb for a script id.
    pub fn script_blurb(&self, id: &str) -> Option<&str> {
        self.scripts.get(id).map(String::as_str)
    }

    /// All item ids in the catalog.
    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// All script ids in the catalog.
    pub fn script_ids(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }
}
