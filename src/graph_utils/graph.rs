use std::collections::{BTreeMap, HashMap};

use egui::Color32;
use glam::Vec3;
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// Basic type aliases for clarity
pub type EntityId = String;
pub type Properties = Map<String, Value>;

pub const DOCUMENT_TYPE: &str = "Document";
pub const CHUNK_TYPE: &str = "Chunk";
pub const DEFAULT_LINK_TYPE: &str = "connects";
pub const CONTAINS_LINK_TYPE: &str = "contains";
pub const NEXT_LINK_TYPE: &str = "next";

const DOCUMENT_SIZE: f32 = 2.0;
const DEFAULT_SIZE: f32 = 1.0;

pub const DEFAULT_NODE_COLOR: Color32 = Color32::from_rgb(0x9e, 0x9e, 0x9e);

// Display color per entity type; anything else falls back to DEFAULT_NODE_COLOR.
static TYPE_PALETTE: Lazy<HashMap<&'static str, Color32>> = Lazy::new(|| {
    HashMap::from([
        (DOCUMENT_TYPE, Color32::from_rgb(0x42, 0x85, 0xf4)), // blue
        (CHUNK_TYPE, Color32::from_rgb(0x34, 0xa8, 0x53)),    // green
        ("Entity", Color32::from_rgb(0xfb, 0xbc, 0x04)),      // amber
        ("Concept", Color32::from_rgb(0xea, 0x43, 0x35)),     // red
        ("Person", Color32::from_rgb(0xa3, 0x7b, 0xff)),      // violet
        ("Organization", Color32::from_rgb(0xff, 0x7b, 0xe0)), // magenta
        ("Location", Color32::from_rgb(0x7b, 0xe0, 0xff)),    // cyan
    ])
});

pub fn color_for_type(entity_type: &str) -> Color32 {
    TYPE_PALETTE.get(entity_type).copied().unwrap_or(DEFAULT_NODE_COLOR)
}

pub fn size_for_type(entity_type: &str) -> f32 {
    if entity_type == DOCUMENT_TYPE { DOCUMENT_SIZE } else { DEFAULT_SIZE }
}

// Exported JSON often writes `null` for an absent field; treat it the same
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: EntityId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub entity_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Properties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_doc: Option<String>,
}

impl Entity {
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Parent document id, if any. Numeric ids are accepted and rendered as text.
    pub fn document_id(&self) -> Option<String> {
        match self.property("document_id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Ordering key within a document; missing or non-numeric values count as 0.
    pub fn chunk_index(&self) -> f64 {
        match self.property("chunk_index") {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn is_chunk(&self) -> bool {
        self.entity_type == CHUNK_TYPE
    }

    // Label if present, else the id
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() { &self.id } else { &self.label }
    }
}

fn default_link_type() -> String {
    DEFAULT_LINK_TYPE.to_string()
}

fn link_type_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_link_type))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: EntityId,
    pub target: EntityId,
    #[serde(rename = "type", default = "default_link_type", deserialize_with = "link_type_or_default")]
    pub rel_type: String,
}

impl Relationship {
    pub fn new(source: impl Into<String>, target: impl Into<String>, rel_type: impl Into<String>) -> Self {
        Self { source: source.into(), target: target.into(), rel_type: rel_type.into() }
    }
}

/// Raw document as served by the data source. Both arrays are optional.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub entities: Vec<Entity>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relationships: Vec<Relationship>,
}

impl GraphDocument {
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// Per-node visual emphasis. Only `SelectionState` changes this after load.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NodeVisual {
    pub scale: f32,
    pub emissive: f32,
}

impl NodeVisual {
    pub const BASELINE: NodeVisual = NodeVisual { scale: 1.0, emissive: 0.0 };
    pub const HIGHLIGHT: NodeVisual = NodeVisual { scale: 1.5, emissive: 0.6 };

    pub fn is_highlighted(&self) -> bool {
        *self != Self::BASELINE
    }
}

impl Default for NodeVisual {
    fn default() -> Self { Self::BASELINE }
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub entity: Entity,
    pub position: Vec3,
    pub color: Color32,
    pub size: f32,
    pub visual: NodeVisual,
}

impl SceneNode {
    pub fn from_entity(entity: Entity) -> Self {
        let color = color_for_type(&entity.entity_type);
        let size = size_for_type(&entity.entity_type);
        Self { entity, position: Vec3::ZERO, color, size, visual: NodeVisual::BASELINE }
    }

    pub fn id(&self) -> &str {
        &self.entity.id
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneLink {
    pub source: usize,
    pub target: usize,
    pub relationship: Relationship,
}

#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    pub nodes: Vec<SceneNode>,
    pub links: Vec<SceneLink>,
    index: HashMap<EntityId, usize>,
}

impl SceneGraph {
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node(&self, idx: usize) -> Option<&SceneNode> {
        self.nodes.get(idx)
    }

    pub fn node_by_id(&self, id: &str) -> Option<&SceneNode> {
        self.node_index(id).and_then(|i| self.nodes.get(i))
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn link_count(&self) -> usize { self.links.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Current world-space endpoints of a link.
    pub fn link_endpoints(&self, link: &SceneLink) -> Option<(Vec3, Vec3)> {
        let a = self.nodes.get(link.source)?;
        let b = self.nodes.get(link.target)?;
        Some((a.position, b.position))
    }

    pub fn highlighted_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.visual.is_highlighted()).count()
    }

    // Sorted so the stats panel stays stable between frames
    pub fn type_counts(&self) -> BTreeMap<String, usize> {
        let mut out = BTreeMap::new();
        for n in &self.nodes {
            *out.entry(n.entity.entity_type.clone()).or_insert(0) += 1;
        }
        out
    }

    /// Center and radius of the sphere enclosing all node positions.
    pub fn bounds(&self) -> Option<(Vec3, f32)> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for n in &self.nodes {
            min = min.min(n.position);
            max = max.max(n.position);
        }
        let center = (min + max) * 0.5;
        let radius = self
            .nodes
            .iter()
            .map(|n| n.position.distance(center))
            .fold(0.0_f32, f32::max);
        Some((center, radius))
    }
}

/// Synthesize links for a document that ships without relationships:
/// `contains` from each entity's parent document, then `next` between
/// consecutive chunks of the same document ordered by `chunk_index`.
pub fn synthesize_links(entities: &[Entity]) -> Vec<Relationship> {
    let mut links = Vec::new();

    for e in entities {
        if let Some(doc) = e.document_id() {
            links.push(Relationship::new(doc, e.id.clone(), CONTAINS_LINK_TYPE));
        }
    }

    // Groups keep first-seen document order so output is deterministic
    let mut group_order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&Entity>> = HashMap::new();
    for e in entities.iter().filter(|e| e.is_chunk()) {
        let Some(doc) = e.document_id() else { continue };
        let group = groups.entry(doc.clone()).or_insert_with(|| {
            group_order.push(doc);
            Vec::new()
        });
        group.push(e);
    }

    for doc in &group_order {
        let Some(chunks) = groups.get_mut(doc) else { continue };
        // stable: equal indices keep document order
        chunks.sort_by(|a, b| a.chunk_index().total_cmp(&b.chunk_index()));
        for pair in chunks.windows(2) {
            links.push(Relationship::new(pair[0].id.clone(), pair[1].id.clone(), NEXT_LINK_TYPE));
        }
    }

    links
}

/// Normalize a raw document into scene nodes and resolved links.
/// Positions are left at the origin; run a layout afterwards.
pub fn build_scene_graph(doc: &GraphDocument) -> SceneGraph {
    let mut graph = SceneGraph::default();

    for entity in &doc.entities {
        if graph.index.contains_key(&entity.id) {
            log::warn!("duplicate entity id {:?} skipped", entity.id);
            continue;
        }
        graph.index.insert(entity.id.clone(), graph.nodes.len());
        graph.nodes.push(SceneNode::from_entity(entity.clone()));
    }

    let relationships = if doc.relationships.is_empty() {
        synthesize_links(&doc.entities)
    } else {
        doc.relationships.clone()
    };

    let mut dropped = 0usize;
    for rel in relationships {
        match (graph.node_index(&rel.source), graph.node_index(&rel.target)) {
            (Some(source), Some(target)) => graph.links.push(SceneLink { source, target, relationship: rel }),
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        log::debug!("dropped {} links with unresolved endpoints", dropped);
    }

    graph
}
