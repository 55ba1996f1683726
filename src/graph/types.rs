use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use eframe::egui::{Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::ParseKindError;

use super::metrics::GraphMetrics;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Bookmark,
    Category,
    Tag,
    Domain,
    User,
}

impl NodeType {
    pub const ALL: [Self; 5] = [
        Self::Bookmark,
        Self::Category,
        Self::Tag,
        Self::Domain,
        Self::User,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Bookmark => "bookmark",
            Self::Category => "category",
            Self::Tag => "tag",
            Self::Domain => "domain",
            Self::User => "user",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NodeType {
    type Err = ParseKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ParseKindError {
                kind: "node type",
                value: value.to_owned(),
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Related,
    Tagged,
    Categorized,
    VisitedTogether,
    SimilarContent,
}

impl EdgeType {
    pub const ALL: [Self; 5] = [
        Self::Related,
        Self::Tagged,
        Self::Categorized,
        Self::VisitedTogether,
        Self::SimilarContent,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Related => "related",
            Self::Tagged => "tagged",
            Self::Categorized => "categorized",
            Self::VisitedTogether => "visited_together",
            Self::SimilarContent => "similar_content",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EdgeType {
    type Err = ParseKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| ParseKindError {
                kind: "edge type",
                value: value.to_owned(),
            })
    }
}

fn default_size() -> f32 {
    8.0
}

fn default_unit() -> f32 {
    0.5
}

fn default_strength() -> f32 {
    1.0
}

/// A graph vertex. Position fields are optional on input; the scheduler seeds
/// whatever is missing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_size")]
    pub size: f32,
    #[serde(default = "default_unit")]
    pub importance: f32,
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub connections: usize,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub vx: f32,
    #[serde(default)]
    pub vy: f32,
    #[serde(default)]
    pub fx: Option<f32>,
    #[serde(default)]
    pub fy: Option<f32>,
    #[serde(default, skip_deserializing)]
    pub highlighted: bool,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            node_type,
            size: default_size(),
            importance: default_unit(),
            cluster: None,
            connections: 0,
            x: None,
            y: None,
            vx: 0.0,
            vy: 0.0,
            fx: None,
            fy: None,
            highlighted: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_pin(mut self, x: f32, y: f32) -> Self {
        self.fx = Some(x);
        self.fy = Some(y);
        self
    }

    /// Current position when both coordinates are present and finite.
    pub fn position(&self) -> Option<Vec2> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some(Vec2::new(x, y)),
            _ => None,
        }
    }

    /// Pin point when both coordinates are present and finite.
    pub fn pin(&self) -> Option<Vec2> {
        match (self.fx, self.fy) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some(Vec2::new(x, y)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    #[serde(default = "default_unit")]
    pub weight: f32,
    #[serde(default = "default_strength")]
    pub strength: f32,
    #[serde(default)]
    pub bidirectional: bool,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        edge_type: EdgeType,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            edge_type,
            weight: default_unit(),
            strength: default_strength(),
            bidirectional: false,
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    pub id: String,
    pub label: String,
    pub nodes: Vec<String>,
    pub bounds: Option<Rect>,
    pub density: f32,
    pub centrality: f32,
}

#[derive(Clone, Debug)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub clusters: Vec<Cluster>,
    pub metrics: GraphMetrics,
    pub(crate) index_by_id: HashMap<String, usize>,
}

impl GraphSnapshot {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    pub fn cluster(&self, id: &str) -> Option<&Cluster> {
        self.clusters.iter().find(|cluster| cluster.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("Bookmark".parse::<NodeType>(), Ok(NodeType::Bookmark));
        assert_eq!(
            "visited-together".parse::<EdgeType>(),
            Ok(EdgeType::VisitedTogether)
        );
        assert!("folder".parse::<NodeType>().is_err());
    }

    #[test]
    fn node_deserializes_with_defaults() {
        let node: Node =
            serde_json::from_str(r#"{"id":"b1","type":"bookmark","label":"Rust"}"#).unwrap();
        assert_eq!(node.node_type, NodeType::Bookmark);
        assert_eq!(node.size, 8.0);
        assert_eq!(node.position(), None);
        assert_eq!(node.pin(), None);
    }

    #[test]
    fn partial_pin_is_not_a_pin() {
        let mut node = Node::new("a", NodeType::Tag);
        node.fx = Some(3.0);
        assert_eq!(node.pin(), None);

        let node = node.with_pin(3.0, f32::NAN);
        assert_eq!(node.pin(), None);
    }

    #[test]
    fn edge_type_serializes_snake_case() {
        let edge = Edge::new("e", "a", "b", EdgeType::SimilarContent);
        let json = serde_json::to_string(&edge).unwrap();
        assert!(json.contains("\"similar_content\""));
    }
}
