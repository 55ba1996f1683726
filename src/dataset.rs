use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::graph::{Edge, GraphSnapshot, Node, build_snapshot};

/// Raw node/edge lists as supplied by the host application. Unknown top-level
/// keys (precomputed clusters, metrics) are ignored; both are derived.
#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Dataset {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid dataset JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read dataset {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn into_snapshot(self) -> Result<GraphSnapshot> {
        build_snapshot(self.nodes, self.edges).context("dataset does not form a valid graph")
    }
}
