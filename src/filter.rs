use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FilterError;
use crate::graph::{
    Edge, EdgeType, GraphMetrics, GraphSnapshot, Node, NodeType, assign_connections,
    degree_counts,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub node_types: BTreeSet<NodeType>,
    pub edge_types: BTreeSet<EdgeType>,
    pub min_connections: usize,
    pub max_connections: Option<usize>,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            node_types: NodeType::ALL.into_iter().collect(),
            edge_types: EdgeType::ALL.into_iter().collect(),
            min_connections: 0,
            max_connections: None,
        }
    }
}

impl Filters {
    pub fn with_node_types(mut self, types: impl IntoIterator<Item = NodeType>) -> Self {
        self.node_types = types.into_iter().collect();
        self
    }

    pub fn with_edge_types(mut self, types: impl IntoIterator<Item = EdgeType>) -> Self {
        self.edge_types = types.into_iter().collect();
        self
    }

    pub fn with_connections(mut self, min: usize, max: Option<usize>) -> Self {
        self.min_connections = min;
        self.max_connections = max;
        self
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        match self.max_connections {
            Some(max) if self.min_connections > max => Err(FilterError::InvalidRange {
                min: self.min_connections,
                max,
            }),
            _ => Ok(()),
        }
    }

    fn admits_degree(&self, degree: usize) -> bool {
        degree >= self.min_connections && self.max_connections.is_none_or(|max| degree <= max)
    }
}

/// The filtered node/edge set handed to the simulation. Always a fresh copy;
/// the snapshot is never touched.
#[derive(Clone, Debug, Default)]
pub struct WorkingSubgraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub metrics: GraphMetrics,
    pub(crate) index_by_id: HashMap<String, usize>,
}

impl WorkingSubgraph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Edges are filtered first; node degrees are then taken over the surviving
/// edges, so the connection range sees post-filter counts.
pub fn apply_filters(
    snapshot: &GraphSnapshot,
    filters: &Filters,
) -> Result<WorkingSubgraph, FilterError> {
    filters.validate()?;

    let type_selected = snapshot
        .nodes
        .iter()
        .map(|node| filters.node_types.contains(&node.node_type))
        .collect::<Vec<_>>();
    let endpoint_selected = |id: &str| {
        snapshot
            .index_by_id
            .get(id)
            .is_some_and(|&index| type_selected[index])
    };

    let typed_edges = snapshot
        .edges
        .iter()
        .filter(|edge| {
            filters.edge_types.contains(&edge.edge_type)
                && endpoint_selected(&edge.source)
                && endpoint_selected(&edge.target)
        })
        .cloned()
        .collect::<Vec<_>>();

    let degrees = degree_counts(snapshot.nodes.len(), &typed_edges, &snapshot.index_by_id);

    let mut nodes = Vec::new();
    let mut index_by_id = HashMap::new();
    for (index, node) in snapshot.nodes.iter().enumerate() {
        if type_selected[index] && filters.admits_degree(degrees[index]) {
            index_by_id.insert(node.id.clone(), nodes.len());
            nodes.push(node.clone());
        }
    }

    let edges = typed_edges
        .into_iter()
        .filter(|edge| {
            index_by_id.contains_key(&edge.source) && index_by_id.contains_key(&edge.target)
        })
        .collect::<Vec<_>>();

    assign_connections(&mut nodes, &edges, &index_by_id);
    let metrics = GraphMetrics::compute(&nodes, &edges, &index_by_id);

    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        "applied filters to snapshot"
    );

    Ok(WorkingSubgraph {
        nodes,
        edges,
        metrics,
        index_by_id,
    })
}
