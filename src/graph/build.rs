use std::collections::{BTreeMap, HashMap, HashSet};

use eframe::egui::{Pos2, Rect};
use tracing::debug;

use crate::error::GraphError;
use crate::util::unit_interval;

use super::metrics::GraphMetrics;
use super::types::{Cluster, Edge, GraphSnapshot, Node};

/// Validates the dataset and derives connections, clusters and metrics.
pub fn build_snapshot(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<GraphSnapshot, GraphError> {
    let mut index_by_id = HashMap::with_capacity(nodes.len());
    for (index, node) in nodes.iter().enumerate() {
        if !(node.size.is_finite() && node.size > 0.0) {
            return Err(GraphError::InvalidNodeSize {
                node_id: node.id.clone(),
                size: node.size,
            });
        }
        if index_by_id.insert(node.id.clone(), index).is_some() {
            return Err(GraphError::DuplicateNode(node.id.clone()));
        }
    }

    let mut edge_ids = HashSet::with_capacity(edges.len());
    for edge in &edges {
        for endpoint in [&edge.source, &edge.target] {
            if !index_by_id.contains_key(endpoint) {
                return Err(GraphError::DanglingEdge {
                    edge_id: edge.id.clone(),
                    node_id: endpoint.clone(),
                });
            }
        }
        if !edge_ids.insert(edge.id.as_str()) {
            return Err(GraphError::DuplicateEdge(edge.id.clone()));
        }
    }

    let mut nodes = nodes;
    for node in &mut nodes {
        node.importance = unit_interval(node.importance);
        if node.label.is_empty() {
            node.label = node.id.clone();
        }
        if !(node.vx.is_finite() && node.vy.is_finite()) {
            node.vx = 0.0;
            node.vy = 0.0;
        }
        node.highlighted = false;
    }

    let edges = edges
        .into_iter()
        .map(|mut edge| {
            edge.weight = unit_interval(edge.weight);
            edge.strength = unit_interval(edge.strength);
            edge
        })
        .collect::<Vec<_>>();

    assign_connections(&mut nodes, &edges, &index_by_id);
    let clusters = derive_clusters(&nodes, &edges, &index_by_id);
    let metrics = GraphMetrics::compute(&nodes, &edges, &index_by_id);

    debug!(
        nodes = metrics.total_nodes,
        edges = metrics.total_edges,
        clusters = clusters.len(),
        "built graph snapshot"
    );

    Ok(GraphSnapshot {
        nodes,
        edges,
        clusters,
        metrics,
        index_by_id,
    })
}

/// Edges referencing each node; a self-loop counts once.
pub(crate) fn degree_counts(
    node_count: usize,
    edges: &[Edge],
    index_by_id: &HashMap<String, usize>,
) -> Vec<usize> {
    let mut degrees = vec![0usize; node_count];
    for edge in edges {
        let source = index_by_id.get(&edge.source).copied();
        let target = index_by_id.get(&edge.target).copied();
        if let Some(source) = source {
            degrees[source] += 1;
        }
        if let Some(target) = target
            && source != Some(target)
        {
            degrees[target] += 1;
        }
    }
    degrees
}

pub(crate) fn assign_connections(
    nodes: &mut [Node],
    edges: &[Edge],
    index_by_id: &HashMap<String, usize>,
) {
    let degrees = degree_counts(nodes.len(), edges, index_by_id);
    for (node, degree) in nodes.iter_mut().zip(degrees) {
        node.connections = degree;
    }
}

fn derive_clusters(
    nodes: &[Node],
    edges: &[Edge],
    index_by_id: &HashMap<String, usize>,
) -> Vec<Cluster> {
    let mut members: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, node) in nodes.iter().enumerate() {
        if let Some(cluster) = node.cluster.as_deref() {
            members.entry(cluster).or_default().push(index);
        }
    }

    let total_endpoints = edges.len() * 2;
    members
        .into_iter()
        .map(|(cluster_id, indices)| {
            let member_set = indices.iter().copied().collect::<HashSet<_>>();

            let mut internal_edges = 0usize;
            let mut endpoints_inside = 0usize;
            for edge in edges {
                let source = index_by_id.get(&edge.source);
                let target = index_by_id.get(&edge.target);
                let source_inside = source.is_some_and(|index| member_set.contains(index));
                let target_inside = target.is_some_and(|index| member_set.contains(index));
                endpoints_inside += usize::from(source_inside) + usize::from(target_inside);
                if source_inside && target_inside && source != target {
                    internal_edges += 1;
                }
            }

            let size = indices.len();
            let density = if size < 2 {
                0.0
            } else {
                internal_edges as f32 / ((size * (size - 1)) as f32 / 2.0)
            };
            let centrality = if total_endpoints == 0 {
                0.0
            } else {
                endpoints_inside as f32 / total_endpoints as f32
            };

            let points = indices
                .iter()
                .filter_map(|&index| nodes[index].position())
                .map(|position| Pos2::new(position.x, position.y))
                .collect::<Vec<_>>();
            let bounds = (!points.is_empty()).then(|| Rect::from_points(&points));

            let label = index_by_id
                .get(cluster_id)
                .map(|&index| nodes[index].label.clone())
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| cluster_id.to_owned());

            Cluster {
                id: cluster_id.to_owned(),
                label,
                nodes: indices.iter().map(|&index| nodes[index].id.clone()).collect(),
                bounds,
                density,
                centrality,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeType, NodeType};

    fn sample() -> (Vec<Node>, Vec<Edge>) {
        let nodes = vec![
            Node::new("rust", NodeType::Category).with_label("Rust"),
            Node::new("b1", NodeType::Bookmark)
                .with_cluster("rust")
                .with_position(0.0, 0.0),
            Node::new("b2", NodeType::Bookmark)
                .with_cluster("rust")
                .with_position(10.0, 4.0),
            Node::new("t1", NodeType::Tag).with_cluster("misc"),
        ];
        let edges = vec![
            Edge::new("e1", "b1", "b2", EdgeType::Related).with_weight(4.0),
            Edge::new("e2", "b1", "rust", EdgeType::Categorized),
            Edge::new("e3", "b2", "t1", EdgeType::Tagged).with_strength(f32::NAN),
        ];
        (nodes, edges)
    }

    #[test]
    fn dangling_edge_names_the_edge() {
        let (nodes, mut edges) = sample();
        edges.push(Edge::new("broken", "b1", "ghost", EdgeType::Related));

        let error = build_snapshot(nodes, edges).unwrap_err();
        assert_eq!(
            error,
            GraphError::DanglingEdge {
                edge_id: "broken".to_owned(),
                node_id: "ghost".to_owned(),
            }
        );
        assert!(error.to_string().contains("broken"));
    }

    #[test]
    fn duplicates_and_bad_sizes_are_rejected() {
        let (mut nodes, edges) = sample();
        nodes.push(Node::new("b1", NodeType::Bookmark));
        assert_eq!(
            build_snapshot(nodes, edges).unwrap_err(),
            GraphError::DuplicateNode("b1".to_owned())
        );

        let (nodes, mut edges) = sample();
        edges.push(Edge::new("e1", "b2", "rust", EdgeType::Related));
        assert_eq!(
            build_snapshot(nodes, edges).unwrap_err(),
            GraphError::DuplicateEdge("e1".to_owned())
        );

        let (mut nodes, edges) = sample();
        nodes[0].size = 0.0;
        assert!(matches!(
            build_snapshot(nodes, edges),
            Err(GraphError::InvalidNodeSize { .. })
        ));
    }

    #[test]
    fn connections_and_clamping() {
        let (nodes, edges) = sample();
        let snapshot = build_snapshot(nodes, edges).unwrap();

        assert_eq!(snapshot.node("b1").unwrap().connections, 2);
        assert_eq!(snapshot.node("b2").unwrap().connections, 2);
        assert_eq!(snapshot.node("rust").unwrap().connections, 1);
        assert_eq!(snapshot.node("t1").unwrap().connections, 1);
        assert_eq!(snapshot.edge("e1").unwrap().weight, 1.0);
        assert_eq!(snapshot.edge("e3").unwrap().strength, 0.0);
    }

    #[test]
    fn self_loop_counts_once() {
        let nodes = vec![Node::new("a", NodeType::Tag)];
        let edges = vec![Edge::new("aa", "a", "a", EdgeType::Related)];
        let snapshot = build_snapshot(nodes, edges).unwrap();
        assert_eq!(snapshot.node("a").unwrap().connections, 1);
    }

    #[test]
    fn clusters_are_derived() {
        let (nodes, edges) = sample();
        let snapshot = build_snapshot(nodes, edges).unwrap();

        let rust = snapshot.cluster("rust").unwrap();
        assert_eq!(rust.label, "Rust");
        assert_eq!(rust.nodes, vec!["b1".to_owned(), "b2".to_owned()]);
        assert_eq!(rust.density, 1.0);
        // b1 twice, b2 twice out of six endpoints
        assert!((rust.centrality - 4.0 / 6.0).abs() < 1e-6);
        let bounds = rust.bounds.unwrap();
        assert_eq!(bounds.min, Pos2::new(0.0, 0.0));
        assert_eq!(bounds.max, Pos2::new(10.0, 4.0));

        let misc = snapshot.cluster("misc").unwrap();
        assert_eq!(misc.label, "misc");
        assert!(misc.bounds.is_none());
    }

    #[test]
    fn rebuilding_is_pure() {
        let (nodes, edges) = sample();
        let first = build_snapshot(nodes.clone(), edges.clone()).unwrap();
        let second = build_snapshot(nodes, edges).unwrap();
        assert_eq!(first.nodes, second.nodes);
        assert_eq!(first.metrics, second.metrics);
    }
}
