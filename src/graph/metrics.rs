use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use super::types::{Edge, Node};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct GraphMetrics {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub density: f32,
    pub average_degree: f32,
    pub clustering_coefficient: f32,
    pub component_count: usize,
}

impl GraphMetrics {
    /// Undirected metrics over `nodes`/`edges`. Edges whose endpoints are not
    /// in `index_by_id` are ignored.
    pub fn compute(nodes: &[Node], edges: &[Edge], index_by_id: &HashMap<String, usize>) -> Self {
        let total_nodes = nodes.len();
        let total_edges = edges.len();
        let neighbors = neighbor_sets(total_nodes, edges, index_by_id);

        let density = if total_nodes < 2 {
            0.0
        } else {
            let max_edges = (total_nodes * (total_nodes - 1)) as f64 / 2.0;
            (total_edges as f64 / max_edges) as f32
        };

        let average_degree = if total_nodes == 0 {
            0.0
        } else {
            (2.0 * total_edges as f64 / total_nodes as f64) as f32
        };

        Self {
            total_nodes,
            total_edges,
            density,
            average_degree,
            clustering_coefficient: average_clustering(&neighbors),
            component_count: component_count(&neighbors),
        }
    }
}

fn neighbor_sets(
    node_count: usize,
    edges: &[Edge],
    index_by_id: &HashMap<String, usize>,
) -> Vec<HashSet<usize>> {
    let mut neighbors = vec![HashSet::new(); node_count];
    for edge in edges {
        if let (Some(&source), Some(&target)) =
            (index_by_id.get(&edge.source), index_by_id.get(&edge.target))
            && source != target
        {
            neighbors[source].insert(target);
            neighbors[target].insert(source);
        }
    }
    neighbors
}

fn average_clustering(neighbors: &[HashSet<usize>]) -> f32 {
    if neighbors.is_empty() {
        return 0.0;
    }

    let mut total = 0.0_f64;
    for adjacent in neighbors {
        let degree = adjacent.len();
        if degree < 2 {
            continue;
        }

        let adjacent = adjacent.iter().copied().collect::<Vec<_>>();
        let mut links = 0usize;
        for (offset, &first) in adjacent.iter().enumerate() {
            for &second in &adjacent[offset + 1..] {
                if neighbors[first].contains(&second) {
                    links += 1;
                }
            }
        }

        let possible = (degree * (degree - 1)) as f64 / 2.0;
        total += links as f64 / possible;
    }

    (total / neighbors.len() as f64) as f32
}

fn component_count(neighbors: &[HashSet<usize>]) -> usize {
    let mut visited = vec![false; neighbors.len()];
    let mut components = 0;

    for start in 0..neighbors.len() {
        if visited[start] {
            continue;
        }
        components += 1;
        visited[start] = true;

        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for &next in &neighbors[current] {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
    }

    components
}
