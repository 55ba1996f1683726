mod build;
mod metrics;
mod types;

pub use build::build_snapshot;
pub(crate) use build::{assign_connections, degree_counts};
pub use metrics::GraphMetrics;
pub use types::{Cluster, Edge, EdgeType, GraphSnapshot, Node, NodeType};
