//! Incremental force-directed layout for bookmark graphs.
//!
//! A dataset becomes an immutable [`GraphSnapshot`], [`apply_filters`] cuts a
//! [`WorkingSubgraph`] out of it, and a frame-driven [`Scheduler`] settles that
//! subgraph under center, link and collision forces while an
//! [`InteractionController`] pins, drags, zooms and highlights.

pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod filter;
pub mod graph;
pub mod interaction;
pub mod physics;
pub mod simulation;
mod util;

pub use config::SimulationConfig;
pub use dataset::Dataset;
pub use engine::LayoutEngine;
pub use error::{DegenerateForceWarning, FilterError, GraphError, InteractionError};
pub use filter::{Filters, WorkingSubgraph, apply_filters};
pub use graph::{
    Cluster, Edge, EdgeType, GraphMetrics, GraphSnapshot, Node, NodeType, build_snapshot,
};
pub use interaction::{DragPolicy, HighlightMode, InteractionController, Viewport};
pub use simulation::{
    CommandSender, LayoutCommand, LayoutFrame, Scheduler, SchedulerState, TickReport,
};
