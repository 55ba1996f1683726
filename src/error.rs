use std::fmt;

use eframe::egui::Vec2;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("edge {edge_id} references missing node {node_id}")]
    DanglingEdge { edge_id: String, node_id: String },

    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("duplicate edge id: {0}")]
    DuplicateEdge(String),

    #[error("node {node_id} has invalid size {size}; sizes must be positive and finite")]
    InvalidNodeSize { node_id: String, size: f32 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid connection range: min {min} exceeds max {max}")]
    InvalidRange { min: usize, max: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InteractionError {
    #[error("zoom must be positive and finite, got {0}")]
    InvalidZoom(f32),

    #[error("pan offset must be finite")]
    NonFinitePan,

    #[error("coordinates for node {node_id} must be finite")]
    NonFiniteCoordinates { node_id: String },

    #[error("scheduler is stopped; start a new run before sending commands")]
    SchedulerStopped,

    #[error("scheduler is no longer receiving commands")]
    SchedulerDropped,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct ParseKindError {
    pub kind: &'static str,
    pub value: String,
}

/// A node whose position or velocity went non-finite during a tick and was
/// restored in place. Reported, never raised.
#[derive(Clone, Debug, PartialEq)]
pub struct DegenerateForceWarning {
    pub node_id: String,
    pub tick: u64,
    pub restored_position: Vec2,
}

impl fmt::Display for DegenerateForceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node {} went non-finite at tick {}; restored to ({:.2}, {:.2})",
            self.node_id, self.tick, self.restored_position.x, self.restored_position.y
        )
    }
}
