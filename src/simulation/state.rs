use std::collections::HashMap;

use eframe::egui::{Pos2, Vec2, vec2};
use tracing::{trace, warn};

use crate::error::DegenerateForceWarning;
use crate::filter::WorkingSubgraph;
use crate::graph::Node;
use crate::physics::{ForceConfig, SimLink, SimNode};
use crate::util::stable_pair;

use super::commands::LayoutCommand;

/// Coordinates are kept inside this box so forces cannot overflow.
pub(super) const WORLD_LIMIT: f32 = 1.0e6;

const GOLDEN_ANGLE: f32 = 2.399_963;

pub(super) fn clamp_to_world(position: Vec2) -> Vec2 {
    position.clamp(
        vec2(-WORLD_LIMIT, -WORLD_LIMIT),
        vec2(WORLD_LIMIT, WORLD_LIMIT),
    )
}

/// Mutable per-run state for one working subgraph.
pub(super) struct LayoutState {
    pub(super) subgraph: WorkingSubgraph,
    pub(super) nodes: Vec<SimNode>,
    pub(super) links: Vec<SimLink>,
    pub(super) last_finite: Vec<Vec2>,
    pub(super) highlighted: Vec<bool>,
}

impl LayoutState {
    pub(super) fn seed(
        subgraph: WorkingSubgraph,
        forces: &ForceConfig,
        seed: u64,
        spacing: f32,
    ) -> Self {
        let center = forces.center();
        let spacing = if spacing.is_finite() && spacing > 0.0 {
            spacing
        } else {
            20.0
        };

        let nodes = subgraph
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let pin = node.pin().map(clamp_to_world);
                let world_pos = pin
                    .or_else(|| node.position().map(clamp_to_world))
                    .unwrap_or_else(|| seeded_position(index, &node.id, center, seed, spacing));
                let velocity = if pin.is_none() && node.vx.is_finite() && node.vy.is_finite() {
                    vec2(node.vx, node.vy)
                } else {
                    Vec2::ZERO
                };

                SimNode {
                    world_pos,
                    velocity,
                    radius: node.size,
                    pin,
                }
            })
            .collect::<Vec<_>>();

        let links = subgraph
            .edges
            .iter()
            .filter_map(|edge| {
                let source = *subgraph.index_by_id.get(&edge.source)?;
                let target = *subgraph.index_by_id.get(&edge.target)?;
                Some(SimLink {
                    source,
                    target,
                    rest_length: forces.rest_length(edge.weight),
                    strength: edge.strength,
                })
            })
            .collect::<Vec<_>>();

        let last_finite = nodes.iter().map(|node| node.world_pos).collect();
        let highlighted = subgraph.nodes.iter().map(|node| node.highlighted).collect();

        Self {
            subgraph,
            nodes,
            links,
            last_finite,
            highlighted,
        }
    }

    pub(super) fn index_of(&self, node_id: &str) -> Option<usize> {
        self.subgraph.index_by_id.get(node_id).copied()
    }

    /// Returns whether the command touched a node in this subgraph.
    pub(super) fn apply(&mut self, command: LayoutCommand) -> bool {
        let Some(index) = self.index_of(command.node_id()) else {
            trace!(node = command.node_id(), "ignoring command for node outside the subgraph");
            return false;
        };

        let node = &mut self.nodes[index];
        match command {
            LayoutCommand::Pin { position, .. } | LayoutCommand::Drag { position, .. } => {
                if !position.is_finite() {
                    warn!(node = %self.subgraph.nodes[index].id, "ignoring non-finite pin");
                    return false;
                }
                let position = clamp_to_world(position);
                node.pin = Some(position);
                node.world_pos = position;
                node.velocity = Vec2::ZERO;
                self.last_finite[index] = position;
            }
            LayoutCommand::Unpin { .. } => {
                node.pin = None;
            }
            LayoutCommand::Release { keep_pinned, .. } => {
                if !keep_pinned {
                    node.pin = None;
                }
            }
        }
        true
    }

    /// Restores every node that went non-finite this tick.
    pub(super) fn recover_non_finite(&mut self, tick: u64) -> Vec<DegenerateForceWarning> {
        let mut warnings = Vec::new();
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if node.world_pos.is_finite() && node.velocity.is_finite() {
                node.world_pos = clamp_to_world(node.world_pos);
                self.last_finite[index] = node.world_pos;
                continue;
            }

            let restored = self.last_finite[index];
            node.world_pos = restored;
            node.velocity = Vec2::ZERO;

            let warning = DegenerateForceWarning {
                node_id: self.subgraph.nodes[index].id.clone(),
                tick,
                restored_position: restored,
            };
            warn!(%warning, "recovered degenerate node");
            warnings.push(warning);
        }
        warnings
    }

    pub(super) fn positions(&self) -> HashMap<String, Pos2> {
        self.subgraph
            .nodes
            .iter()
            .zip(&self.nodes)
            .map(|(node, sim)| (node.id.clone(), sim.world_pos.to_pos2()))
            .collect()
    }

    pub(super) fn export_nodes(&self) -> Vec<Node> {
        self.subgraph
            .nodes
            .iter()
            .zip(&self.nodes)
            .zip(&self.highlighted)
            .map(|((node, sim), &highlighted)| {
                let mut node = node.clone();
                node.x = Some(sim.world_pos.x);
                node.y = Some(sim.world_pos.y);
                node.vx = sim.velocity.x;
                node.vy = sim.velocity.y;
                node.fx = sim.pin.map(|pin| pin.x);
                node.fy = sim.pin.map(|pin| pin.y);
                node.highlighted = highlighted;
                node
            })
            .collect()
    }
}

/// Phyllotaxis spiral around `center` with a per-id jitter.
fn seeded_position(index: usize, id: &str, center: Vec2, seed: u64, spacing: f32) -> Vec2 {
    let (jx, jy) = stable_pair(seed, id);
    let radius = spacing * (0.5 + index as f32).sqrt();
    let angle = index as f32 * GOLDEN_ANGLE + jx * 0.35;
    center + vec2(angle.cos(), angle.sin()) * radius + vec2(jx, jy) * (spacing * 0.25)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_positions_are_distinct_and_deterministic() {
        let center = vec2(10.0, -4.0);
        let positions = (0..50)
            .map(|index| seeded_position(index, &format!("n{index}"), center, 9, 20.0))
            .collect::<Vec<_>>();

        for (index, position) in positions.iter().enumerate() {
            assert!(position.is_finite());
            assert_eq!(
                *position,
                seeded_position(index, &format!("n{index}"), center, 9, 20.0)
            );
            for other in &positions[index + 1..] {
                assert!((*position - *other).length() > 1e-3);
            }
        }
    }

    #[test]
    fn world_clamp_bounds_coordinates() {
        assert_eq!(
            clamp_to_world(vec2(1.0e9, -1.0e9)),
            vec2(WORLD_LIMIT, -WORLD_LIMIT)
        );
        assert_eq!(clamp_to_world(vec2(3.0, 4.0)), vec2(3.0, 4.0));
    }
}
