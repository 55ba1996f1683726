mod forces;
mod integrator;
mod quadtree;

use eframe::egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};

use forces::{
    ChargeParams, CollisionParams, accumulate_center, accumulate_collision_pairs,
    accumulate_links, accumulate_repulsion_for_node,
};
pub use integrator::{Integrator, IntegratorConfig};
use quadtree::QuadNode;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    pub center_x: f32,
    pub center_y: f32,
    pub center_strength: f32,
    pub collision_strength: f32,
    pub collision_padding: f32,
    pub link_distance: f32,
    pub link_weight_span: f32,
    pub link_strength: f32,
    /// Many-body repulsion; zero disables it.
    pub charge_strength: f32,
    pub charge_softening: f32,
    pub charge_theta: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            center_strength: 0.001,
            collision_strength: 0.7,
            collision_padding: 2.0,
            link_distance: 30.0,
            link_weight_span: 90.0,
            link_strength: 0.1,
            charge_strength: 0.0,
            charge_softening: 620.0,
            charge_theta: 0.72,
        }
    }
}

impl ForceConfig {
    pub fn center(&self) -> Vec2 {
        vec2(self.center_x, self.center_y)
    }

    /// Heavier edges get shorter links.
    pub fn rest_length(&self, weight: f32) -> f32 {
        self.link_distance + (1.0 - weight.clamp(0.0, 1.0)) * self.link_weight_span
    }
}

/// Per-node simulation state.
#[derive(Clone, Debug, PartialEq)]
pub struct SimNode {
    pub world_pos: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub pin: Option<Vec2>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimLink {
    pub source: usize,
    pub target: usize,
    pub rest_length: f32,
    pub strength: f32,
}

#[derive(Debug, Default)]
pub struct PhysicsScratch {
    pub forces: Vec<Vec2>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
}

/// Sums center, collision, link and (optional) charge forces into
/// `scratch.forces`. Pinned nodes receive forces like any other; the
/// integrator ignores them.
pub fn accumulate_forces(
    nodes: &[SimNode],
    links: &[SimLink],
    config: &ForceConfig,
    scratch: &mut PhysicsScratch,
) {
    let node_count = nodes.len();
    scratch.forces.clear();
    scratch.forces.resize(node_count, Vec2::ZERO);
    scratch.positions.clear();
    scratch.radii.clear();

    let mut max_radius = 0.0_f32;
    for node in nodes {
        scratch.positions.push(node.world_pos);
        scratch.radii.push(node.radius);
        max_radius = max_radius.max(node.radius);
    }

    let forces = &mut scratch.forces;
    let positions = &scratch.positions;
    let radii = &scratch.radii;

    accumulate_center(positions, config.center(), config.center_strength, forces);
    accumulate_links(positions, links, config.link_strength, forces);

    if node_count < 2 {
        return;
    }

    let Some(tree) = QuadNode::build(positions) else {
        return;
    };

    let max_distance = max_radius * 2.0 + config.collision_padding.max(0.0);
    if config.collision_strength > 0.0 && max_distance > 0.0 {
        accumulate_collision_pairs(
            &tree,
            &tree,
            true,
            positions,
            radii,
            CollisionParams {
                strength: config.collision_strength,
                padding: config.collision_padding.max(0.0),
                max_distance_sq: max_distance * max_distance,
            },
            forces,
        );
    }

    if config.charge_strength != 0.0 {
        let params = ChargeParams {
            strength: config.charge_strength,
            softening: config.charge_softening.max(f32::EPSILON),
            theta: config.charge_theta,
        };
        for (index, force) in forces.iter_mut().enumerate() {
            accumulate_repulsion_for_node(&tree, index, positions, params, force);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(x: f32, y: f32) -> SimNode {
        SimNode {
            world_pos: vec2(x, y),
            velocity: Vec2::ZERO,
            radius: 8.0,
            pin: None,
        }
    }

    #[test]
    fn rest_length_shrinks_with_weight() {
        let config = ForceConfig::default();
        assert_eq!(config.rest_length(1.0), 30.0);
        assert_eq!(config.rest_length(0.0), 120.0);
        assert!(config.rest_length(0.9) < config.rest_length(0.1));
    }

    #[test]
    fn forces_are_symmetric_for_an_isolated_pair() {
        let nodes = vec![node(-5.0, 0.0), node(5.0, 0.0)];
        let links = vec![SimLink {
            source: 0,
            target: 1,
            rest_length: 60.0,
            strength: 1.0,
        }];
        let mut scratch = PhysicsScratch::default();
        accumulate_forces(&nodes, &links, &ForceConfig::default(), &mut scratch);

        assert_eq!(scratch.forces.len(), 2);
        assert!(scratch.forces[0].x < 0.0);
        assert!((scratch.forces[0] + scratch.forces[1]).length() < 1e-5);
    }

    #[test]
    fn charge_only_applies_when_enabled() {
        let nodes = vec![node(-50.0, 0.0), node(50.0, 0.0)];
        let config = ForceConfig {
            center_strength: 0.0,
            ..ForceConfig::default()
        };
        let mut scratch = PhysicsScratch::default();
        accumulate_forces(&nodes, &[], &config, &mut scratch);
        assert_eq!(scratch.forces, vec![Vec2::ZERO; 2]);

        let config = ForceConfig {
            charge_strength: 5_000.0,
            ..config
        };
        accumulate_forces(&nodes, &[], &config, &mut scratch);
        assert!(scratch.forces[0].x < 0.0);
        assert!(scratch.forces[1].x > 0.0);
    }
}
