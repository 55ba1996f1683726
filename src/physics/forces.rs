use eframe::egui::{Vec2, vec2};

use super::SimLink;
use super::quadtree::QuadNode;

/// Below this separation two nodes are treated as coincident.
pub(super) const COINCIDENT_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) padding: f32,
    pub(super) max_distance_sq: f32,
}

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    pub(super) strength: f32,
    pub(super) softening: f32,
    pub(super) theta: f32,
}

/// Unit vector from `b` to `a`; coincident pairs get a fixed direction
/// derived from their indices so they still separate.
fn pair_direction(delta: Vec2, distance: f32, a: usize, b: usize) -> Vec2 {
    if distance > COINCIDENT_EPSILON {
        delta / distance
    } else {
        let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * std::f32::consts::TAU;
        vec2(angle.cos(), angle.sin())
    }
}

pub(super) fn accumulate_center(
    positions: &[Vec2],
    center: Vec2,
    strength: f32,
    forces: &mut [Vec2],
) {
    for (force, &position) in forces.iter_mut().zip(positions) {
        *force -= (position - center) * strength;
    }
}

pub(super) fn accumulate_links(
    positions: &[Vec2],
    links: &[SimLink],
    scale: f32,
    forces: &mut [Vec2],
) {
    for link in links {
        if link.source == link.target {
            continue;
        }

        let delta = positions[link.target] - positions[link.source];
        let distance = delta.length();
        if distance <= COINCIDENT_EPSILON {
            continue;
        }

        let stretch = (distance - link.rest_length) * scale * link.strength;
        let correction = (delta / distance) * (stretch * 0.5);
        forces[link.source] += correction;
        forces[link.target] -= correction;
    }
}

fn collide_pair(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec2],
) {
    let delta = positions[from] - positions[to];
    let distance = delta.length();
    let min_distance = radii[from] + radii[to] + params.padding;
    if distance >= min_distance {
        return;
    }

    let direction = pair_direction(delta, distance, from, to);
    let push = direction * ((min_distance - distance) * params.strength * 0.5);
    forces[from] += push;
    forces[to] -= push;
}

pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    collide_pair(from, to, positions, radii, params, forces);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    collide_pair(from, to, positions, radii, params, forces);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_ref() else {
                continue;
            };

            accumulate_collision_pairs(child_a, child_a, true, positions, radii, params, forces);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_ref() else {
                    continue;
                };
                accumulate_collision_pairs(
                    child_a, child_b, false, positions, radii, params, forces,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, positions, radii, params, forces);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, params, forces);
        }
    }
}

fn repulsion_between(point: Vec2, other: Vec2, params: ChargeParams) -> Vec2 {
    let delta = point - other;
    let distance_sq = delta.length_sq();
    let distance = distance_sq.sqrt();
    let direction = if distance > COINCIDENT_EPSILON {
        delta / distance
    } else {
        vec2(1.0, 0.0)
    };
    direction * (params.strength / (distance_sq + params.softening))
}

/// Barnes-Hut approximation of many-body repulsion on one node.
pub(super) fn accumulate_repulsion_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    force: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index != index {
                *force += repulsion_between(point, positions[other_index], params);
            }
        }
        return;
    }

    let delta = point - node.center_of_mass;
    let distance_sq = delta.length_sq().max(COINCIDENT_EPSILON);
    let distance = distance_sq.sqrt();
    let can_approximate = !node.bounds.contains(point)
        && (node.bounds.side_length() / distance) < params.theta
        && node.mass > 1.0;

    if can_approximate {
        let scaled = (params.strength * node.mass) / (distance_sq + params.softening);
        *force += (delta / distance) * scaled;
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_repulsion_for_node(child, index, positions, params, force);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force_collisions(
        positions: &[Vec2],
        radii: &[f32],
        params: CollisionParams,
    ) -> Vec<Vec2> {
        let mut forces = vec![Vec2::ZERO; positions.len()];
        for from in 0..positions.len() {
            for to in (from + 1)..positions.len() {
                collide_pair(from, to, positions, radii, params, &mut forces);
            }
        }
        forces
    }

    fn params(radii: &[f32], padding: f32) -> CollisionParams {
        let max_radius = radii.iter().copied().fold(0.0, f32::max);
        let max_distance = max_radius * 2.0 + padding;
        CollisionParams {
            strength: 0.7,
            padding,
            max_distance_sq: max_distance * max_distance,
        }
    }

    #[test]
    fn quadtree_collisions_match_all_pairs() {
        let positions = (0..150)
            .map(|index| {
                let angle = index as f32 * 2.399_963;
                vec2(angle.cos(), angle.sin()) * (index as f32).sqrt() * 9.0
            })
            .collect::<Vec<_>>();
        let radii = (0..150).map(|index| 4.0 + (index % 5) as f32).collect::<Vec<_>>();
        let params = params(&radii, 2.0);

        let tree = QuadNode::build(&positions).unwrap();
        let mut forces = vec![Vec2::ZERO; positions.len()];
        accumulate_collision_pairs(&tree, &tree, true, &positions, &radii, params, &mut forces);

        let expected = brute_force_collisions(&positions, &radii, params);
        for (actual, expected) in forces.iter().zip(&expected) {
            assert!((*actual - *expected).length() < 1e-3);
        }
        assert!(expected.iter().any(|force| force.length() > 0.0));
    }

    #[test]
    fn coincident_nodes_are_pushed_apart() {
        let positions = vec![vec2(3.0, 3.0), vec2(3.0, 3.0)];
        let radii = vec![5.0, 5.0];
        let forces = brute_force_collisions(&positions, &radii, params(&radii, 1.0));

        assert!(forces[0].is_finite() && forces[1].is_finite());
        assert!(forces[0].length() > 0.0);
        assert!((forces[0] + forces[1]).length() < 1e-6);
    }

    #[test]
    fn separated_nodes_feel_nothing() {
        let positions = vec![vec2(0.0, 0.0), vec2(30.0, 0.0)];
        let radii = vec![5.0, 5.0];
        let forces = brute_force_collisions(&positions, &radii, params(&radii, 2.0));
        assert_eq!(forces, vec![Vec2::ZERO; 2]);
    }

    #[test]
    fn links_pull_toward_rest_length_symmetrically() {
        let positions = vec![vec2(0.0, 0.0), vec2(100.0, 0.0)];
        let links = vec![SimLink {
            source: 0,
            target: 1,
            rest_length: 40.0,
            strength: 1.0,
        }];
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_links(&positions, &links, 0.1, &mut forces);

        assert!(forces[0].x > 0.0);
        assert!(forces[1].x < 0.0);
        assert!((forces[0] + forces[1]).length() < 1e-6);
        assert!((forces[0].x - 3.0).abs() < 1e-4);
    }

    #[test]
    fn zero_strength_links_and_self_loops_do_nothing() {
        let positions = vec![vec2(0.0, 0.0), vec2(100.0, 0.0)];
        let links = vec![
            SimLink {
                source: 0,
                target: 1,
                rest_length: 10.0,
                strength: 0.0,
            },
            SimLink {
                source: 1,
                target: 1,
                rest_length: 10.0,
                strength: 1.0,
            },
        ];
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_links(&positions, &links, 0.1, &mut forces);
        assert_eq!(forces, vec![Vec2::ZERO; 2]);
    }

    #[test]
    fn center_force_scales_with_distance() {
        let positions = vec![vec2(100.0, 0.0), vec2(0.0, -50.0)];
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_center(&positions, Vec2::ZERO, 0.001, &mut forces);
        assert!((forces[0] - vec2(-0.1, 0.0)).length() < 1e-6);
        assert!((forces[1] - vec2(0.0, 0.05)).length() < 1e-6);
    }

    #[test]
    fn charge_repels_neighbours() {
        let positions = vec![vec2(-10.0, 0.0), vec2(10.0, 0.0)];
        let tree = QuadNode::build(&positions).unwrap();
        let params = ChargeParams {
            strength: 500.0,
            softening: 10.0,
            theta: 0.7,
        };

        let mut left = Vec2::ZERO;
        accumulate_repulsion_for_node(&tree, 0, &positions, params, &mut left);
        let mut right = Vec2::ZERO;
        accumulate_repulsion_for_node(&tree, 1, &positions, params, &mut right);

        assert!(left.x < 0.0);
        assert!(right.x > 0.0);
        assert!((left + right).length() < 1e-6);
    }
}
