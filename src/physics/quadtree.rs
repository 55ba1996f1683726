use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 12;
const MAX_DEPTH: usize = 10;

#[derive(Clone, Copy, Debug)]
pub(super) struct QuadBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl QuadBounds {
    fn from_points(points: &[Vec2]) -> Option<Self> {
        if points.is_empty() || points.iter().any(|point| !point.is_finite()) {
            return None;
        }

        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        let center = (min + max) * 0.5;
        let span = (max - min).max(vec2(1.0, 1.0));
        let half_extent = (span.max_elem() * 0.5) + 1.0;

        Some(Self {
            center,
            half_extent,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let offset = (point - self.center).abs();
        offset.x <= self.half_extent && offset.y <= self.half_extent
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = match quadrant {
            0 => vec2(-quarter, -quarter),
            1 => vec2(quarter, -quarter),
            2 => vec2(-quarter, quarter),
            _ => vec2(quarter, quarter),
        };

        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_for(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) + 2 * usize::from(point.y >= self.center.y)
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }

    /// Squared gap between two boxes; zero when they overlap.
    pub(super) fn distance_sq_to(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let gap = ((self.center - other.center).abs() - vec2(reach, reach)).max(Vec2::ZERO);
        gap.length_sq()
    }
}

pub(super) struct QuadNode {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    /// `None` when any position is non-finite.
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = QuadBounds::from_points(positions)?;
        let indices = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::build_node(bounds, indices, positions, 0))
    }

    fn build_node(
        bounds: QuadBounds,
        indices: Vec<usize>,
        positions: &[Vec2],
        depth: usize,
    ) -> Self {
        let mass = indices.len() as f32;
        let sum = indices
            .iter()
            .fold(Vec2::ZERO, |sum, &index| sum + positions[index]);
        let center_of_mass = if indices.is_empty() { sum } else { sum / mass };

        let mut node = Self {
            bounds,
            center_of_mass,
            mass,
            indices,
            children: Default::default(),
        };
        if depth < MAX_DEPTH && node.indices.len() > LEAF_CAPACITY {
            node.subdivide(positions, depth);
        }
        node
    }

    /// Moves indices into child quadrants. A node whose points all fall in a
    /// single quadrant stays a leaf, otherwise coincident points would recurse
    /// to MAX_DEPTH for nothing.
    fn subdivide(&mut self, positions: &[Vec2], depth: usize) {
        let mut buckets: [Vec<usize>; 4] = Default::default();
        for &index in &self.indices {
            buckets[self.bounds.quadrant_for(positions[index])].push(index);
        }
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() < 2 {
            return;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                let bounds = self.bounds.child(quadrant);
                self.children[quadrant] =
                    Some(Box::new(Self::build_node(bounds, bucket, positions, depth + 1)));
            }
        }
        self.indices.clear();
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    #[cfg(test)]
    fn collect_indices(&self, out: &mut Vec<usize>) {
        out.extend_from_slice(&self.indices);
        for child in self.children.iter().flatten() {
            child.collect_indices(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_index_lands_in_exactly_one_leaf() {
        let positions = (0..200)
            .map(|index| {
                let angle = index as f32 * 0.618_034 * std::f32::consts::TAU;
                vec2(angle.cos(), angle.sin()) * (index as f32).sqrt() * 12.0
            })
            .collect::<Vec<_>>();

        let tree = QuadNode::build(&positions).unwrap();
        assert!(!tree.is_leaf());
        assert_eq!(tree.mass, 200.0);

        let mut indices = Vec::new();
        tree.collect_indices(&mut indices);
        indices.sort_unstable();
        assert_eq!(indices, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let positions = vec![vec2(5.0, 5.0); 40];
        let tree = QuadNode::build(&positions).unwrap();
        assert!(tree.is_leaf());
        assert_eq!(tree.indices.len(), 40);
    }

    #[test]
    fn non_finite_positions_build_nothing() {
        assert!(QuadNode::build(&[vec2(0.0, 0.0), vec2(f32::NAN, 1.0)]).is_none());
        assert!(QuadNode::build(&[vec2(f32::NAN, f32::NAN)]).is_none());
        assert!(QuadNode::build(&[vec2(2.0, 3.0), vec2(f32::INFINITY, 0.0)]).is_none());
        assert!(QuadNode::build(&[]).is_none());
    }

    #[test]
    fn box_distance() {
        let a = QuadBounds {
            center: vec2(0.0, 0.0),
            half_extent: 1.0,
        };
        let b = QuadBounds {
            center: vec2(5.0, 0.0),
            half_extent: 1.0,
        };
        assert_eq!(a.distance_sq_to(b), 9.0);
        assert_eq!(a.distance_sq_to(a), 0.0);
        assert!(a.contains(vec2(1.0, -1.0)));
        assert!(!a.contains(vec2(1.5, 0.0)));
    }
}
