use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic pair in `[-1, 1]` derived from `(seed, id)`.
pub fn stable_pair(seed: u64, id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// Clamps into `0..=1`; NaN maps to zero.
pub fn unit_interval(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_pair_is_deterministic_per_seed() {
        assert_eq!(stable_pair(7, "a"), stable_pair(7, "a"));
        assert_ne!(stable_pair(7, "a"), stable_pair(8, "a"));

        let (x, y) = stable_pair(42, "bookmark-1");
        assert!((-1.0..=1.0).contains(&x));
        assert!((-1.0..=1.0).contains(&y));
    }

    #[test]
    fn unit_interval_clamps_and_drops_nan() {
        assert_eq!(unit_interval(f32::NAN), 0.0);
        assert_eq!(unit_interval(-2.0), 0.0);
        assert_eq!(unit_interval(3.0), 1.0);
        assert_eq!(unit_interval(0.25), 0.25);
    }
}
