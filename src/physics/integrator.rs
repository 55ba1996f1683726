use eframe::egui::Vec2;
use serde::{Deserialize, Serialize};

use super::SimNode;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    pub velocity_damping: f32,
    pub alpha_start: f32,
    pub alpha_decay: f32,
    pub alpha_min: f32,
    pub max_speed: f32,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            velocity_damping: 0.9,
            alpha_start: 0.1,
            alpha_decay: 0.99,
            alpha_min: 0.01,
            max_speed: 64.0,
        }
    }
}

impl IntegratorConfig {
    /// Replaces values that would stall or destabilise the run with defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f32, fallback: f32| {
            if value.is_finite() { value } else { fallback }
        };

        let alpha_decay = finite_or(self.alpha_decay, defaults.alpha_decay);
        let alpha_start = finite_or(self.alpha_start, defaults.alpha_start);
        let alpha_min = finite_or(self.alpha_min, defaults.alpha_min);
        let max_speed = finite_or(self.max_speed, defaults.max_speed);

        Self {
            velocity_damping: finite_or(self.velocity_damping, defaults.velocity_damping)
                .clamp(0.0, 1.0),
            alpha_start: if alpha_start > 0.0 { alpha_start } else { defaults.alpha_start },
            alpha_decay: if alpha_decay > 0.0 && alpha_decay < 1.0 {
                alpha_decay
            } else {
                defaults.alpha_decay
            },
            alpha_min: alpha_min.max(0.0),
            max_speed: if max_speed > 0.0 { max_speed } else { defaults.max_speed },
        }
    }
}

/// Velocity/position update plus the decaying `alpha` heat.
#[derive(Clone, Debug)]
pub struct Integrator {
    config: IntegratorConfig,
    alpha: f32,
}

impl Integrator {
    pub fn new(config: IntegratorConfig) -> Self {
        let config = config.sanitized();
        Self {
            alpha: config.alpha_start,
            config,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_converged(&self) -> bool {
        self.alpha < self.config.alpha_min
    }

    /// Not cumulative: always lands on `alpha_start`.
    pub fn reheat(&mut self) {
        self.alpha = self.config.alpha_start;
    }

    pub(crate) fn decay(&mut self) {
        self.alpha *= self.config.alpha_decay;
    }

    /// Applies one step. Converged integrators leave every node untouched.
    pub fn integrate(&self, nodes: &mut [SimNode], forces: &[Vec2]) {
        if self.is_converged() {
            return;
        }

        let damping = self.config.velocity_damping;
        let max_speed = self.config.max_speed;
        for (node, &force) in nodes.iter_mut().zip(forces) {
            if let Some(pin) = node.pin {
                node.world_pos = pin;
                node.velocity = Vec2::ZERO;
                continue;
            }

            let mut velocity = node.velocity * damping + force;
            let speed = velocity.length();
            if speed > max_speed {
                velocity *= max_speed / speed;
            }

            node.velocity = velocity;
            node.world_pos += velocity;
        }
    }
}
