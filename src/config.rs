use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::physics::{ForceConfig, IntegratorConfig};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub forces: ForceConfig,
    pub integrator: IntegratorConfig,
    /// Seed for positions of nodes that arrive without one.
    pub seed: u64,
    pub seed_spacing: f32,
    /// Ticks allowed per run before convergence is forced.
    pub max_ticks: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            forces: ForceConfig::default(),
            integrator: IntegratorConfig::default(),
            seed: 0x5eed,
            seed_spacing: 20.0,
            max_ticks: 3_000,
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid simulation config JSON")
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }
}
