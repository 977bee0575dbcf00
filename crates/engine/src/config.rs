//! Simulation configuration shared by the engine and the task layer.
//!
//! Every field has a default so partial JSON documents deserialize cleanly.

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Which engine access path a scene is built on.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimBackend {
    /// Per-entity handles, one sub-scene.
    #[default]
    Cpu,
    /// Shared rigid body buffer across parallel sub-scenes.
    Gpu,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuMemoryConfig {
    pub found_lost_pairs_capacity: u32,
    pub max_rigid_contact_count: u32,
    pub max_rigid_patch_count: u32,
}

impl Default for GpuMemoryConfig {
    fn default() -> Self {
        Self {
            found_lost_pairs_capacity: 1 << 25,
            max_rigid_contact_count: 1 << 19,
            max_rigid_patch_count: 1 << 18,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub gravity: [f32; 3],
    pub bounce_threshold: f32,
    pub solver_position_iterations: u32,
    pub solver_velocity_iterations: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.0, -9.81],
            bounce_threshold: 2.0,
            solver_position_iterations: 15,
            solver_velocity_iterations: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub backend: SimBackend,
    pub num_envs: usize,
    pub sim_freq: u32,
    pub control_freq: u32,
    pub gpu_memory_cfg: GpuMemoryConfig,
    pub scene_cfg: SceneConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            backend: SimBackend::Cpu,
            num_envs: 1,
            sim_freq: 100,
            control_freq: 20,
            gpu_memory_cfg: GpuMemoryConfig::default(),
            scene_cfg: SceneConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.num_envs == 0 {
            return Err(EngineError::InvalidConfig("num_envs must be at least 1".into()));
        }
        if self.num_envs > 1 && self.backend == SimBackend::Cpu {
            return Err(EngineError::InvalidConfig(format!(
                "num_envs = {} requires the gpu backend",
                self.num_envs
            )));
        }
        if self.control_freq == 0 || self.sim_freq == 0 || self.sim_freq % self.control_freq != 0 {
            return Err(EngineError::InvalidConfig(format!(
                "sim_freq ({}) must be a positive multiple of control_freq ({})",
                self.sim_freq, self.control_freq
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn sim_timestep(&self) -> f32 {
        1.0 / self.sim_freq as f32
    }

    #[must_use]
    pub fn sim_steps_per_control(&self) -> u32 {
        (self.sim_freq / self.control_freq.max(1)).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: SimConfig =
            serde_json::from_str(r#"{ "backend": "gpu", "num_envs": 16 }"#).unwrap();
        assert_eq!(cfg.backend, SimBackend::Gpu);
        assert_eq!(cfg.num_envs, 16);
        assert_eq!(cfg.sim_freq, 100);
        assert_eq!(cfg.gpu_memory_cfg.max_rigid_contact_count, 1 << 19);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn cpu_backend_rejects_parallel_envs() {
        let cfg = SimConfig {
            num_envs: 4,
            ..SimConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn control_freq_must_divide_sim_freq() {
        let cfg = SimConfig {
            control_freq: 30,
            ..SimConfig::default()
        };
        assert!(cfg.validate().is_err());
        assert_eq!(SimConfig::default().sim_steps_per_control(), 5);
    }
}
