//! Environment lookup by id.

use engine::SimConfig;

use crate::env::{Env, RewardMode, Task, TaskEnv};
use crate::{QuadrupedReach, TaskError};

pub const ENV_IDS: &[&str] = &["QuadrupedReach-v1", "AnymalC-Reach-v1"];

/// Simulation settings the environment `env_id` is tuned for.
pub fn default_sim_config(env_id: &str) -> Result<SimConfig, TaskError> {
    match env_id {
        "QuadrupedReach-v1" | "AnymalC-Reach-v1" => Ok(QuadrupedReach::default_sim_config()),
        other => Err(TaskError::UnknownEnv(other.to_owned())),
    }
}

pub fn make(
    env_id: &str,
    sim_config: &SimConfig,
    reward_mode: RewardMode,
) -> Result<Box<dyn Env>, TaskError> {
    tracing::info!("making {env_id} with {} sub-scene(s)", sim_config.num_envs);
    match env_id {
        "QuadrupedReach-v1" | "AnymalC-Reach-v1" => Ok(Box::new(
            TaskEnv::<QuadrupedReach>::new(sim_config, reward_mode)?,
        )),
        other => Err(TaskError::UnknownEnv(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_id_resolves() {
        for id in ENV_IDS {
            assert!(default_sim_config(id).is_ok(), "{id}");
        }
    }

    #[test]
    fn unknown_id_is_rejected() {
        assert_eq!(
            default_sim_config("PickCube-v1"),
            Err(TaskError::UnknownEnv("PickCube-v1".into()))
        );
        assert!(matches!(
            make("PickCube-v1", &SimConfig::default(), RewardMode::Dense),
            Err(TaskError::UnknownEnv(_))
        ));
    }
}
