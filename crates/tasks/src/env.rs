//! # Environments
//!
//! [`Env`] is the batched interface a learner drives: every call works on
//! all sub-scenes at once and observations, rewards and flags come back as
//! one row per sub-scene.
//!
//! [`Task`] is what a concrete environment implements. [`TaskEnv`] owns the
//! [`ManagedScene`] and turns any task into an [`Env`].

use std::collections::BTreeMap;

use engine::SimConfig;
use serde::{Deserialize, Serialize};
use structs::ManagedScene;

use crate::TaskError;

/// How [`TaskEnv::step`] turns an evaluation into a reward.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardMode {
    /// `success - fail`.
    Sparse,
    Dense,
    /// Dense reward divided by the task's maximum dense reward.
    #[default]
    NormalizedDense,
    None,
}

/// Outcome of evaluating every sub-scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evaluation {
    pub success: Vec<bool>,
    pub fail: Vec<bool>,
    pub metrics: BTreeMap<&'static str, Vec<f32>>,
    pub flags: BTreeMap<&'static str, Vec<bool>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StepOutput {
    pub obs: Vec<Vec<f32>>,
    pub reward: Vec<f32>,
    pub terminated: Vec<bool>,
    pub truncated: Vec<bool>,
    pub info: Evaluation,
}

/// Batched reinforcement learning environment.
pub trait Env {
    /// Resets every sub-scene. A seed reseeds the episode sampler.
    fn reset(&mut self, seed: Option<u64>) -> Result<Vec<Vec<f32>>, TaskError>;

    /// Resets only the listed sub-scenes and returns observations for all.
    fn reset_envs(&mut self, env_idx: &[usize]) -> Result<Vec<Vec<f32>>, TaskError>;

    /// Applies one action row per sub-scene and advances one control step.
    fn step(&mut self, actions: &[Vec<f32>]) -> Result<StepOutput, TaskError>;

    fn num_envs(&self) -> usize;

    fn obs_size(&self) -> usize;

    fn action_size(&self) -> usize;
}

/// Scene content and scoring of one environment.
pub trait Task {
    /// Simulation settings the task is tuned for.
    fn default_sim_config() -> SimConfig
    where
        Self: Sized;

    /// Builds the task's actors.
    fn load_scene(scene: &mut ManagedScene) -> Result<Self, TaskError>
    where
        Self: Sized;

    /// Places actors for a new episode in the sub-scenes `env_idx`.
    ///
    /// `env_idx` is sorted and free of duplicates. The scene's reset mask
    /// already selects exactly these sub-scenes, so batched writes may pass
    /// one value per entry of `env_idx`, in the same order.
    fn initialize_episode(
        &mut self,
        scene: &mut ManagedScene,
        env_idx: &[usize],
        rng: &mut fastrand::Rng,
    ) -> Result<(), TaskError>;

    fn apply_action(&mut self, scene: &mut ManagedScene, actions: &[Vec<f32>]) -> Result<(), TaskError>;

    fn evaluate(&self, scene: &ManagedScene) -> Result<Evaluation, TaskError>;

    /// Robot state part of the observation.
    fn agent_obs(&self, scene: &ManagedScene) -> Result<Vec<Vec<f32>>, TaskError>;

    /// Task specific part of the observation.
    fn obs_extra(&self, scene: &ManagedScene, eval: &Evaluation) -> Result<Vec<Vec<f32>>, TaskError>;

    fn compute_dense_reward(
        &self,
        scene: &ManagedScene,
        actions: &[Vec<f32>],
        eval: &Evaluation,
    ) -> Result<Vec<f32>, TaskError>;

    fn max_dense_reward(&self) -> f32;

    fn max_episode_steps(&self) -> u32;

    fn obs_size(&self) -> usize;

    fn action_size(&self) -> usize;
}

pub struct TaskEnv<T: Task> {
    scene: ManagedScene,
    task: T,
    reward_mode: RewardMode,
    elapsed_steps: Vec<u32>,
    rng: fastrand::Rng,
}

impl<T: Task> TaskEnv<T> {
    pub fn new(sim_config: &SimConfig, reward_mode: RewardMode) -> Result<Self, TaskError> {
        let mut scene = ManagedScene::new(sim_config)?;
        let task = T::load_scene(&mut scene)?;
        let num_envs = scene.num_envs();
        tracing::debug!(
            "loaded task with {num_envs} sub-scene(s) on {:?} backend",
            sim_config.backend
        );
        Ok(Self {
            scene,
            task,
            reward_mode,
            elapsed_steps: vec![0; num_envs],
            rng: fastrand::Rng::new(),
        })
    }

    /// Creates the environment with the task's own simulation settings.
    pub fn with_defaults(reward_mode: RewardMode) -> Result<Self, TaskError> {
        Self::new(&T::default_sim_config(), reward_mode)
    }

    #[must_use]
    pub fn scene(&self) -> &ManagedScene {
        &self.scene
    }

    #[must_use]
    pub fn task(&self) -> &T {
        &self.task
    }

    #[must_use]
    pub fn elapsed_steps(&self) -> &[u32] {
        &self.elapsed_steps
    }

    fn observe(&self, eval: &Evaluation) -> Result<Vec<Vec<f32>>, TaskError> {
        let agent = self.task.agent_obs(&self.scene)?;
        let extra = self.task.obs_extra(&self.scene, eval)?;
        Ok(agent
            .into_iter()
            .zip(extra)
            .map(|(mut row, extra)| {
                row.extend(extra);
                row
            })
            .collect())
    }

    fn reward(&self, actions: &[Vec<f32>], eval: &Evaluation) -> Result<Vec<f32>, TaskError> {
        let num_envs = self.scene.num_envs();
        Ok(match self.reward_mode {
            RewardMode::None => vec![0.0; num_envs],
            RewardMode::Sparse => eval
                .success
                .iter()
                .zip(&eval.fail)
                .map(|(&s, &f)| f32::from(u8::from(s)) - f32::from(u8::from(f)))
                .collect(),
            RewardMode::Dense => self.task.compute_dense_reward(&self.scene, actions, eval)?,
            RewardMode::NormalizedDense => {
                let max = self.task.max_dense_reward();
                self.task
                    .compute_dense_reward(&self.scene, actions, eval)?
                    .into_iter()
                    .map(|r| r / max)
                    .collect()
            }
        })
    }

    fn initialize_masked(&mut self, env_idx: &[usize]) -> Result<(), TaskError> {
        self.task
            .initialize_episode(&mut self.scene, env_idx, &mut self.rng)?;
        self.scene.gpu_apply_all()?;
        self.scene.gpu_fetch_all()?;
        Ok(())
    }

    fn check_actions(&self, actions: &[Vec<f32>]) -> Result<(), TaskError> {
        let expected = self.scene.num_envs();
        if actions.len() != expected {
            return Err(TaskError::ActionRows {
                expected,
                got: actions.len(),
            });
        }
        let width = self.task.action_size();
        if let Some(row) = actions.iter().find(|row| row.len() != width) {
            return Err(TaskError::ActionWidth {
                expected: width,
                got: row.len(),
            });
        }
        Ok(())
    }
}

impl<T: Task> Env for TaskEnv<T> {
    fn reset(&mut self, seed: Option<u64>) -> Result<Vec<Vec<f32>>, TaskError> {
        if let Some(seed) = seed {
            self.rng = fastrand::Rng::with_seed(seed);
        }
        let all: Vec<usize> = (0..self.scene.num_envs()).collect();
        self.reset_envs(&all)
    }

    fn reset_envs(&mut self, env_idx: &[usize]) -> Result<Vec<Vec<f32>>, TaskError> {
        // masked writes pair values with sub-scenes in ascending order
        let mut env_idx = env_idx.to_vec();
        env_idx.sort_unstable();
        env_idx.dedup();

        self.scene.set_reset_mask(&env_idx)?;
        let initialized = self.initialize_masked(&env_idx);
        // the mask must not outlive the reset, even a failed one
        self.scene.reset_mask_all();
        initialized?;

        for &i in &env_idx {
            self.elapsed_steps[i] = 0;
        }
        tracing::debug!("reset sub-scenes {env_idx:?}");
        let eval = self.task.evaluate(&self.scene)?;
        self.observe(&eval)
    }

    fn step(&mut self, actions: &[Vec<f32>]) -> Result<StepOutput, TaskError> {
        self.check_actions(actions)?;
        self.task.apply_action(&mut self.scene, actions)?;
        self.scene.step()?;
        for steps in &mut self.elapsed_steps {
            *steps += 1;
        }

        let info = self.task.evaluate(&self.scene)?;
        let obs = self.observe(&info)?;
        let reward = self.reward(actions, &info)?;
        let terminated = info
            .success
            .iter()
            .zip(&info.fail)
            .map(|(&s, &f)| s || f)
            .collect();
        let max_steps = self.task.max_episode_steps();
        let truncated = self.elapsed_steps.iter().map(|&n| n >= max_steps).collect();
        Ok(StepOutput {
            obs,
            reward,
            terminated,
            truncated,
            info,
        })
    }

    fn num_envs(&self) -> usize {
        self.scene.num_envs()
    }

    fn obs_size(&self) -> usize {
        self.task.obs_size()
    }

    fn action_size(&self) -> usize {
        self.task.action_size()
    }
}
