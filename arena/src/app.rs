//! # Arena Application Logic
//!
//! Resolves run settings from a JSON file and command line flags, then drives
//! a random-action rollout through [`tasks::registry::make`]. Sub-scenes that
//! finish an episode are reset on their own while the others keep running.

use std::path::Path;

use anyhow::{Context, Result};
use engine::{SimBackend, SimConfig};
use serde::Deserialize;
use tasks::{registry, RewardMode};

pub const DEFAULT_ENV_ID: &str = "QuadrupedReach-v1";
const LOG_EVERY: u32 = 50;

/// Run settings as they appear in a config file. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunFile {
    pub env_id: Option<String>,
    pub reward_mode: Option<RewardMode>,
    pub steps: Option<u32>,
    pub seed: Option<u64>,
    pub num_envs: Option<usize>,
    pub backend: Option<SimBackend>,
    /// Replaces the environment's default simulation settings.
    pub sim_config: Option<SimConfig>,
}

impl RunFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Fields set in `other` take precedence.
    #[must_use]
    pub fn overridden_by(self, other: RunFile) -> Self {
        Self {
            env_id: other.env_id.or(self.env_id),
            reward_mode: other.reward_mode.or(self.reward_mode),
            steps: other.steps.or(self.steps),
            seed: other.seed.or(self.seed),
            num_envs: other.num_envs.or(self.num_envs),
            backend: other.backend.or(self.backend),
            sim_config: other.sim_config.or(self.sim_config),
        }
    }
}

/// Fully resolved settings of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    pub env_id: String,
    pub reward_mode: RewardMode,
    pub steps: u32,
    pub seed: u64,
    pub sim_config: SimConfig,
}

impl RunConfig {
    pub fn resolve(file: RunFile) -> Result<Self> {
        let env_id = file.env_id.unwrap_or_else(|| DEFAULT_ENV_ID.to_owned());
        let mut sim_config = match file.sim_config {
            Some(cfg) => cfg,
            None => registry::default_sim_config(&env_id)?,
        };
        if let Some(backend) = file.backend {
            sim_config.backend = backend;
        }
        if let Some(num_envs) = file.num_envs {
            sim_config.num_envs = num_envs;
        }
        sim_config
            .validate()
            .with_context(|| format!("invalid simulation settings for {env_id}"))?;
        Ok(Self {
            env_id,
            reward_mode: file.reward_mode.unwrap_or_default(),
            steps: file.steps.unwrap_or(200),
            seed: file.seed.unwrap_or(0),
            sim_config,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RolloutSummary {
    pub steps: u32,
    pub episodes: usize,
    pub successes: usize,
    pub mean_reward: f32,
}

/// Steps the environment with uniformly random actions.
pub fn run(cfg: &RunConfig) -> Result<RolloutSummary> {
    let mut env = registry::make(&cfg.env_id, &cfg.sim_config, cfg.reward_mode)?;
    let mut rng = fastrand::Rng::with_seed(cfg.seed);
    env.reset(Some(cfg.seed))?;

    let num_envs = env.num_envs();
    let action_size = env.action_size();
    tracing::info!(
        "running {} on {:?} with {num_envs} sub-scene(s) for {} steps",
        cfg.env_id,
        cfg.sim_config.backend,
        cfg.steps
    );

    let mut summary = RolloutSummary::default();
    let mut reward_sum = 0.0_f64;
    let mut reward_count = 0_u64;
    for step in 1..=cfg.steps {
        let actions: Vec<Vec<f32>> = (0..num_envs)
            .map(|_| (0..action_size).map(|_| rng.f32() * 2.0 - 1.0).collect())
            .collect();
        let out = env.step(&actions)?;

        reward_sum += out.reward.iter().map(|&r| f64::from(r)).sum::<f64>();
        reward_count += out.reward.len() as u64;

        let done: Vec<usize> = out
            .terminated
            .iter()
            .zip(&out.truncated)
            .enumerate()
            .filter_map(|(i, (&term, &trunc))| (term || trunc).then_some(i))
            .collect();
        summary.successes += done.iter().filter(|&&i| out.info.success[i]).count();
        summary.episodes += done.len();
        if !done.is_empty() {
            env.reset_envs(&done)?;
        }

        if step % LOG_EVERY == 0 {
            tracing::info!(
                "step {step}: {} episode(s) finished, {} succeeded",
                summary.episodes,
                summary.successes
            );
        }
        summary.steps = step;
    }

    if reward_count > 0 {
        summary.mean_reward = (reward_sum / reward_count as f64) as f32;
    }
    tracing::info!("rollout done: {summary:?}");
    Ok(summary)
}
