//! # Arena Runtime
//!
//! Entry point for the `arena` binary. Parses the command line, merges it
//! over an optional JSON config file and runs a random-action rollout.

use std::path::PathBuf;

use anyhow::Result;
use arena::app::{self, RunConfig, RunFile};
use clap::{Parser, ValueEnum};
use engine::SimBackend;
use tasks::RewardMode;

#[derive(Parser, Debug)]
#[command(name = "arena", about = "Run batched robot learning tasks")]
struct Cli {
    /// Environment id [default: QuadrupedReach-v1]
    #[arg(long)]
    env_id: Option<String>,

    /// Parallel sub-scenes (gpu backend only)
    #[arg(long)]
    num_envs: Option<usize>,

    #[arg(long, value_enum)]
    backend: Option<Backend>,

    #[arg(long, value_enum)]
    reward_mode: Option<Reward>,

    /// Control steps to run
    #[arg(long)]
    steps: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,

    /// JSON file with run settings
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Backend {
    Cpu,
    Gpu,
}

impl From<Backend> for SimBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Cpu => SimBackend::Cpu,
            Backend::Gpu => SimBackend::Gpu,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Reward {
    Sparse,
    Dense,
    NormalizedDense,
    None,
}

impl From<Reward> for RewardMode {
    fn from(reward: Reward) -> Self {
        match reward {
            Reward::Sparse => RewardMode::Sparse,
            Reward::Dense => RewardMode::Dense,
            Reward::NormalizedDense => RewardMode::NormalizedDense,
            Reward::None => RewardMode::None,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => RunFile::load(path)?,
        None => RunFile::default(),
    };
    let flags = RunFile {
        env_id: cli.env_id,
        reward_mode: cli.reward_mode.map(RewardMode::from),
        steps: cli.steps,
        seed: cli.seed,
        num_envs: cli.num_envs,
        backend: cli.backend.map(SimBackend::from),
        sim_config: None,
    };
    let cfg = RunConfig::resolve(file.overridden_by(flags))?;
    let summary = app::run(&cfg)?;
    println!(
        "{}: {} steps, {} episodes, {} successes, mean reward {:.4}",
        cfg.env_id, summary.steps, summary.episodes, summary.successes, summary.mean_reward
    );
    Ok(())
}
