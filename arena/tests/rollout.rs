use anyhow::Result;
use arena::app::{self, RunConfig, RunFile};
use engine::SimBackend;
use tasks::RewardMode;

#[test]
fn gpu_rollout_resets_finished_episodes() -> Result<()> {
    let cfg = RunConfig::resolve(RunFile {
        steps: Some(250),
        num_envs: Some(4),
        backend: Some(SimBackend::Gpu),
        seed: Some(3),
        ..RunFile::default()
    })?;
    let summary = app::run(&cfg)?;
    assert_eq!(summary.steps, 250);
    // every sub-scene hits the step limit at least once
    assert!(summary.episodes >= 4, "{summary:?}");
    assert!(summary.mean_reward <= 1.0);
    Ok(())
}

#[test]
fn same_seed_same_rollout() -> Result<()> {
    let cfg = RunConfig::resolve(RunFile {
        steps: Some(30),
        num_envs: Some(2),
        backend: Some(SimBackend::Gpu),
        seed: Some(8),
        ..RunFile::default()
    })?;
    assert_eq!(app::run(&cfg)?, app::run(&cfg)?);
    Ok(())
}

#[test]
fn config_file_is_loaded() -> Result<()> {
    let path = std::env::temp_dir().join(format!("arena-config-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{
            "env_id": "AnymalC-Reach-v1",
            "reward_mode": "sparse",
            "steps": 5,
            "sim_config": { "backend": "gpu", "num_envs": 3, "sim_freq": 200 }
        }"#,
    )?;
    let file = RunFile::load(&path);
    std::fs::remove_file(&path)?;

    let cfg = RunConfig::resolve(file?)?;
    assert_eq!(cfg.env_id, "AnymalC-Reach-v1");
    assert_eq!(cfg.reward_mode, RewardMode::Sparse);
    assert_eq!(cfg.sim_config.num_envs, 3);
    assert_eq!(cfg.sim_config.sim_steps_per_control(), 10);
    assert_eq!(app::run(&cfg)?.steps, 5);
    Ok(())
}
