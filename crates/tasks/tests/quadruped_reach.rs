use anyhow::Result;
use engine::{SimBackend, SimConfig};
use structs::{ManagedScene, Pose};
use tasks::{Env, QuadrupedReach, Quadruped, RewardMode, Task, TaskEnv, TaskError};

fn gpu_config(num_envs: usize) -> SimConfig {
    SimConfig {
        backend: SimBackend::Gpu,
        num_envs,
        ..QuadrupedReach::default_sim_config()
    }
}

fn zero_actions(num_envs: usize) -> Vec<Vec<f32>> {
    vec![vec![0.0; Quadruped::ACTION_SIZE]; num_envs]
}

/// Goal `xy` from an observation row.
fn goal_xy(obs: &[f32]) -> [f32; 2] {
    [obs[13], obs[14]]
}

#[test]
fn reset_samples_goals_ahead_of_robot() -> Result<()> {
    let mut env = TaskEnv::<QuadrupedReach>::new(&gpu_config(8), RewardMode::Dense)?;
    let obs = env.reset(Some(7))?;
    assert_eq!(obs.len(), 8);
    for row in &obs {
        assert_eq!(row.len(), env.obs_size());
        let [x, y] = goal_xy(row);
        assert!((2.0..3.0).contains(&x), "goal x = {x}");
        assert!((-2.0..2.0).contains(&y), "goal y = {y}");
        // robot starts in the standing keyframe at the origin
        assert_eq!(&row[..3], &[0.0, 0.0, Quadruped::STANDING_HEIGHT]);
    }
    Ok(())
}

#[test]
fn seeded_resets_repeat() -> Result<()> {
    let mut a = TaskEnv::<QuadrupedReach>::new(&gpu_config(4), RewardMode::Dense)?;
    let mut b = TaskEnv::<QuadrupedReach>::new(&gpu_config(4), RewardMode::Dense)?;
    assert_eq!(a.reset(Some(42))?, b.reset(Some(42))?);
    Ok(())
}

#[test]
fn partial_reset_only_touches_selected_envs() -> Result<()> {
    let mut env = TaskEnv::<QuadrupedReach>::new(&gpu_config(4), RewardMode::Dense)?;
    let before = env.reset(Some(1))?;
    for _ in 0..3 {
        env.step(&zero_actions(4))?;
    }
    let after = env.reset_envs(&[1])?;

    for i in [0, 2, 3] {
        assert_eq!(goal_xy(&after[i]), goal_xy(&before[i]));
    }
    assert_ne!(goal_xy(&after[1]), goal_xy(&before[1]));
    assert_eq!(env.elapsed_steps(), &[3, 0, 3, 3]);
    assert!(env.scene().reset_mask().iter().all(|m| *m));
    Ok(())
}

#[test]
fn reset_order_does_not_change_goal_placement() -> Result<()> {
    let mut sorted = TaskEnv::<QuadrupedReach>::new(&gpu_config(4), RewardMode::Dense)?;
    let mut unsorted = TaskEnv::<QuadrupedReach>::new(&gpu_config(4), RewardMode::Dense)?;
    sorted.reset(Some(8))?;
    unsorted.reset(Some(8))?;

    sorted.reset_envs(&[1, 3])?;
    unsorted.reset_envs(&[3, 1, 3])?;
    let goals = |env: &TaskEnv<QuadrupedReach>| env.task().goal.pose(env.scene());
    assert_eq!(goals(&sorted)?, goals(&unsorted)?);
    assert_eq!(unsorted.elapsed_steps(), &[0; 4]);
    Ok(())
}

#[test]
fn standing_robot_earns_reaching_reward() -> Result<()> {
    let mut env = TaskEnv::<QuadrupedReach>::new(&gpu_config(2), RewardMode::Dense)?;
    env.reset(Some(3))?;
    let out = env.step(&zero_actions(2))?;
    let dist = &out.info.metrics["robot_to_goal_dist"];
    for (reward, d) in out.reward.iter().zip(dist) {
        assert!((reward - (1.0 - d.tanh())).abs() < 1e-5);
    }
    assert_eq!(out.terminated, vec![false; 2]);
    assert_eq!(out.info.flags["is_fallen"], vec![false; 2]);
    Ok(())
}

#[test]
fn sparse_and_none_rewards() -> Result<()> {
    let mut sparse = TaskEnv::<QuadrupedReach>::new(&gpu_config(2), RewardMode::Sparse)?;
    sparse.reset(Some(0))?;
    assert_eq!(sparse.step(&zero_actions(2))?.reward, vec![0.0; 2]);

    let mut none = TaskEnv::<QuadrupedReach>::new(&gpu_config(2), RewardMode::None)?;
    none.reset(Some(0))?;
    assert_eq!(none.step(&zero_actions(2))?.reward, vec![0.0; 2]);
    Ok(())
}

#[test]
fn episodes_truncate_at_step_limit() -> Result<()> {
    let mut env = TaskEnv::<QuadrupedReach>::new(&gpu_config(2), RewardMode::NormalizedDense)?;
    env.reset(Some(5))?;
    for step in 1..=QuadrupedReach::MAX_EPISODE_STEPS {
        let out = env.step(&zero_actions(2))?;
        let expected = step == QuadrupedReach::MAX_EPISODE_STEPS;
        assert_eq!(out.truncated, vec![expected; 2], "step {step}");
    }
    Ok(())
}

#[test]
fn forward_command_moves_robot_towards_goal() -> Result<()> {
    let mut env = TaskEnv::<QuadrupedReach>::new(&gpu_config(1), RewardMode::Dense)?;
    env.reset(Some(11))?;
    let mut out = env.step(&[vec![1.0, 0.0, 0.0]])?;
    for _ in 0..10 {
        out = env.step(&[vec![1.0, 0.0, 0.0]])?;
    }
    // half a second at full speed
    assert!(out.obs[0][0] > 0.4, "robot x = {}", out.obs[0][0]);
    Ok(())
}

#[test]
fn bad_action_shapes_are_rejected() -> Result<()> {
    let mut env = TaskEnv::<QuadrupedReach>::new(&gpu_config(2), RewardMode::Dense)?;
    env.reset(None)?;
    assert_eq!(
        env.step(&zero_actions(3)).unwrap_err(),
        TaskError::ActionRows { expected: 2, got: 3 }
    );
    assert_eq!(
        env.step(&[vec![0.0; 2], vec![0.0; 2]]).unwrap_err(),
        TaskError::ActionWidth { expected: 3, got: 2 }
    );
    Ok(())
}

#[test]
fn robot_on_goal_succeeds() -> Result<()> {
    let mut scene = ManagedScene::new(&gpu_config(2))?;
    let mut task = QuadrupedReach::load_scene(&mut scene)?;
    task.initialize_episode(&mut scene, &[0, 1], &mut fastrand::Rng::with_seed(9))?;

    let goal = task.goal.pose(&scene)?.p();
    let on_goal: Vec<[f32; 3]> = goal
        .iter()
        .map(|g| [g[0] + 0.1, g[1], Quadruped::STANDING_HEIGHT])
        .collect();
    // only the first sub-scene's robot is moved
    scene.set_reset_mask(&[0])?;
    task.agent.robot.set_pose(&mut scene, &Pose::create_from_p(&on_goal))?;
    scene.reset_mask_all();

    let eval = task.evaluate(&scene)?;
    assert_eq!(eval.success, vec![true, false]);
    assert_eq!(eval.fail, vec![false, false]);
    Ok(())
}

#[test]
fn low_robot_counts_as_fallen() -> Result<()> {
    let mut scene = ManagedScene::new(&gpu_config(1))?;
    let mut task = QuadrupedReach::load_scene(&mut scene)?;
    task.agent
        .robot
        .set_pose(&mut scene, &Pose::create_from_p(&[[0.0, 0.0, 0.2]]))?;
    let eval = task.evaluate(&scene)?;
    assert_eq!(eval.fail, vec![true]);
    assert_eq!(eval.success, vec![false]);
    Ok(())
}

#[test]
fn cpu_backend_runs_single_scene() -> Result<()> {
    let mut env = TaskEnv::<QuadrupedReach>::with_defaults(RewardMode::Dense)?;
    assert_eq!(env.num_envs(), 1);
    let obs = env.reset(Some(2))?;
    assert_eq!(obs[0].len(), QuadrupedReach::OBS_SIZE);
    let out = env.step(&zero_actions(1))?;
    assert_eq!(out.obs.len(), 1);
    Ok(())
}
