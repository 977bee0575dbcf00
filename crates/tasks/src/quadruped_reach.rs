//! # Quadruped Reach
//!
//! Walk the quadruped to a goal marker placed a few meters ahead of it.
//!
//! | | |
//! |---|---|
//! | success | base within 0.35 m of the goal (planar) and not fallen |
//! | fail | fallen |
//! | observation | robot root state (13), goal `xy`, robot to goal `xy` |
//! | action | `[vx, vy, yaw_rate]` in `[-1, 1]` |
//! | episode length | 200 control steps |

use std::collections::BTreeMap;

use engine::{BodyType, GpuMemoryConfig, SceneConfig, SimConfig};
use structs::{builder, Actor, ManagedScene, Pose};

use crate::env::{Evaluation, Task};
use crate::{Quadruped, TaskError};

const GOAL_COLOR: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
const GOAL_RADIUS: f32 = 0.2;
const REACH_DIST: f32 = 0.35;

pub struct QuadrupedReach {
    pub agent: Quadruped,
    pub ground: Actor,
    pub goal: Actor,
}

impl QuadrupedReach {
    pub const MAX_EPISODE_STEPS: u32 = 200;
    pub const OBS_SIZE: usize = Quadruped::OBS_SIZE + 4;

    /// Planar distance from robot base to goal, per sub-scene.
    pub fn robot_to_goal(&self, scene: &ManagedScene) -> Result<Vec<[f32; 2]>, TaskError> {
        let goal = self.goal.pose(scene)?.p();
        let robot = self.agent.robot.pose(scene)?.p();
        Ok(goal
            .iter()
            .zip(&robot)
            .map(|(g, r)| [g[0] - r[0], g[1] - r[1]])
            .collect())
    }
}

impl Task for QuadrupedReach {
    fn default_sim_config() -> SimConfig {
        SimConfig {
            gpu_memory_cfg: GpuMemoryConfig {
                max_rigid_contact_count: 1 << 20,
                ..GpuMemoryConfig::default()
            },
            scene_cfg: SceneConfig {
                solver_position_iterations: 4,
                solver_velocity_iterations: 0,
                ..SceneConfig::default()
            },
            ..SimConfig::default()
        }
    }

    fn load_scene(scene: &mut ManagedScene) -> Result<Self, TaskError> {
        let agent = Quadruped::load(scene)?;
        let ground = builder::build_ground(scene, 0.0)?;
        let goal = builder::build_sphere(
            scene,
            GOAL_RADIUS,
            GOAL_COLOR,
            "goal",
            false,
            BodyType::Kinematic,
        )?;
        Ok(Self { agent, ground, goal })
    }

    fn initialize_episode(
        &mut self,
        scene: &mut ManagedScene,
        env_idx: &[usize],
        rng: &mut fastrand::Rng,
    ) -> Result<(), TaskError> {
        self.agent.reset_to_standing(scene)?;
        let goals: Vec<[f32; 3]> = env_idx
            .iter()
            .map(|_| {
                let x = rng.f32() - 0.5 + 2.5;
                let y = rng.f32() * 4.0 - 2.0;
                [x, y, 0.0]
            })
            .collect();
        self.goal.set_pose(scene, &Pose::create_from_p(&goals))?;
        Ok(())
    }

    fn apply_action(&mut self, scene: &mut ManagedScene, actions: &[Vec<f32>]) -> Result<(), TaskError> {
        self.agent.set_action(scene, actions)
    }

    fn evaluate(&self, scene: &ManagedScene) -> Result<Evaluation, TaskError> {
        let is_fallen = self.agent.is_fallen(scene)?;
        let dist: Vec<f32> = self
            .robot_to_goal(scene)?
            .iter()
            .map(|[dx, dy]| dx.hypot(*dy))
            .collect();
        let reached: Vec<bool> = dist.iter().map(|&d| d < REACH_DIST).collect();
        let success = reached.iter().zip(&is_fallen).map(|(&r, &f)| r && !f).collect();
        Ok(Evaluation {
            success,
            fail: is_fallen.clone(),
            metrics: BTreeMap::from([("robot_to_goal_dist", dist)]),
            flags: BTreeMap::from([("reached_goal", reached), ("is_fallen", is_fallen)]),
        })
    }

    fn agent_obs(&self, scene: &ManagedScene) -> Result<Vec<Vec<f32>>, TaskError> {
        Ok(self
            .agent
            .state(scene)?
            .iter()
            .map(|state| state.to_vec())
            .collect())
    }

    fn obs_extra(&self, scene: &ManagedScene, _eval: &Evaluation) -> Result<Vec<Vec<f32>>, TaskError> {
        let goal = self.goal.pose(scene)?.p();
        let to_goal = self.robot_to_goal(scene)?;
        Ok(goal
            .iter()
            .zip(&to_goal)
            .map(|(g, d)| vec![g[0], g[1], d[0], d[1]])
            .collect())
    }

    fn compute_dense_reward(
        &self,
        scene: &ManagedScene,
        _actions: &[Vec<f32>],
        eval: &Evaluation,
    ) -> Result<Vec<f32>, TaskError> {
        let lin = self.agent.robot.linear_velocity(scene)?;
        let ang = self.agent.robot.angular_velocity(scene)?;
        let dist = match eval.metrics.get("robot_to_goal_dist") {
            Some(dist) => dist.clone(),
            None => self
                .robot_to_goal(scene)?
                .iter()
                .map(|[dx, dy]| dx.hypot(*dy))
                .collect(),
        };
        Ok(dist
            .iter()
            .zip(lin.iter().zip(&ang))
            .map(|(d, (v, w))| {
                let reaching = 1.0 - d.tanh();
                let penalties = -0.15 * v[2] * v[2] - 0.05 * (w[0] * w[0] + w[1] * w[1]);
                reaching + penalties
            })
            .collect())
    }

    fn max_dense_reward(&self) -> f32 {
        1.0
    }

    fn max_episode_steps(&self) -> u32 {
        Self::MAX_EPISODE_STEPS
    }

    fn obs_size(&self) -> usize {
        Self::OBS_SIZE
    }

    fn action_size(&self) -> usize {
        Quadruped::ACTION_SIZE
    }
}
