//! Quadruped robot.
//!
//! The robot is reduced to its floating base: one dynamic box whose collision
//! envelope covers the legs in the standing pose. Actions are base velocity
//! commands, which is what a locomotion controller would track.

use engine::{BodyType, RawPose, Shape};
use glam::{Quat, Vec3};
use structs::{Actor, ActorBuilder, ActorState, ManagedScene, Pose, STATE_WIDTH};

use crate::TaskError;

const BODY_COLOR: [f32; 4] = [0.8, 0.4, 0.1, 1.0];

pub struct Quadruped {
    pub robot: Actor,
}

impl Quadruped {
    pub const UID: &'static str = "anymal_c";
    /// Base height of the `standing` keyframe.
    pub const STANDING_HEIGHT: f32 = 0.545;
    pub const HALF_EXTENTS: [f32; 3] = [0.4, 0.25, Self::STANDING_HEIGHT];
    /// `[vx, vy, yaw_rate]`, each in `[-1, 1]`.
    pub const ACTION_SIZE: usize = 3;
    pub const OBS_SIZE: usize = STATE_WIDTH;
    pub const MAX_LIN_SPEED: f32 = 1.0;
    pub const MAX_YAW_RATE: f32 = 1.5;
    pub const FALLEN_HEIGHT: f32 = 0.3;
    pub const FALLEN_TILT: f32 = std::f32::consts::FRAC_PI_3;

    pub fn load(scene: &mut ManagedScene) -> Result<Self, TaskError> {
        let envelope = Shape::Box {
            half_extents: Self::HALF_EXTENTS,
        };
        let robot = ActorBuilder::new(Self::UID)
            .body_type(BodyType::Dynamic)
            .initial_pose(Self::standing())
            .visual(envelope.clone(), BODY_COLOR)
            .collision(envelope)
            .build(scene)?;
        Ok(Self { robot })
    }

    #[must_use]
    pub fn standing() -> RawPose {
        RawPose::from_p([0.0, 0.0, Self::STANDING_HEIGHT])
    }

    /// Puts the robot back into the `standing` keyframe, at rest.
    pub fn reset_to_standing(&mut self, scene: &mut ManagedScene) -> Result<(), TaskError> {
        self.robot.set_pose(scene, &Pose::from(Self::standing()))?;
        self.robot.set_linear_velocity(scene, &[[0.0; 3]])?;
        self.robot.set_angular_velocity(scene, &[[0.0; 3]])?;
        Ok(())
    }

    /// Turns base velocity commands into body velocities. Planar commands are
    /// in the robot's heading frame; vertical and roll/pitch motion is left
    /// to the engine.
    pub fn set_action(&self, scene: &mut ManagedScene, actions: &[Vec<f32>]) -> Result<(), TaskError> {
        let pose = self.robot.pose(scene)?;
        let lin = self.robot.linear_velocity(scene)?;
        let ang = self.robot.angular_velocity(scene)?;

        let mut lin_cmd = Vec::with_capacity(actions.len());
        let mut ang_cmd = Vec::with_capacity(actions.len());
        for (((action, pose), v), w) in actions.iter().zip(pose.raw_pose()).zip(&lin).zip(&ang) {
            let [vx, vy, yaw_rate] = command(action);
            let heading = Quat::from_rotation_z(yaw(pose.rotation()));
            let planar = heading * Vec3::new(vx, vy, 0.0) * Self::MAX_LIN_SPEED;
            lin_cmd.push([planar.x, planar.y, v[2]]);
            ang_cmd.push([w[0], w[1], yaw_rate * Self::MAX_YAW_RATE]);
        }
        self.robot.set_linear_velocity(scene, &lin_cmd)?;
        self.robot.set_angular_velocity(scene, &ang_cmd)?;
        Ok(())
    }

    /// Base too low or tilted past the limit.
    pub fn is_fallen(&self, scene: &ManagedScene) -> Result<Vec<bool>, TaskError> {
        Ok(self
            .robot
            .pose(scene)?
            .raw_pose()
            .iter()
            .map(|pose| pose.p[2] < Self::FALLEN_HEIGHT || tilt(pose.rotation()) > Self::FALLEN_TILT)
            .collect())
    }

    pub fn state(&self, scene: &ManagedScene) -> Result<Vec<ActorState>, TaskError> {
        Ok(self.robot.get_state(scene)?)
    }
}

/// Clamped `[vx, vy, yaw_rate]`; missing entries read as zero.
fn command(action: &[f32]) -> [f32; 3] {
    let mut cmd = [0.0; 3];
    for (slot, a) in cmd.iter_mut().zip(action) {
        *slot = a.clamp(-1.0, 1.0);
    }
    cmd
}

fn yaw(rotation: Quat) -> f32 {
    let forward = rotation * Vec3::X;
    forward.y.atan2(forward.x)
}

/// Angle between the body's up axis and the world's.
fn tilt(rotation: Quat) -> f32 {
    (rotation * Vec3::Z).dot(Vec3::Z).clamp(-1.0, 1.0).acos()
}
