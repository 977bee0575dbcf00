//! # Engine Access Traits
//!
//! [`PhysxSystem`] holds what every backend can answer about an entity.
//! [`CpuSystem`] and [`GpuSystem`] add the two ways body state is reached,
//! and [`System`] carries whichever one the scene was configured with.

use crate::config::SimBackend;
use crate::types::{BodyType, EntityDesc, EntityId, RawPose, RigidBodyRow};
use crate::EngineError;

pub trait PhysxSystem: Send {
    /// Creates an entity and returns its handle.
    fn add_entity(&mut self, desc: EntityDesc) -> Result<EntityId, EngineError>;

    fn entity_name(&self, id: EntityId) -> Result<&str, EngineError>;

    fn body_type(&self, id: EntityId) -> Result<BodyType, EngineError>;

    /// Pose the entity was created with.
    fn initial_pose(&self, id: EntityId) -> Result<RawPose, EngineError>;

    fn collision_shape_count(&self, id: EntityId) -> Result<usize, EngineError>;

    /// Advances the engine by `dt` seconds.
    fn step(&mut self, dt: f32) -> Result<(), EngineError>;
}

/// Non-batched access: every body is reached through its own handle.
pub trait CpuSystem: PhysxSystem {
    fn pose(&self, id: EntityId) -> Result<RawPose, EngineError>;
    fn set_pose(&mut self, id: EntityId, pose: RawPose) -> Result<(), EngineError>;

    fn linear_velocity(&self, id: EntityId) -> Result<[f32; 3], EngineError>;
    fn set_linear_velocity(&mut self, id: EntityId, vel: [f32; 3]) -> Result<(), EngineError>;

    fn angular_velocity(&self, id: EntityId) -> Result<[f32; 3], EngineError>;
    fn set_angular_velocity(&mut self, id: EntityId, vel: [f32; 3]) -> Result<(), EngineError>;

    /// Render visibility in `[0, 1]`.
    fn visibility(&self, id: EntityId) -> Result<f32, EngineError>;
    fn set_visibility(&mut self, id: EntityId, visibility: f32) -> Result<(), EngineError>;

    fn remove_from_scene(&mut self, id: EntityId) -> Result<(), EngineError>;
}

/// Batched access: all non-static bodies live in one shared row buffer.
pub trait GpuSystem: PhysxSystem {
    /// Row of `id` in the rigid body buffer; `None` for static bodies.
    fn gpu_index(&self, id: EntityId) -> Result<Option<usize>, EngineError>;

    fn rigid_body_data(&self) -> &[RigidBodyRow];
    fn rigid_body_data_mut(&mut self) -> &mut [RigidBodyRow];

    /// Pushes the user-side buffer into the engine.
    fn gpu_apply_rigid_dynamic_data(&mut self) -> Result<(), EngineError>;

    /// Pulls the engine state back into the user-side buffer.
    fn gpu_fetch_rigid_dynamic_data(&mut self) -> Result<(), EngineError>;
}

pub enum System {
    Cpu(Box<dyn CpuSystem>),
    Gpu(Box<dyn GpuSystem>),
}

impl System {
    #[must_use]
    pub fn is_gpu_enabled(&self) -> bool {
        matches!(self, System::Gpu(_))
    }

    #[must_use]
    pub fn backend(&self) -> SimBackend {
        match self {
            System::Cpu(_) => SimBackend::Cpu,
            System::Gpu(_) => SimBackend::Gpu,
        }
    }

    #[must_use]
    pub fn as_cpu(&self) -> Option<&dyn CpuSystem> {
        match self {
            System::Cpu(system) => Some(system.as_ref()),
            System::Gpu(_) => None,
        }
    }

    pub fn as_cpu_mut(&mut self) -> Option<&mut dyn CpuSystem> {
        match self {
            System::Cpu(system) => Some(system.as_mut()),
            System::Gpu(_) => None,
        }
    }

    #[must_use]
    pub fn as_gpu(&self) -> Option<&dyn GpuSystem> {
        match self {
            System::Gpu(system) => Some(system.as_ref()),
            System::Cpu(_) => None,
        }
    }

    pub fn as_gpu_mut(&mut self) -> Option<&mut dyn GpuSystem> {
        match self {
            System::Gpu(system) => Some(system.as_mut()),
            System::Cpu(_) => None,
        }
    }

    pub fn add_entity(&mut self, desc: EntityDesc) -> Result<EntityId, EngineError> {
        match self {
            System::Cpu(system) => system.add_entity(desc),
            System::Gpu(system) => system.add_entity(desc),
        }
    }

    pub fn entity_name(&self, id: EntityId) -> Result<&str, EngineError> {
        match self {
            System::Cpu(system) => system.entity_name(id),
            System::Gpu(system) => system.entity_name(id),
        }
    }

    pub fn body_type(&self, id: EntityId) -> Result<BodyType, EngineError> {
        match self {
            System::Cpu(system) => system.body_type(id),
            System::Gpu(system) => system.body_type(id),
        }
    }

    pub fn initial_pose(&self, id: EntityId) -> Result<RawPose, EngineError> {
        match self {
            System::Cpu(system) => system.initial_pose(id),
            System::Gpu(system) => system.initial_pose(id),
        }
    }

    pub fn collision_shape_count(&self, id: EntityId) -> Result<usize, EngineError> {
        match self {
            System::Cpu(system) => system.collision_shape_count(id),
            System::Gpu(system) => system.collision_shape_count(id),
        }
    }

    pub fn step(&mut self, dt: f32) -> Result<(), EngineError> {
        match self {
            System::Cpu(system) => system.step(dt),
            System::Gpu(system) => system.step(dt),
        }
    }
}
