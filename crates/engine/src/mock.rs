//! # Reference Engine
//!
//! A deliberately small engine that implements both [`CpuSystem`] and
//! [`GpuSystem`] in process. It integrates velocities with semi-implicit
//! Euler, applies gravity to dynamic bodies and keeps them from sinking
//! through a ground plane. It is not a contact solver.
//!
//! [`MockGpuSystem`] keeps the user-visible buffer and the engine state apart,
//! so forgetting an apply or fetch shows up exactly as it would on a real
//! device.

use glam::{Quat, Vec3};

use crate::config::{SimBackend, SimConfig};
use crate::system::{CpuSystem, GpuSystem, PhysxSystem, System};
use crate::types::{BodyType, EntityDesc, EntityId, RawPose, RigidBodyRow, Shape};
use crate::EngineError;

/// Builds the backend selected by `cfg.backend`.
pub fn create_system(cfg: &SimConfig) -> Result<System, EngineError> {
    cfg.validate()?;
    tracing::debug!(
        "creating {:?} reference system for {} sub-scene(s)",
        cfg.backend,
        cfg.num_envs
    );
    let gravity = cfg.scene_cfg.gravity;
    Ok(match cfg.backend {
        SimBackend::Cpu => System::Cpu(Box::new(MockCpuSystem::new(gravity))),
        SimBackend::Gpu => System::Gpu(Box::new(MockGpuSystem::new(gravity))),
    })
}

#[derive(Clone, Debug)]
struct MockEntity {
    desc: EntityDesc,
    row: RigidBodyRow,
    visibility: f32,
    removed: bool,
    gpu_index: Option<usize>,
}

impl MockEntity {
    /// Lowest allowed `z` for the body origin when a ground plane exists.
    fn floor(&self, ground: Option<f32>) -> Option<f32> {
        let ground = ground?;
        let shape = self.desc.collision.first()?;
        Some(ground + shape.half_height())
    }
}

#[derive(Clone, Debug, Default)]
struct EntityStore {
    entities: Vec<MockEntity>,
}

impl EntityStore {
    fn push(&mut self, desc: EntityDesc, gpu_index: Option<usize>) -> Result<EntityId, EngineError> {
        let id = EntityId(u32::try_from(self.entities.len()).map_err(|_| EngineError::EntityLimit)?);
        tracing::trace!("adding {} entity {} as {id}", desc.body_type, desc.name);
        self.entities.push(MockEntity {
            row: RigidBodyRow::at_rest(desc.pose),
            desc,
            visibility: 1.0,
            removed: false,
            gpu_index,
        });
        Ok(id)
    }

    fn any(&self, id: EntityId) -> Result<&MockEntity, EngineError> {
        self.entities
            .get(id.0 as usize)
            .ok_or(EngineError::UnknownEntity(id))
    }

    fn live(&self, id: EntityId) -> Result<&MockEntity, EngineError> {
        let entity = self.any(id)?;
        if entity.removed {
            return Err(EngineError::EntityRemoved(id));
        }
        Ok(entity)
    }

    fn live_mut(&mut self, id: EntityId) -> Result<&mut MockEntity, EngineError> {
        let entity = self
            .entities
            .get_mut(id.0 as usize)
            .ok_or(EngineError::UnknownEntity(id))?;
        if entity.removed {
            return Err(EngineError::EntityRemoved(id));
        }
        Ok(entity)
    }

    /// Height of the highest static ground plane still in the scene.
    fn ground_height(&self) -> Option<f32> {
        self.entities
            .iter()
            .filter(|e| !e.removed && e.desc.body_type == BodyType::Static)
            .filter(|e| e.desc.collision.iter().any(|s| matches!(s, Shape::Plane)))
            .map(|e| e.desc.pose.p[2])
            .reduce(f32::max)
    }
}

fn advance_pose(row: &mut RigidBodyRow, dt: f32) {
    let vel = Vec3::from_array(row.linear_velocity);
    let ang = Vec3::from_array(row.angular_velocity);
    let translation = row.pose.translation() + vel * dt;
    let rotation = (Quat::from_scaled_axis(ang * dt) * row.pose.rotation()).normalize();
    row.pose = RawPose::from_glam(translation, rotation);
}

fn integrate(row: &mut RigidBodyRow, body_type: BodyType, gravity: Vec3, dt: f32, floor: Option<f32>) {
    match body_type {
        BodyType::Static => {}
        BodyType::Kinematic => advance_pose(row, dt),
        BodyType::Dynamic => {
            let vel = Vec3::from_array(row.linear_velocity) + gravity * dt;
            row.linear_velocity = vel.to_array();
            advance_pose(row, dt);
            if let Some(min_z) = floor {
                if row.pose.p[2] < min_z {
                    row.pose.p[2] = min_z;
                    row.linear_velocity[2] = row.linear_velocity[2].max(0.0);
                }
            }
        }
    }
}

macro_rules! impl_entity_queries {
    () => {
        fn entity_name(&self, id: EntityId) -> Result<&str, EngineError> {
            Ok(self.store.any(id)?.desc.name.as_str())
        }

        fn body_type(&self, id: EntityId) -> Result<BodyType, EngineError> {
            Ok(self.store.any(id)?.desc.body_type)
        }

        fn initial_pose(&self, id: EntityId) -> Result<RawPose, EngineError> {
            Ok(self.store.any(id)?.desc.pose)
        }

        fn collision_shape_count(&self, id: EntityId) -> Result<usize, EngineError> {
            Ok(self.store.live(id)?.desc.collision.len())
        }
    };
}

/// Per-entity reference engine.
#[derive(Clone, Debug)]
pub struct MockCpuSystem {
    store: EntityStore,
    gravity: Vec3,
}

impl MockCpuSystem {
    #[must_use]
    pub fn new(gravity: [f32; 3]) -> Self {
        Self {
            store: EntityStore::default(),
            gravity: Vec3::from_array(gravity),
        }
    }

    #[must_use]
    pub fn is_removed(&self, id: EntityId) -> bool {
        self.store.any(id).is_ok_and(|e| e.removed)
    }

    fn dynamic_mut(&mut self, id: EntityId) -> Result<&mut MockEntity, EngineError> {
        let entity = self.store.live_mut(id)?;
        if entity.desc.body_type == BodyType::Static {
            return Err(EngineError::NotRigidDynamic(id));
        }
        Ok(entity)
    }
}

impl Default for MockCpuSystem {
    fn default() -> Self {
        Self::new(crate::SceneConfig::default().gravity)
    }
}

impl PhysxSystem for MockCpuSystem {
    fn add_entity(&mut self, desc: EntityDesc) -> Result<EntityId, EngineError> {
        self.store.push(desc, None)
    }

    impl_entity_queries!();

    fn step(&mut self, dt: f32) -> Result<(), EngineError> {
        let ground = self.store.ground_height();
        let gravity = self.gravity;
        for entity in self.store.entities.iter_mut().filter(|e| !e.removed) {
            let floor = entity.floor(ground);
            integrate(&mut entity.row, entity.desc.body_type, gravity, dt, floor);
        }
        Ok(())
    }
}

impl CpuSystem for MockCpuSystem {
    fn pose(&self, id: EntityId) -> Result<RawPose, EngineError> {
        Ok(self.store.live(id)?.row.pose)
    }

    fn set_pose(&mut self, id: EntityId, pose: RawPose) -> Result<(), EngineError> {
        self.store.live_mut(id)?.row.pose = pose;
        Ok(())
    }

    fn linear_velocity(&self, id: EntityId) -> Result<[f32; 3], EngineError> {
        Ok(self.store.live(id)?.row.linear_velocity)
    }

    fn set_linear_velocity(&mut self, id: EntityId, vel: [f32; 3]) -> Result<(), EngineError> {
        self.dynamic_mut(id)?.row.linear_velocity = vel;
        Ok(())
    }

    fn angular_velocity(&self, id: EntityId) -> Result<[f32; 3], EngineError> {
        Ok(self.store.live(id)?.row.angular_velocity)
    }

    fn set_angular_velocity(&mut self, id: EntityId, vel: [f32; 3]) -> Result<(), EngineError> {
        self.dynamic_mut(id)?.row.angular_velocity = vel;
        Ok(())
    }

    fn visibility(&self, id: EntityId) -> Result<f32, EngineError> {
        Ok(self.store.any(id)?.visibility)
    }

    fn set_visibility(&mut self, id: EntityId, visibility: f32) -> Result<(), EngineError> {
        self.store.live_mut(id)?.visibility = visibility.clamp(0.0, 1.0);
        Ok(())
    }

    fn remove_from_scene(&mut self, id: EntityId) -> Result<(), EngineError> {
        self.store.live_mut(id)?.removed = true;
        Ok(())
    }
}

/// Batched reference engine with separate staging and engine buffers.
#[derive(Clone, Debug)]
pub struct MockGpuSystem {
    store: EntityStore,
    gravity: Vec3,
    staging: Vec<RigidBodyRow>,
    state: Vec<RigidBodyRow>,
    row_entities: Vec<EntityId>,
    apply_count: usize,
    fetch_count: usize,
}

impl MockGpuSystem {
    #[must_use]
    pub fn new(gravity: [f32; 3]) -> Self {
        Self {
            store: EntityStore::default(),
            gravity: Vec3::from_array(gravity),
            staging: Vec::new(),
            state: Vec::new(),
            row_entities: Vec::new(),
            apply_count: 0,
            fetch_count: 0,
        }
    }

    /// Rows as the engine currently sees them.
    #[must_use]
    pub fn engine_rows(&self) -> &[RigidBodyRow] {
        &self.state
    }

    #[must_use]
    pub fn apply_count(&self) -> usize {
        self.apply_count
    }

    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetch_count
    }
}

impl Default for MockGpuSystem {
    fn default() -> Self {
        Self::new(crate::SceneConfig::default().gravity)
    }
}

impl PhysxSystem for MockGpuSystem {
    fn add_entity(&mut self, desc: EntityDesc) -> Result<EntityId, EngineError> {
        let gpu_index = (desc.body_type != BodyType::Static).then_some(self.state.len());
        let row = RigidBodyRow::at_rest(desc.pose);
        let id = self.store.push(desc, gpu_index)?;
        if gpu_index.is_some() {
            self.staging.push(row);
            self.state.push(row);
            self.row_entities.push(id);
        }
        Ok(id)
    }

    impl_entity_queries!();

    fn step(&mut self, dt: f32) -> Result<(), EngineError> {
        let ground = self.store.ground_height();
        for (row, id) in self.state.iter_mut().zip(&self.row_entities) {
            let entity = self.store.any(*id)?;
            integrate(row, entity.desc.body_type, self.gravity, dt, entity.floor(ground));
        }
        Ok(())
    }
}

impl GpuSystem for MockGpuSystem {
    fn gpu_index(&self, id: EntityId) -> Result<Option<usize>, EngineError> {
        Ok(self.store.any(id)?.gpu_index)
    }

    fn rigid_body_data(&self) -> &[RigidBodyRow] {
        &self.staging
    }

    fn rigid_body_data_mut(&mut self) -> &mut [RigidBodyRow] {
        &mut self.staging
    }

    fn gpu_apply_rigid_dynamic_data(&mut self) -> Result<(), EngineError> {
        if self.staging.len() != self.state.len() {
            return Err(EngineError::ShapeMismatch("staging buffer length differs from engine state"));
        }
        self.state.copy_from_slice(&self.staging);
        self.apply_count += 1;
        Ok(())
    }

    fn gpu_fetch_rigid_dynamic_data(&mut self) -> Result<(), EngineError> {
        if self.staging.len() != self.state.len() {
            return Err(EngineError::ShapeMismatch("staging buffer length differs from engine state"));
        }
        self.staging.copy_from_slice(&self.state);
        self.fetch_count += 1;
        Ok(())
    }
}
