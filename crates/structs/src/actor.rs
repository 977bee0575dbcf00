//! # Actor
//!
//! An [`Actor`] manages one engine body per sub-scene (or any list of bodies
//! after [`Actor::merge`]) and reads or writes their state as one batch.
//!
//! The access path is fixed when the actor is created:
//!
//! -   **CPU**: each body is reached through its own engine handle. Writes
//!     take a single value broadcast to every body or one value per body.
//! -   **GPU**: bodies are rows of the engine's shared rigid body buffer.
//!     Writes only touch rows whose sub-scene is in the scene's reset mask,
//!     and only reach the engine after the next apply.
//!
//! Static bodies have no buffer rows; on the GPU path their pose is the
//! cached initial pose.

use std::cell::OnceCell;
use std::fmt;

use engine::{BodyType, CpuSystem, EngineError, EntityId, GpuSystem, RawPose, RigidBodyRow};

use crate::{ActorError, ManagedScene, Pose};

/// Values per body in [`Actor::get_state`]: pose (7), linear velocity (3),
/// angular velocity (3).
pub const STATE_WIDTH: usize = 13;

pub type ActorState = [f32; STATE_WIDTH];

pub const DEFAULT_LIN_THRESH: f32 = 1e-2;
pub const DEFAULT_ANG_THRESH: f32 = 1e-1;

/// How far hidden bodies are moved on the GPU path.
const HIDE_OFFSET: f32 = 99_999.0;

#[derive(Clone, Debug)]
enum BodyAccess {
    Cpu,
    Gpu(GpuRows),
}

#[derive(Clone, Debug, Default)]
struct GpuRows {
    body_data_index: Vec<usize>,
    before_hide_pose: Option<Vec<RawPose>>,
}

#[derive(Copy, Clone, Debug)]
enum VelocityKind {
    Linear,
    Angular,
}

impl VelocityKind {
    fn read(self, row: &RigidBodyRow) -> [f32; 3] {
        match self {
            VelocityKind::Linear => row.linear_velocity,
            VelocityKind::Angular => row.angular_velocity,
        }
    }

    fn slot(self, row: &mut RigidBodyRow) -> &mut [f32; 3] {
        match self {
            VelocityKind::Linear => &mut row.linear_velocity,
            VelocityKind::Angular => &mut row.angular_velocity,
        }
    }

    fn get(self, cpu: &dyn CpuSystem, id: EntityId) -> Result<[f32; 3], EngineError> {
        match self {
            VelocityKind::Linear => cpu.linear_velocity(id),
            VelocityKind::Angular => cpu.angular_velocity(id),
        }
    }

    fn set(self, cpu: &mut dyn CpuSystem, id: EntityId, vel: [f32; 3]) -> Result<(), EngineError> {
        match self {
            VelocityKind::Linear => cpu.set_linear_velocity(id, vel),
            VelocityKind::Angular => cpu.set_angular_velocity(id, vel),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Actor {
    pub name: String,
    pub px_body_type: BodyType,
    /// Pose each managed body was created with.
    pub initial_pose: Pose,
    hidden: bool,
    merged: bool,
    entities: Vec<EntityId>,
    scene_idxs: Vec<usize>,
    access: BodyAccess,
    collision_shapes: OnceCell<bool>,
}

impl Actor {
    /// Wraps engine entities, one per entry of `scene_idxs`.
    ///
    /// The body type is taken from the first entity. The actor name is the
    /// first entity's name without its `scene-N_` prefix.
    pub fn create_from_entities(
        scene: &ManagedScene,
        entities: Vec<EntityId>,
        scene_idxs: Vec<usize>,
    ) -> Result<Self, ActorError> {
        let first = *entities.first().ok_or(ActorError::Empty)?;
        if scene_idxs.len() != entities.len() {
            return Err(ActorError::CountMismatch {
                expected: entities.len(),
                got: scene_idxs.len(),
            });
        }
        if let Some(&index) = scene_idxs.iter().find(|&&i| i >= scene.num_envs()) {
            return Err(ActorError::SceneIndexOutOfRange {
                index,
                num_envs: scene.num_envs(),
            });
        }

        let system = scene.system();
        let px_body_type = system.body_type(first)?;
        let name = shared_name(system.entity_name(first)?).to_owned();
        let initial_pose = entities
            .iter()
            .map(|&id| system.initial_pose(id))
            .collect::<Result<Vec<_>, _>>()?;

        let access = match system.as_gpu() {
            None => BodyAccess::Cpu,
            Some(_) if px_body_type == BodyType::Static => BodyAccess::Gpu(GpuRows::default()),
            Some(gpu) => {
                let body_data_index = entities
                    .iter()
                    .map(|&id| gpu.gpu_index(id)?.ok_or(EngineError::NotRigidDynamic(id)))
                    .collect::<Result<Vec<_>, _>>()?;
                BodyAccess::Gpu(GpuRows {
                    body_data_index,
                    before_hide_pose: None,
                })
            }
        };

        Ok(Self {
            name,
            px_body_type,
            initial_pose: Pose::create(initial_pose),
            hidden: false,
            merged: false,
            entities,
            scene_idxs,
            access,
            collision_shapes: OnceCell::new(),
        })
    }

    /// Views several actors as one, e.g. a differently shaped object loaded in
    /// each sub-scene. Members stay usable on their own.
    pub fn merge(
        scene: &mut ManagedScene,
        actors: &[&Actor],
        name: &str,
    ) -> Result<Self, ActorError> {
        let first = *actors.first().ok_or(ActorError::Empty)?;
        for actor in actors {
            if actor.px_body_type != first.px_body_type {
                return Err(ActorError::MixedBodyTypes(
                    first.px_body_type.to_string(),
                    actor.px_body_type.to_string(),
                ));
            }
            if matches!(actor.access, BodyAccess::Cpu) != matches!(first.access, BodyAccess::Cpu) {
                return Err(ActorError::BackendMismatch(actor.name.clone()));
            }
        }

        let entities: Vec<EntityId> = actors.iter().flat_map(|a| a.entities.iter().copied()).collect();
        let scene_idxs = actors.iter().flat_map(|a| a.scene_idxs.iter().copied()).collect();
        let initial_poses: Vec<&Pose> = actors.iter().map(|a| &a.initial_pose).collect();
        let access = match first.access {
            BodyAccess::Cpu => BodyAccess::Cpu,
            BodyAccess::Gpu(_) => BodyAccess::Gpu(GpuRows {
                body_data_index: actors
                    .iter()
                    .flat_map(|a| a.row_indices().iter().copied())
                    .collect(),
                before_hide_pose: None,
            }),
        };

        scene.register_actor_view(name, &entities)?;
        tracing::debug!("merged {} actors into {name} ({} entities)", actors.len(), entities.len());

        Ok(Self {
            name: name.to_owned(),
            px_body_type: first.px_body_type,
            initial_pose: Pose::vstack(&initial_poses),
            hidden: false,
            merged: true,
            entities,
            scene_idxs,
            access,
            collision_shapes: OnceCell::new(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Sub-scene of each managed body.
    #[must_use]
    pub fn scene_idxs(&self) -> &[usize] {
        &self.scene_idxs
    }

    /// Row of each managed body in the GPU buffer. Empty on the CPU path and
    /// for static bodies.
    #[must_use]
    pub fn row_indices(&self) -> &[usize] {
        match &self.access {
            BodyAccess::Cpu => &[],
            BodyAccess::Gpu(rows) => &rows.body_data_index,
        }
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.merged
    }

    pub fn pose(&self, scene: &ManagedScene) -> Result<Pose, ActorError> {
        match &self.access {
            BodyAccess::Cpu => {
                let cpu = cpu(scene, &self.name)?;
                let raw = self
                    .entities
                    .iter()
                    .map(|&id| cpu.pose(id))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Pose::create(raw))
            }
            BodyAccess::Gpu(_) if self.px_body_type == BodyType::Static => {
                Ok(self.initial_pose.broadcast(self.entities.len()))
            }
            BodyAccess::Gpu(rows) => {
                if self.hidden {
                    if let Some(snapshot) = &rows.before_hide_pose {
                        return Ok(Pose::create(snapshot.clone()));
                    }
                }
                let data = gpu(scene, &self.name)?.rigid_body_data();
                let raw = rows
                    .body_data_index
                    .iter()
                    .map(|&row| row_at(data, row).map(|r| r.pose))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Pose::create(raw))
            }
        }
    }

    /// Writes `pose` as a broadcast (one row), per selected body, or per body.
    ///
    /// On the GPU path only bodies in the scene's reset mask are written, and
    /// a hidden actor writes into its pre-hide snapshot instead of the buffer.
    pub fn set_pose(&mut self, scene: &mut ManagedScene, pose: &Pose) -> Result<(), ActorError> {
        let values = pose.raw_pose();
        match &mut self.access {
            BodyAccess::Cpu => {
                let writes = masked_writes(&vec![true; self.entities.len()], values)?;
                let cpu = cpu_mut(scene, &self.name)?;
                for (i, raw) in writes {
                    cpu.set_pose(self.entities[i], raw)?;
                }
            }
            BodyAccess::Gpu(_) if self.px_body_type == BodyType::Static => {
                return Err(ActorError::StaticPoseWrite(self.name.clone()));
            }
            BodyAccess::Gpu(rows) => {
                let writes = masked_writes(&scene.body_mask(&self.scene_idxs), values)?;
                if self.hidden {
                    if let Some(snapshot) = rows.before_hide_pose.as_mut() {
                        for (i, raw) in writes {
                            snapshot[i] = raw;
                        }
                        return Ok(());
                    }
                }
                let data = gpu_mut(scene, &self.name)?.rigid_body_data_mut();
                for (i, raw) in writes {
                    row_at_mut(data, rows.body_data_index[i])?.pose = raw;
                }
            }
        }
        Ok(())
    }

    /// Zero for bodies that are not dynamic.
    pub fn linear_velocity(&self, scene: &ManagedScene) -> Result<Vec<[f32; 3]>, ActorError> {
        self.velocity(scene, VelocityKind::Linear)
    }

    /// Zero for bodies that are not dynamic.
    pub fn angular_velocity(&self, scene: &ManagedScene) -> Result<Vec<[f32; 3]>, ActorError> {
        self.velocity(scene, VelocityKind::Angular)
    }

    pub fn set_linear_velocity(
        &self,
        scene: &mut ManagedScene,
        vel: &[[f32; 3]],
    ) -> Result<(), ActorError> {
        self.set_velocity(scene, VelocityKind::Linear, vel)
    }

    pub fn set_angular_velocity(
        &self,
        scene: &mut ManagedScene,
        vel: &[[f32; 3]],
    ) -> Result<(), ActorError> {
        self.set_velocity(scene, VelocityKind::Angular, vel)
    }

    fn velocity(&self, scene: &ManagedScene, kind: VelocityKind) -> Result<Vec<[f32; 3]>, ActorError> {
        if !self.px_body_type.is_dynamic() {
            return Ok(vec![[0.0; 3]; self.entities.len()]);
        }
        let values = match &self.access {
            BodyAccess::Cpu => {
                let cpu = cpu(scene, &self.name)?;
                self.entities
                    .iter()
                    .map(|&id| kind.get(cpu, id))
                    .collect::<Result<Vec<_>, _>>()?
            }
            BodyAccess::Gpu(rows) => {
                let data = gpu(scene, &self.name)?.rigid_body_data();
                rows.body_data_index
                    .iter()
                    .map(|&row| row_at(data, row).map(|r| kind.read(r)))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(values)
    }

    fn set_velocity(
        &self,
        scene: &mut ManagedScene,
        kind: VelocityKind,
        values: &[[f32; 3]],
    ) -> Result<(), ActorError> {
        if !self.px_body_type.is_dynamic() {
            return Err(ActorError::NotDynamic(self.name.clone()));
        }
        match &self.access {
            BodyAccess::Cpu => {
                let writes = masked_writes(&vec![true; self.entities.len()], values)?;
                let cpu = cpu_mut(scene, &self.name)?;
                for (i, vel) in writes {
                    kind.set(cpu, self.entities[i], vel)?;
                }
            }
            BodyAccess::Gpu(rows) => {
                let writes = masked_writes(&scene.body_mask(&self.scene_idxs), values)?;
                let data = gpu_mut(scene, &self.name)?.rigid_body_data_mut();
                for (i, vel) in writes {
                    *kind.slot(row_at_mut(data, rows.body_data_index[i])?) = vel;
                }
            }
        }
        Ok(())
    }

    /// One row of [`STATE_WIDTH`] values per body.
    pub fn get_state(&self, scene: &ManagedScene) -> Result<Vec<ActorState>, ActorError> {
        let pose = self.pose(scene)?;
        let lin = self.linear_velocity(scene)?;
        let ang = self.angular_velocity(scene)?;
        Ok(pose
            .raw_pose()
            .iter()
            .zip(lin)
            .zip(ang)
            .map(|((pose, v), w)| {
                let [px, py, pz] = pose.p;
                let [qw, qx, qy, qz] = pose.q;
                let [vx, vy, vz] = v;
                let [wx, wy, wz] = w;
                [px, py, pz, qw, qx, qy, qz, vx, vy, vz, wx, wy, wz]
            })
            .collect())
    }

    /// Inverse of [`Actor::get_state`]. Velocities are ignored unless the
    /// actor is dynamic.
    pub fn set_state(
        &mut self,
        scene: &mut ManagedScene,
        states: &[ActorState],
    ) -> Result<(), ActorError> {
        let mut poses = Vec::with_capacity(states.len());
        let mut lin = Vec::with_capacity(states.len());
        let mut ang = Vec::with_capacity(states.len());
        for &[px, py, pz, qw, qx, qy, qz, vx, vy, vz, wx, wy, wz] in states {
            poses.push(RawPose::new([px, py, pz], [qw, qx, qy, qz]));
            lin.push([vx, vy, vz]);
            ang.push([wx, wy, wz]);
        }
        self.set_pose(scene, &Pose::create(poses))?;
        if self.px_body_type.is_dynamic() {
            self.set_linear_velocity(scene, &lin)?;
            self.set_angular_velocity(scene, &ang)?;
        }
        Ok(())
    }

    /// Whether the first managed body has collision shapes. Not defined for
    /// merged actors, whose members may differ.
    pub fn has_collision_shapes(&self, scene: &ManagedScene) -> Result<bool, ActorError> {
        if self.merged {
            return Err(ActorError::MergedCollisionQuery(self.name.clone()));
        }
        if let Some(&cached) = self.collision_shapes.get() {
            return Ok(cached);
        }
        let has_shapes = scene.system().collision_shape_count(self.entities[0])? > 0;
        let _ = self.collision_shapes.set(has_shapes);
        Ok(has_shapes)
    }

    fn ensure_no_collision_shapes(&self, scene: &ManagedScene) -> Result<(), ActorError> {
        let has_shapes = if self.merged {
            let system = scene.system();
            let mut any = false;
            for &id in &self.entities {
                any |= system.collision_shape_count(id)? > 0;
            }
            any
        } else {
            self.has_collision_shapes(scene)?
        };
        if has_shapes {
            tracing::warn!("refusing to toggle visibility of collidable actor {}", self.name);
            return Err(ActorError::CollisionShapesPresent(self.name.clone()));
        }
        Ok(())
    }

    /// Hides the actor from view.
    ///
    /// On the GPU path visibility cannot change on the fly, so the bodies are
    /// moved far outside the scene after their pose is saved. Every body is
    /// moved, whatever the reset mask says. This needs an apply and fetch of
    /// the whole buffer, which is not cheap.
    pub fn hide_visual(&mut self, scene: &mut ManagedScene) -> Result<(), ActorError> {
        self.ensure_no_collision_shapes(scene)?;
        if self.hidden {
            return Ok(());
        }
        match self.access {
            BodyAccess::Cpu => {
                let cpu = cpu_mut(scene, &self.name)?;
                for &id in &self.entities {
                    cpu.set_visibility(id, 0.0)?;
                }
            }
            BodyAccess::Gpu(_) if self.px_body_type == BodyType::Static => {
                return Err(ActorError::StaticPoseWrite(self.name.clone()));
            }
            BodyAccess::Gpu(_) => {
                let snapshot = self.pose(scene)?.into_raw();
                let far_away: Vec<RawPose> = snapshot
                    .iter()
                    .map(|pose| {
                        let mut moved = *pose;
                        moved.p.iter_mut().for_each(|x| *x += HIDE_OFFSET);
                        moved
                    })
                    .collect();
                self.write_every_row(scene, &far_away)?;
                scene.gpu_apply_all()?;
                scene.gpu_fetch_all()?;
                if let BodyAccess::Gpu(rows) = &mut self.access {
                    rows.before_hide_pose = Some(snapshot);
                }
            }
        }
        // only now, so the writes above went to the live buffer
        self.hidden = true;
        tracing::debug!("hid actor {}", self.name);
        Ok(())
    }

    /// Undoes [`Actor::hide_visual`].
    pub fn show_visual(&mut self, scene: &mut ManagedScene) -> Result<(), ActorError> {
        self.ensure_no_collision_shapes(scene)?;
        if !self.hidden {
            return Ok(());
        }
        // cleared first so the restore below reaches the live buffer
        self.hidden = false;
        let snapshot = match &mut self.access {
            BodyAccess::Cpu => {
                let cpu = cpu_mut(scene, &self.name)?;
                for &id in &self.entities {
                    cpu.set_visibility(id, 1.0)?;
                }
                None
            }
            BodyAccess::Gpu(rows) => rows.before_hide_pose.take(),
        };
        if let Some(snapshot) = snapshot {
            self.write_every_row(scene, &snapshot)?;
            scene.gpu_apply_all()?;
            scene.gpu_fetch_all()?;
        }
        tracing::debug!("showed actor {}", self.name);
        Ok(())
    }

    /// Writes one pose per body into the live buffer, ignoring the reset mask.
    fn write_every_row(&self, scene: &mut ManagedScene, poses: &[RawPose]) -> Result<(), ActorError> {
        let BodyAccess::Gpu(rows) = &self.access else {
            return Err(ActorError::BackendMismatch(self.name.clone()));
        };
        if poses.len() != rows.body_data_index.len() {
            return Err(ActorError::CountMismatch {
                expected: rows.body_data_index.len(),
                got: poses.len(),
            });
        }
        let data = gpu_mut(scene, &self.name)?.rigid_body_data_mut();
        for (&row, &raw) in rows.body_data_index.iter().zip(poses) {
            row_at_mut(data, row)?.pose = raw;
        }
        Ok(())
    }

    /// Per body: linear speed at most `lin_thresh` and angular speed at most
    /// `ang_thresh`.
    pub fn is_static(
        &self,
        scene: &ManagedScene,
        lin_thresh: f32,
        ang_thresh: f32,
    ) -> Result<Vec<bool>, ActorError> {
        let lin = self.linear_velocity(scene)?;
        let ang = self.angular_velocity(scene)?;
        Ok(lin
            .iter()
            .zip(&ang)
            .map(|(v, w)| {
                glam::Vec3::from_array(*v).length() <= lin_thresh
                    && glam::Vec3::from_array(*w).length() <= ang_thresh
            })
            .collect())
    }

    /// Removes every managed body from the engine. Only possible on the CPU
    /// path; the GPU buffer layout cannot shrink while the simulation runs.
    pub fn remove_from_scene(&self, scene: &mut ManagedScene) -> Result<(), ActorError> {
        match self.access {
            BodyAccess::Gpu(_) => {
                tracing::error!("attempted to remove {} during gpu simulation", self.name);
                Err(ActorError::GpuRemoval(self.name.clone()))
            }
            BodyAccess::Cpu => {
                let cpu = cpu_mut(scene, &self.name)?;
                for &id in &self.entities {
                    cpu.remove_from_scene(id)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}: struct of type Actor; managing {} {} entities>",
            self.name,
            self.entities.len(),
            self.px_body_type
        )
    }
}

fn shared_name(entity_name: &str) -> &str {
    entity_name
        .split_once('_')
        .map_or(entity_name, |(_, rest)| rest)
}

/// Pairs each value with the body it is written to.
///
/// `values` holds one value for every selected body, a single value for all of
/// them, or one value per body of which only the selected ones are used.
fn masked_writes<T: Copy>(mask: &[bool], values: &[T]) -> Result<Vec<(usize, T)>, ActorError> {
    let selected: Vec<usize> = mask
        .iter()
        .enumerate()
        .filter_map(|(i, &m)| m.then_some(i))
        .collect();
    match values.len() {
        1 => Ok(selected.iter().map(|&i| (i, values[0])).collect()),
        n if n == selected.len() => Ok(selected.into_iter().zip(values.iter().copied()).collect()),
        n if n == mask.len() => Ok(selected.iter().map(|&i| (i, values[i])).collect()),
        n => Err(ActorError::CountMismatch {
            expected: selected.len(),
            got: n,
        }),
    }
}

fn row_at(data: &[RigidBodyRow], row: usize) -> Result<&RigidBodyRow, EngineError> {
    let rows = data.len();
    data.get(row).ok_or(EngineError::RowOutOfRange { row, rows })
}

fn row_at_mut(data: &mut [RigidBodyRow], row: usize) -> Result<&mut RigidBodyRow, EngineError> {
    let rows = data.len();
    data.get_mut(row).ok_or(EngineError::RowOutOfRange { row, rows })
}

fn cpu<'s>(scene: &'s ManagedScene, name: &str) -> Result<&'s dyn CpuSystem, ActorError> {
    scene
        .system()
        .as_cpu()
        .ok_or_else(|| ActorError::BackendMismatch(name.to_owned()))
}

fn cpu_mut<'s>(scene: &'s mut ManagedScene, name: &str) -> Result<&'s mut dyn CpuSystem, ActorError> {
    scene
        .system_mut()
        .as_cpu_mut()
        .ok_or_else(|| ActorError::BackendMismatch(name.to_owned()))
}

fn gpu<'s>(scene: &'s ManagedScene, name: &str) -> Result<&'s dyn GpuSystem, ActorError> {
    scene
        .system()
        .as_gpu()
        .ok_or_else(|| ActorError::BackendMismatch(name.to_owned()))
}

fn gpu_mut<'s>(scene: &'s mut ManagedScene, name: &str) -> Result<&'s mut dyn GpuSystem, ActorError> {
    scene
        .system_mut()
        .as_gpu_mut()
        .ok_or_else(|| ActorError::BackendMismatch(name.to_owned()))
}
