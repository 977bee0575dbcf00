#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! # Engine Boundary
//!
//! The physics engine that actually simulates rigid bodies is an external
//! collaborator. This crate describes how the rest of the workspace talks to
//! it, and nothing more:
//!
//! -   [`CpuSystem`]: per-entity handles. Pose and velocity are read and
//!     written one body at a time.
//! -   [`GpuSystem`]: a single contiguous buffer of [`RigidBodyRow`]s shared by
//!     every parallel sub-scene. Writes land in a staging copy and only reach
//!     the engine after [`GpuSystem::gpu_apply_rigid_dynamic_data`]; engine
//!     results only become visible after
//!     [`GpuSystem::gpu_fetch_rigid_dynamic_data`].
//! -   [`System`]: the backend chosen once from [`SimConfig::backend`].
//!
//! With the `mock` feature (enabled by default) the [`mock`] module provides a
//! small in-process engine implementing both traits, used by tests and by the
//! `arena` runner.

pub mod config;
pub mod system;
pub mod types;

#[cfg(feature = "mock")]
pub mod mock;

use thiserror::Error;

pub use config::{GpuMemoryConfig, SceneConfig, SimBackend, SimConfig};
pub use system::{CpuSystem, GpuSystem, PhysxSystem, System};
pub use types::{
    BodyType, EntityDesc, EntityId, RawPose, RigidBodyRow, Shape, RIGID_BODY_ROW_WIDTH,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),
    #[error("entity {0} was removed from the scene")]
    EntityRemoved(EntityId),
    #[error("entity {0} has no rigid dynamic component")]
    NotRigidDynamic(EntityId),
    #[error("rigid body row {row} out of range for a buffer of {rows} rows")]
    RowOutOfRange { row: usize, rows: usize },
    #[error("buffer shape mismatch: {0}")]
    ShapeMismatch(&'static str),
    #[error("entity limit of {} reached", u32::MAX)]
    EntityLimit,
    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),
}
