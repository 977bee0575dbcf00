#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! # Scene Structs
//!
//! Task code never touches engine handles directly. It works through the
//! types in this crate:
//!
//! -   [`Actor`]: a named group of engine bodies, one per parallel sub-scene,
//!     read and written as a batch. Whether the group goes through per-entity
//!     handles or the shared GPU buffer is decided once, when the actor is
//!     created.
//! -   [`Pose`]: a batch of positions and `wxyz` quaternions.
//! -   [`ManagedScene`]: owns the engine [`engine::System`], the reset mask
//!     and the actor name registry.
//! -   [`ActorBuilder`] and the helpers in [`builder`] create actors.
//!
//! ```rust,ignore
//! use engine::BodyType;
//! use structs::{builder, ManagedScene, Pose};
//!
//! let mut scene = ManagedScene::new(&engine::SimConfig::default())?;
//! let mut ball = builder::build_sphere(&mut scene, 0.2, [0.0, 1.0, 0.0, 1.0], "ball", true, BodyType::Dynamic)?;
//! ball.set_pose(&mut scene, &Pose::create_from_p(&[[0.0, 0.0, 1.0]]))?;
//! ```

pub mod actor;
pub mod builder;
pub mod error;
pub mod pose;
pub mod scene;

pub use actor::{Actor, ActorState, DEFAULT_ANG_THRESH, DEFAULT_LIN_THRESH, STATE_WIDTH};
pub use builder::ActorBuilder;
pub use error::ActorError;
pub use pose::Pose;
pub use scene::ManagedScene;
