//! # Arena
//!
//! Runs the environments from the [`tasks`] crate from the command line.
//!
//! ## Crates
//!
//! -   **[`engine`]:** the physics engine boundary. [`engine::SimConfig`]
//!     selects the backend (`cpu` for one sub-scene through per-entity
//!     handles, `gpu` for many sub-scenes sharing one body buffer) and ships
//!     an in-process reference engine.
//! -   **`structs`:** batched actors, poses and the managed scene that tasks
//!     are written against.
//! -   **[`tasks`]:** environments, registered by id.
//!
//! ## Running
//!
//! ```text
//! arena --env-id QuadrupedReach-v1 --backend gpu --num-envs 64 --steps 400
//! arena --config run.json --seed 3
//! ```
//!
//! A config file is a JSON document with any of the fields of
//! [`app::RunFile`]; command line flags win over it.

pub mod app;
