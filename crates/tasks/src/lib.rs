#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! # Tasks
//!
//! Batched robot learning environments built on [`structs`].
//!
//! A task only describes its scene, how an episode starts, and how it is
//! scored (see [`Task`]). [`TaskEnv`] turns it into an [`Env`]: it steps the
//! scene, resets finished sub-scenes through the reset mask, and shapes the
//! reward according to a [`RewardMode`].
//!
//! Environments are created by id through [`registry::make`].

pub mod agent;
pub mod env;
pub mod error;
pub mod quadruped_reach;
pub mod registry;

pub use agent::Quadruped;
pub use env::{Env, Evaluation, RewardMode, StepOutput, Task, TaskEnv};
pub use error::TaskError;
pub use quadruped_reach::QuadrupedReach;
