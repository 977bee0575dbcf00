//! # Managed Scene
//!
//! Owns the engine system for a batch of parallel sub-scenes. Actors borrow it
//! for every read and write, so the backend an actor talks to is always the
//! one the scene was configured with.

use std::collections::BTreeMap;

use engine::{EntityId, SimConfig, System};

use crate::ActorError;

pub struct ManagedScene {
    system: System,
    sim_config: SimConfig,
    num_envs: usize,
    reset_mask: Vec<bool>,
    actor_views: BTreeMap<String, Vec<EntityId>>,
}

impl ManagedScene {
    /// Creates a scene on the reference engine selected by `cfg.backend`.
    pub fn new(cfg: &SimConfig) -> Result<Self, ActorError> {
        let system = engine::mock::create_system(cfg)?;
        Ok(Self::with_system(system, cfg.clone()))
    }

    /// Wraps an already constructed engine system.
    #[must_use]
    pub fn with_system(system: System, sim_config: SimConfig) -> Self {
        let num_envs = sim_config.num_envs.max(1);
        Self {
            system,
            sim_config,
            num_envs,
            reset_mask: vec![true; num_envs],
            actor_views: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn system(&self) -> &System {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut System {
        &mut self.system
    }

    #[must_use]
    pub fn sim_config(&self) -> &SimConfig {
        &self.sim_config
    }

    #[must_use]
    pub fn num_envs(&self) -> usize {
        self.num_envs
    }

    #[must_use]
    pub fn reset_mask(&self) -> &[bool] {
        &self.reset_mask
    }

    /// Restricts batched writes to the sub-scenes in `env_idx`.
    pub fn set_reset_mask(&mut self, env_idx: &[usize]) -> Result<(), ActorError> {
        let mut mask = vec![false; self.num_envs];
        for &index in env_idx {
            let slot = mask.get_mut(index).ok_or(ActorError::SceneIndexOutOfRange {
                index,
                num_envs: self.num_envs,
            })?;
            *slot = true;
        }
        self.reset_mask = mask;
        Ok(())
    }

    /// Lets batched writes reach every sub-scene again.
    pub fn reset_mask_all(&mut self) {
        self.reset_mask.fill(true);
    }

    /// Reset mask entry for each body, given the sub-scene each body lives in.
    #[must_use]
    pub fn body_mask(&self, scene_idxs: &[usize]) -> Vec<bool> {
        scene_idxs
            .iter()
            .map(|&i| self.reset_mask.get(i).copied().unwrap_or(false))
            .collect()
    }

    pub fn gpu_apply_all(&mut self) -> Result<(), ActorError> {
        if let Some(gpu) = self.system.as_gpu_mut() {
            gpu.gpu_apply_rigid_dynamic_data()?;
        }
        Ok(())
    }

    pub fn gpu_fetch_all(&mut self) -> Result<(), ActorError> {
        if let Some(gpu) = self.system.as_gpu_mut() {
            gpu.gpu_fetch_rigid_dynamic_data()?;
        }
        Ok(())
    }

    /// Advances one control step worth of simulation steps.
    pub fn step(&mut self) -> Result<(), ActorError> {
        let dt = self.sim_config.sim_timestep();
        self.gpu_apply_all()?;
        for _ in 0..self.sim_config.sim_steps_per_control() {
            self.system.step(dt)?;
        }
        self.gpu_fetch_all()
    }

    pub(crate) fn register_actor_view(
        &mut self,
        name: &str,
        entities: &[EntityId],
    ) -> Result<(), ActorError> {
        if self.actor_views.contains_key(name) {
            return Err(ActorError::DuplicateName(name.to_owned()));
        }
        self.actor_views.insert(name.to_owned(), entities.to_vec());
        Ok(())
    }

    /// Entities registered under `name`, if any.
    #[must_use]
    pub fn actor_view(&self, name: &str) -> Option<&[EntityId]> {
        self.actor_views.get(name).map(Vec::as_slice)
    }
}
