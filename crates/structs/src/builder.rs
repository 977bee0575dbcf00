//! # Actor Builder
//!
//! Creates one engine entity per selected sub-scene and wraps them in an
//! [`Actor`]. Entity names carry a `scene-{i}_` prefix so every sub-scene's
//! copy can be told apart in the engine.

use engine::{BodyType, EntityDesc, RawPose, Shape};

use crate::{Actor, ActorError, ManagedScene, Pose};

#[derive(Clone, Debug)]
pub struct ActorBuilder {
    name: String,
    body_type: BodyType,
    initial_pose: RawPose,
    visual: Option<Shape>,
    collision: Vec<Shape>,
    color: [f32; 4],
    scene_idxs: Option<Vec<usize>>,
}

impl ActorBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body_type: BodyType::Dynamic,
            initial_pose: RawPose::IDENTITY,
            visual: None,
            collision: Vec::new(),
            color: [1.0, 1.0, 1.0, 1.0],
            scene_idxs: None,
        }
    }

    #[must_use]
    pub fn body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = body_type;
        self
    }

    #[must_use]
    pub fn initial_pose(mut self, pose: RawPose) -> Self {
        self.initial_pose = pose;
        self
    }

    #[must_use]
    pub fn visual(mut self, shape: Shape, color: [f32; 4]) -> Self {
        self.visual = Some(shape);
        self.color = color;
        self
    }

    #[must_use]
    pub fn collision(mut self, shape: Shape) -> Self {
        self.collision.push(shape);
        self
    }

    /// Only build in these sub-scenes. Defaults to all of them.
    #[must_use]
    pub fn scene_idxs(mut self, scene_idxs: Vec<usize>) -> Self {
        self.scene_idxs = Some(scene_idxs);
        self
    }

    pub fn build(self, scene: &mut ManagedScene) -> Result<Actor, ActorError> {
        let scene_idxs = self
            .scene_idxs
            .unwrap_or_else(|| (0..scene.num_envs()).collect());
        if let Some(&index) = scene_idxs.iter().find(|&&i| i >= scene.num_envs()) {
            return Err(ActorError::SceneIndexOutOfRange {
                index,
                num_envs: scene.num_envs(),
            });
        }
        if scene_idxs.is_empty() {
            return Err(ActorError::Empty);
        }
        if scene.actor_view(&self.name).is_some() {
            return Err(ActorError::DuplicateName(self.name));
        }

        let entities: Vec<_> = scene_idxs
            .iter()
            .map(|i| {
                scene.system_mut().add_entity(EntityDesc {
                    name: format!("scene-{i}_{}", self.name),
                    body_type: self.body_type,
                    pose: self.initial_pose,
                    visual: self.visual.clone(),
                    collision: self.collision.clone(),
                    color: self.color,
                })
            })
            .collect::<Result<_, _>>()?;

        let mut actor = Actor::create_from_entities(scene, entities, scene_idxs)?;
        scene.register_actor_view(&self.name, actor.entities())?;
        actor.name = self.name;
        actor.initial_pose = Pose::from(self.initial_pose).broadcast(actor.len());
        tracing::debug!("built {actor}");
        Ok(actor)
    }
}

/// A sphere in every sub-scene.
pub fn build_sphere(
    scene: &mut ManagedScene,
    radius: f32,
    color: [f32; 4],
    name: &str,
    add_collision: bool,
    body_type: BodyType,
) -> Result<Actor, ActorError> {
    let shape = Shape::Sphere { radius };
    let mut builder = ActorBuilder::new(name)
        .body_type(body_type)
        .visual(shape.clone(), color);
    if add_collision {
        builder = builder.collision(shape);
    }
    builder.build(scene)
}

/// A box in every sub-scene.
pub fn build_box(
    scene: &mut ManagedScene,
    half_extents: [f32; 3],
    color: [f32; 4],
    name: &str,
    add_collision: bool,
    body_type: BodyType,
) -> Result<Actor, ActorError> {
    let shape = Shape::Box { half_extents };
    let mut builder = ActorBuilder::new(name)
        .body_type(body_type)
        .visual(shape.clone(), color);
    if add_collision {
        builder = builder.collision(shape);
    }
    builder.build(scene)
}

/// A static ground plane at `altitude` in every sub-scene.
pub fn build_ground(scene: &mut ManagedScene, altitude: f32) -> Result<Actor, ActorError> {
    ActorBuilder::new("ground")
        .body_type(BodyType::Static)
        .initial_pose(RawPose::from_p([0.0, 0.0, altitude]))
        .visual(Shape::Plane, [0.5, 0.5, 0.5, 1.0])
        .collision(Shape::Plane)
        .build(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{SimBackend, SimConfig};

    fn scene(backend: SimBackend, num_envs: usize) -> ManagedScene {
        ManagedScene::new(&SimConfig {
            backend,
            num_envs,
            ..SimConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn entity_names_carry_scene_prefix() {
        let mut scene = scene(SimBackend::Gpu, 3);
        let actor = build_sphere(&mut scene, 0.1, [1.0; 4], "goal", false, BodyType::Kinematic).unwrap();
        assert_eq!(actor.name, "goal");
        assert_eq!(actor.len(), 3);
        let names: Vec<_> = actor
            .entities()
            .iter()
            .map(|&id| scene.system().entity_name(id).unwrap().to_owned())
            .collect();
        assert_eq!(names, ["scene-0_goal", "scene-1_goal", "scene-2_goal"]);
        assert_eq!(scene.actor_view("goal"), Some(actor.entities()));
    }

    #[test]
    fn subset_of_sub_scenes() {
        let mut scene = scene(SimBackend::Gpu, 4);
        let actor = ActorBuilder::new("cube")
            .collision(Shape::Box { half_extents: [0.1; 3] })
            .scene_idxs(vec![1, 3])
            .build(&mut scene)
            .unwrap();
        assert_eq!(actor.scene_idxs(), &[1, 3]);
        assert_eq!(actor.row_indices(), &[0, 1]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut scene = scene(SimBackend::Cpu, 1);
        build_ground(&mut scene, 0.0).unwrap();
        assert_eq!(
            build_ground(&mut scene, 1.0).unwrap_err(),
            ActorError::DuplicateName("ground".into())
        );
    }

    #[test]
    fn out_of_range_sub_scene_is_rejected() {
        let mut scene = scene(SimBackend::Gpu, 2);
        let err = ActorBuilder::new("cube").scene_idxs(vec![2]).build(&mut scene);
        assert!(matches!(err, Err(ActorError::SceneIndexOutOfRange { index: 2, .. })));
        // a failed build leaves the name free
        assert_eq!(scene.actor_view("cube"), None);
        let cube = ActorBuilder::new("cube").scene_idxs(vec![1]).build(&mut scene).unwrap();
        assert_eq!(scene.actor_view("cube"), Some(cube.entities()));
    }

    #[test]
    fn static_ground_keeps_initial_pose_on_gpu() {
        let mut scene = scene(SimBackend::Gpu, 2);
        let ground = build_ground(&mut scene, -0.5).unwrap();
        assert!(ground.row_indices().is_empty());
        let pose = ground.pose(&scene).unwrap();
        assert_eq!(pose.p(), vec![[0.0, 0.0, -0.5]; 2]);
    }
}
