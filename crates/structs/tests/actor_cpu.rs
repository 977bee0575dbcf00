use anyhow::{Context, Result};
use engine::{BodyType, EngineError, SimConfig};
use structs::{builder, ActorError, ManagedScene, Pose};

const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

fn cpu_scene() -> Result<ManagedScene> {
    Ok(ManagedScene::new(&SimConfig::default())?)
}

#[test]
fn single_pose_is_broadcast() -> Result<()> {
    let mut scene = cpu_scene()?;
    let mut cube = builder::build_box(&mut scene, [0.1; 3], RED, "cube", true, BodyType::Dynamic)?;
    cube.set_pose(&mut scene, &Pose::create_from_p(&[[0.0, 0.0, 2.0]]))?;
    assert_eq!(cube.pose(&scene)?.p(), vec![[0.0, 0.0, 2.0]]);
    assert!(matches!(
        cube.set_pose(&mut scene, &Pose::identity(2)),
        Err(ActorError::CountMismatch { got: 2, .. })
    ));
    Ok(())
}

#[test]
fn dynamic_state_round_trips() -> Result<()> {
    let mut scene = cpu_scene()?;
    let mut cube = builder::build_box(&mut scene, [0.1; 3], RED, "cube", true, BodyType::Dynamic)?;
    let state = [0.1, 0.2, 0.3, 0.0, 1.0, 0.0, 0.0, 0.5, 0.0, -0.5, 0.0, 1.5, 0.0];
    cube.set_state(&mut scene, &[state])?;
    assert_eq!(cube.get_state(&scene)?, vec![state]);
    Ok(())
}

#[test]
fn static_velocities_are_zero() -> Result<()> {
    let mut scene = cpu_scene()?;
    let ground = builder::build_ground(&mut scene, 0.0)?;
    let state = ground.get_state(&scene)?;
    assert_eq!(&state[0][7..], &[0.0; 6]);
    assert_eq!(
        ground.set_angular_velocity(&mut scene, &[[0.0, 0.0, 1.0]]),
        Err(ActorError::NotDynamic("ground".into()))
    );
    Ok(())
}

#[test]
fn hide_and_show_toggle_visibility() -> Result<()> {
    let mut scene = cpu_scene()?;
    let mut goal = builder::build_sphere(&mut scene, 0.2, RED, "goal", false, BodyType::Kinematic)?;
    goal.set_pose(&mut scene, &Pose::create_from_p(&[[1.0, 1.0, 1.0]]))?;
    let id = goal.entities()[0];
    let visibility = |scene: &ManagedScene| -> Result<f32> {
        let cpu = scene.system().as_cpu().context("cpu backend")?;
        Ok(cpu.visibility(id)?)
    };

    goal.hide_visual(&mut scene)?;
    assert!(goal.is_hidden());
    assert_eq!(visibility(&scene)?, 0.0);
    // the body is not moved on this path
    assert_eq!(goal.pose(&scene)?.p(), vec![[1.0, 1.0, 1.0]]);
    goal.show_visual(&mut scene)?;
    assert!(!goal.is_hidden());
    assert_eq!(visibility(&scene)?, 1.0);
    assert_eq!(goal.pose(&scene)?.p(), vec![[1.0, 1.0, 1.0]]);
    Ok(())
}

#[test]
fn removed_actor_is_gone_from_engine() -> Result<()> {
    let mut scene = cpu_scene()?;
    let ball = builder::build_sphere(&mut scene, 0.2, RED, "ball", true, BodyType::Dynamic)?;
    ball.remove_from_scene(&mut scene)?;
    let id = ball.entities()[0];
    assert_eq!(
        ball.pose(&scene),
        Err(ActorError::Engine(EngineError::EntityRemoved(id)))
    );
    Ok(())
}

#[test]
fn collision_shape_query_is_cached() -> Result<()> {
    let mut scene = cpu_scene()?;
    let ball = builder::build_sphere(&mut scene, 0.2, RED, "ball", true, BodyType::Dynamic)?;
    assert!(ball.has_collision_shapes(&scene)?);
    ball.remove_from_scene(&mut scene)?;
    // answered from the cache, the engine would now refuse
    assert!(ball.has_collision_shapes(&scene)?);
    Ok(())
}

#[test]
fn display_names_the_group() -> Result<()> {
    let mut scene = cpu_scene()?;
    let ball = builder::build_sphere(&mut scene, 0.2, RED, "ball", true, BodyType::Dynamic)?;
    assert_eq!(
        ball.to_string(),
        "<ball: struct of type Actor; managing 1 dynamic entities>"
    );
    Ok(())
}
