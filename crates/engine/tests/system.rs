use engine::mock::create_system;
use engine::{BodyType, EngineError, EntityDesc, RawPose, SimBackend, SimConfig, System};

fn gpu(num_envs: usize) -> System {
    create_system(&SimConfig {
        backend: SimBackend::Gpu,
        num_envs,
        ..SimConfig::default()
    })
    .unwrap()
}

#[test]
fn backend_is_fixed_at_construction() {
    let mut system = gpu(2);
    assert_eq!(system.backend(), SimBackend::Gpu);
    assert!(system.as_cpu().is_none());
    assert!(system.as_cpu_mut().is_none());
    assert!(system.as_gpu().is_some());
}

#[test]
fn queries_dispatch_to_backend() {
    let mut system = gpu(1);
    let id = system.add_entity(EntityDesc {
        pose: RawPose::from_p([1.0, 2.0, 3.0]),
        ..EntityDesc::new("scene-0_cube", BodyType::Dynamic)
    })
    .unwrap();
    assert_eq!(system.entity_name(id).unwrap(), "scene-0_cube");
    assert_eq!(system.body_type(id).unwrap(), BodyType::Dynamic);
    assert_eq!(system.initial_pose(id).unwrap().p, [1.0, 2.0, 3.0]);
    assert_eq!(system.collision_shape_count(id).unwrap(), 0);
}

#[test]
fn unknown_entity_is_an_error() {
    let system = gpu(1);
    let missing = engine::EntityId(7);
    assert_eq!(
        system.body_type(missing),
        Err(EngineError::UnknownEntity(missing))
    );
}

#[test]
fn config_from_json() {
    let cfg: SimConfig = serde_json::from_str(
        r#"{ "backend": "gpu", "num_envs": 16, "scene_cfg": { "solver_velocity_iterations": 0 } }"#,
    )
    .unwrap();
    assert_eq!(cfg.backend, SimBackend::Gpu);
    assert_eq!(cfg.scene_cfg.solver_velocity_iterations, 0);
    assert_eq!(cfg.scene_cfg.solver_position_iterations, 15);
    assert!(create_system(&cfg).unwrap().is_gpu_enabled());
}

#[test]
fn invalid_config_is_refused() {
    let cfg = SimConfig {
        num_envs: 0,
        ..SimConfig::default()
    };
    assert!(matches!(create_system(&cfg), Err(EngineError::InvalidConfig(_))));
}
