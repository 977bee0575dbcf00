use criterion::{black_box, criterion_group, criterion_main, Criterion};
use engine::{BodyType, SimBackend, SimConfig};
use structs::{builder, ManagedScene, Pose};

fn bench_batched_pose(c: &mut Criterion) {
    let mut scene = ManagedScene::new(&SimConfig {
        backend: SimBackend::Gpu,
        num_envs: 1024,
        ..SimConfig::default()
    })
    .unwrap();
    let mut cube =
        builder::build_box(&mut scene, [0.1; 3], [1.0; 4], "cube", true, BodyType::Dynamic).unwrap();
    let target = Pose::create_from_p(&[[0.0, 0.0, 1.0]]);

    c.bench_function("pose_1024", |b| b.iter(|| black_box(cube.pose(&scene).unwrap())));
    c.bench_function("set_pose_1024", |b| {
        b.iter(|| cube.set_pose(&mut scene, black_box(&target)).unwrap())
    });
    c.bench_function("get_state_1024", |b| {
        b.iter(|| black_box(cube.get_state(&scene).unwrap()))
    });
}

criterion_group!(benches, bench_batched_pose);
criterion_main!(benches);
