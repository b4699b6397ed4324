use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::Vec3;
use skylight_math::*;

fn bench_ray_sphere_hit(c: &mut Criterion) {
    let origin = black_box(Vec3::new(0.0, 6371.2, 0.0));
    let dir = black_box(Vec3::new(0.3, 0.2, 0.93).normalize());
    c.bench_function("ray_sphere_hit", |bencher| {
        bencher.iter(|| black_box(ray_sphere_intersect(origin, dir, 6471.0)))
    });
}

fn bench_ray_sphere_miss(c: &mut Criterion) {
    let origin = black_box(Vec3::new(0.0, 7000.0, 0.0));
    let dir = black_box(Vec3::X);
    c.bench_function("ray_sphere_miss", |bencher| {
        bencher.iter(|| black_box(ray_sphere_intersect(origin, dir, 6371.0)))
    });
}

fn bench_hash2(c: &mut Criterion) {
    c.bench_function("hash2", |bencher| {
        bencher.iter(|| black_box(hash2(black_box(123), black_box(-456))))
    });
}

criterion_group!(
    benches,
    bench_ray_sphere_hit,
    bench_ray_sphere_miss,
    bench_hash2
);
criterion_main!(benches);
