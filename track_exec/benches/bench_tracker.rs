//! # Tracker Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Vector3;

use track_lib::{
    path::{Path, Waypoint},
    track::{closest_index, lane_direction, update_current_index, TrackParams},
};
use util::geom::Pose;

fn tracker_benchmark(c: &mut Criterion) {
    // ---- Build a long gently curving path ----

    let params = TrackParams::default();
    let path = Path::new(
        (0..2000)
            .map(|i| {
                let s = i as f64 * 0.05;
                let yaw = 0.01 * s;
                Waypoint::from_xy_yaw(s * yaw.cos(), s * yaw.sin(), yaw, 1.5)
            })
            .collect(),
    );

    // Pose part way along the path, slightly off to one side
    let target = path.waypoint_pose(1200).unwrap();
    let offset = target.attitude_q * Vector3::y() * 0.1;
    let pose = Pose::new(target.position_m + offset, target.yaw());

    c.bench_function("lane_direction", |b| {
        b.iter(|| lane_direction(black_box(&path), &params))
    });

    c.bench_function("closest_index", |b| {
        b.iter(|| closest_index(black_box(&path), black_box(&pose), &params).unwrap())
    });

    // Warm update where the previous index is a few waypoints behind
    c.bench_function("update_current_index::warm", |b| {
        b.iter(|| {
            update_current_index(black_box(&path), black_box(&pose), Some(1195), &params).unwrap()
        })
    });
}

criterion_group!(benches, tracker_benchmark);
criterion_main!(benches);
