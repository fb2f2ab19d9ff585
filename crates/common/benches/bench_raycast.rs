use std::hint::black_box;
use std::time::Instant;

use glam::Vec3;
use range_common::raycast;
use range_common::{Aabb, Ray};

fn make_boxes(count: usize, spacing: f32) -> Vec<Aabb> {
    let side = (count as f32).sqrt().ceil() as usize;
    (0..count)
        .map(|i| {
            let x = (i % side) as f32 * spacing;
            let z = (i / side) as f32 * spacing;
            Aabb::from_center_half_extents(Vec3::new(x, 0.0, -z), Vec3::splat(0.5))
        })
        .collect()
}

fn bench_intersects(count: usize, iterations: usize) {
    let boxes = make_boxes(count, 2.0);
    let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.1, 0.0, -1.0).normalize());

    let start = Instant::now();
    let mut hits = 0usize;
    for _ in 0..iterations {
        for b in &boxes {
            if raycast::intersects(black_box(&ray), black_box(b)) {
                hits += 1;
            }
        }
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  intersects ({count} boxes, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}, hits {hits}"
    );
}

fn bench_transformed(count: usize, iterations: usize) {
    let boxes = make_boxes(count, 2.0);
    let m = glam::Mat4::from_translation(Vec3::new(1.0, -0.5, 2.0)) * glam::Mat4::from_scale(Vec3::splat(0.5));

    let start = Instant::now();
    for _ in 0..iterations {
        for b in &boxes {
            let _ = black_box(b.transformed(black_box(&m)));
        }
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  transformed ({count} boxes, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn main() {
    println!("=== Raycast Benchmarks ===\n");

    println!("Ray / box intersection:");
    bench_intersects(5, 100_000);
    bench_intersects(100, 10_000);
    bench_intersects(10_000, 100);

    println!("\nBounding box refit:");
    bench_transformed(5, 100_000);
    bench_transformed(10_000, 100);

    println!("\n=== Done ===");
}
