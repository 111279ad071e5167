#![allow(dead_code)]

use polyconv::ir::{AnnotationRecord, Shape};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const LABELS: &[&str] = &["person", "car", "dog", "traffic light", "cat"];

pub fn eps_yolo(image_w: u32, image_h: u32) -> f64 {
    image_w.max(image_h) as f64 * 1e-6
}

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Pixel values on a quarter-pixel grid, as labeling tools commonly emit.
pub fn arb_pixel(limit: u32) -> impl Strategy<Value = f64> {
    (0..=limit * 4).prop_map(|v| v as f64 / 4.0)
}

pub fn arb_polygon(width: u32, height: u32, max_points: usize) -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((arb_pixel(width), arb_pixel(height)), 1..=max_points)
}

pub fn arb_shape(width: u32, height: u32) -> impl Strategy<Value = Shape> {
    (prop::sample::select(LABELS), arb_polygon(width, height, 8))
        .prop_map(|(label, points)| Shape::new(label, points))
}

/// A record whose polygons all lie inside the image.
pub fn arb_record(max_shapes: usize) -> impl Strategy<Value = AnnotationRecord> {
    (1u32..=2048, 1u32..=2048).prop_flat_map(move |(width, height)| {
        prop::collection::vec(arb_shape(width, height), 0..=max_shapes).prop_map(move |shapes| {
            let mut record = AnnotationRecord::new("image.jpg", width, height);
            record.shapes = shapes;
            record
        })
    })
}
