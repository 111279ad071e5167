#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// A LabelMe document as the labeling tool writes it, including the fields
/// the converter ignores.
pub fn labelme_json(
    image_path: &str,
    width: u32,
    height: u32,
    shapes: &[(&str, &[(f64, f64)])],
) -> String {
    let shapes: Vec<_> = shapes
        .iter()
        .map(|(label, points)| {
            let points: Vec<[f64; 2]> = points.iter().map(|&(x, y)| [x, y]).collect();
            json!({
                "label": label,
                "points": points,
                "group_id": null,
                "description": "",
                "shape_type": "polygon",
                "flags": {}
            })
        })
        .collect();

    let doc = json!({
        "version": "5.4.1",
        "flags": {},
        "shapes": shapes,
        "imagePath": image_path,
        "imageData": null,
        "imageHeight": height,
        "imageWidth": width
    });
    serde_json::to_string_pretty(&doc).expect("serialize labelme fixture")
}

pub fn write_labelme(
    dir: &Path,
    name: &str,
    image_path: &str,
    width: u32,
    height: u32,
    shapes: &[(&str, &[(f64, f64)])],
) -> PathBuf {
    fs::create_dir_all(dir).expect("create annotation dir");
    let path = dir.join(name);
    fs::write(&path, labelme_json(image_path, width, height, shapes))
        .expect("write labelme file");
    path
}

pub const CAT_SQUARE: &[(f64, f64)] = &[(10.0, 20.0), (50.0, 20.0), (50.0, 80.0), (10.0, 80.0)];

/// The single-cat example: a 200x100 image with one square polygon.
pub fn write_cat_example(input: &Path) -> PathBuf {
    write_labelme(input, "a.json", "a.jpg", 200, 100, &[("cat", CAT_SQUARE)])
}

/// Every file directly in `dir`, by name, with its bytes.
pub fn snapshot_dir(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .expect("read output dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| path.is_file())
        .map(|path| {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            let bytes = fs::read(&path).expect("read output file");
            (name, bytes)
        })
        .collect();
    entries.sort();
    entries
}
