//! LabelMe annotation records.
//!
//! One record per input file: the image it describes and the labeled
//! polygons drawn on it. Fields the converter has no use for (`version`,
//! `flags`, `imageData`, `shape_type`, `group_id`, ...) are ignored when
//! parsing.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::bbox::BBoxXYXY;
use super::coord::Coord;
use super::space::Pixel;

/// The parsed contents of one LabelMe JSON file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    /// Image path as written by the labeling tool, relative to the
    /// annotation file's directory.
    pub image_path: String,

    pub image_height: u32,

    pub image_width: u32,

    /// Labeled polygons, in drawing order.
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl AnnotationRecord {
    pub fn new(image_path: impl Into<String>, image_width: u32, image_height: u32) -> Self {
        Self {
            image_path: image_path.into(),
            image_height,
            image_width,
            shapes: Vec::new(),
        }
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shapes.push(shape);
        self
    }

    /// The image's file name with any directory components removed.
    pub fn image_file_name(&self) -> Option<&str> {
        Path::new(&self.image_path)
            .file_name()
            .and_then(|name| name.to_str())
    }

    /// The image's file name without its extension; output artifacts are
    /// named after it.
    pub fn output_stem(&self) -> Option<&str> {
        Path::new(&self.image_path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
    }

    /// Labels of all shapes, in drawing order, duplicates included.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.shapes.iter().map(|shape| shape.label.as_str())
    }
}

/// A labeled polygon.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Shape {
    pub label: String,
    pub points: Vec<Coord<Pixel>>,
}

impl Shape {
    pub fn new(label: impl Into<String>, points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            label: label.into(),
            points: points.into_iter().map(Coord::from).collect(),
        }
    }

    /// Tightest axis-aligned box around the polygon; `None` if it has no
    /// points.
    pub fn bbox(&self) -> Option<BBoxXYXY<Pixel>> {
        BBoxXYXY::enclosing(&self.points)
    }
}
