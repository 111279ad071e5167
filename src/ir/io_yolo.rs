//! YOLO label writer.
//!
//! One text file per image, one row per shape:
//!
//! ```text
//! <class_id> <x_center> <y_center> <width> <height>
//! ```
//!
//! Coordinates are normalized by the image size and printed with six
//! decimals. Rows are joined by `\n` with no trailing newline. The class id
//! is the 0-based position of the label in the category table, and the
//! table itself is written to `data.yaml` once all images are done.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;

use super::categories::CategoryTable;
use super::emit::{check_record, resolve_shapes, Artifact, EmitInput, Emitter};
use super::{AnnotationRecord, BBoxXYXY, Coord, Pixel};
use crate::error::PolyconvError;

/// Extension of YOLO label files.
pub const YOLO_EXTENSION: &str = "txt";

/// Name of the class map written next to the label files.
pub const DATA_YAML: &str = "data.yaml";

/// One normalized label row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YoloRow {
    pub class_id: usize,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl YoloRow {
    /// Normalizes a pixel box against the image size.
    pub fn from_bbox(
        class_id: usize,
        bbox: &BBoxXYXY<Pixel>,
        image_width: f64,
        image_height: f64,
    ) -> Self {
        let (cx, cy, w, h) = bbox.to_cxcywh();
        let center = Coord::<Pixel>::new(cx, cy).to_normalized(image_width, image_height);
        let size = Coord::<Pixel>::new(w, h).to_normalized(image_width, image_height);
        Self {
            class_id,
            cx: center.x,
            cy: center.y,
            w: size.x,
            h: size.y,
        }
    }
}

impl std::fmt::Display for YoloRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, self.cx, self.cy, self.w, self.h
        )
    }
}

/// Emits one YOLO label file per record and a `data.yaml` class map.
///
/// The source LabelMe file is copied next to the labels so the output
/// directory stays editable in the labeling tool.
#[derive(Clone, Copy, Debug, Default)]
pub struct YoloEmitter;

impl Emitter for YoloEmitter {
    fn name(&self) -> &'static str {
        "yolo"
    }

    fn extension(&self) -> &'static str {
        YOLO_EXTENSION
    }

    fn copies_source_annotation(&self) -> bool {
        true
    }

    fn check(&self, source: &Path, record: &AnnotationRecord) -> Result<(), PolyconvError> {
        check_record(source, record)?;
        check_dimensions(source, record)
    }

    fn emit(&self, input: EmitInput<'_>) -> Result<Artifact, PolyconvError> {
        let rows = yolo_rows(&input)?;
        let contents = rows
            .iter()
            .map(|row| row.to_string())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Artifact {
            contents: contents.into_bytes(),
            annotation_count: rows.len(),
            // YOLO rows carry no annotation ids.
            next_annotation_id: input.next_annotation_id,
        })
    }

    fn finish(&self, output_dir: &Path, categories: &CategoryTable) -> Result<(), PolyconvError> {
        write_data_yaml(output_dir, categories)
    }
}

/// Normalized rows for every shape of the record.
///
/// # Errors
/// Fails with [`PolyconvError::InvalidImageDimensions`] if the image has a
/// zero width or height, and with the shape errors of
/// [`resolve_shapes`](super::emit::resolve_shapes).
pub fn yolo_rows(input: &EmitInput<'_>) -> Result<Vec<YoloRow>, PolyconvError> {
    let record = input.record;
    check_dimensions(input.source, record)?;

    let image_width = record.image_width as f64;
    let image_height = record.image_height as f64;

    Ok(resolve_shapes(input)?
        .iter()
        .map(|item| {
            YoloRow::from_bbox(
                item.category_id.class_index(),
                &item.bbox,
                image_width,
                image_height,
            )
        })
        .collect())
}

fn check_dimensions(source: &Path, record: &AnnotationRecord) -> Result<(), PolyconvError> {
    if record.image_width == 0 || record.image_height == 0 {
        return Err(PolyconvError::InvalidImageDimensions {
            path: source.to_path_buf(),
            width: record.image_width,
            height: record.image_height,
        });
    }
    Ok(())
}

#[derive(Serialize)]
struct DataYaml<'a> {
    nc: usize,
    names: BTreeMap<usize, &'a str>,
}

/// Renders the class map as YAML.
pub fn data_yaml_string(categories: &CategoryTable) -> Result<String, serde_yaml::Error> {
    let data = DataYaml {
        nc: categories.len(),
        names: categories
            .iter()
            .map(|(id, name)| (id.class_index(), name))
            .collect(),
    };
    serde_yaml::to_string(&data)
}

fn write_data_yaml(output_dir: &Path, categories: &CategoryTable) -> Result<(), PolyconvError> {
    let path = output_dir.join(DATA_YAML);
    let yaml = data_yaml_string(categories).map_err(|source| PolyconvError::DataYamlWrite {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, &yaml).map_err(|source| PolyconvError::OutputWrite { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{AnnotationId, AnnotationRecord, CategoryOrder, ImageId, Shape};

    fn emit_text(record: &AnnotationRecord, categories: &CategoryTable) -> String {
        let artifact = YoloEmitter
            .emit(EmitInput {
                source: Path::new("augmented/a.json"),
                record,
                image_id: ImageId(1),
                categories,
                next_annotation_id: AnnotationId(4),
            })
            .expect("emit failed");
        assert_eq!(artifact.next_annotation_id, AnnotationId(4));
        String::from_utf8(artifact.contents).expect("utf-8")
    }

    #[test]
    fn test_square_polygon_row() {
        let record = AnnotationRecord::new("a.jpg", 200, 100).with_shape(Shape::new(
            "cat",
            [(10.0, 20.0), (50.0, 20.0), (50.0, 80.0), (10.0, 80.0)],
        ));
        let categories = CategoryTable::from_labels(["cat"], CategoryOrder::FirstSeen);

        assert_eq!(
            emit_text(&record, &categories),
            "0 0.150000 0.500000 0.200000 0.600000"
        );
    }

    #[test]
    fn test_rows_joined_without_trailing_newline() {
        let record = AnnotationRecord::new("a.jpg", 100, 100)
            .with_shape(Shape::new("dog", [(0.0, 0.0), (50.0, 50.0)]))
            .with_shape(Shape::new("cat", [(50.0, 50.0), (100.0, 100.0)]));
        let categories = CategoryTable::from_labels(["cat", "dog"], CategoryOrder::FirstSeen);

        assert_eq!(
            emit_text(&record, &categories),
            "1 0.250000 0.250000 0.500000 0.500000\n0 0.750000 0.750000 0.500000 0.500000"
        );
    }

    #[test]
    fn test_no_shapes_gives_empty_file() {
        let record = AnnotationRecord::new("a.jpg", 100, 100);
        let categories = CategoryTable::new();
        assert_eq!(emit_text(&record, &categories), "");
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let record =
            AnnotationRecord::new("a.jpg", 0, 100).with_shape(Shape::new("cat", [(0.0, 0.0)]));
        let categories = CategoryTable::from_labels(["cat"], CategoryOrder::FirstSeen);

        let err = YoloEmitter
            .emit(EmitInput {
                source: Path::new("augmented/a.json"),
                record: &record,
                image_id: ImageId(1),
                categories: &categories,
                next_annotation_id: AnnotationId::FIRST,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            PolyconvError::InvalidImageDimensions { width: 0, height: 100, .. }
        ));
    }

    #[test]
    fn test_check_rejects_zero_dimensions_before_emit() {
        let record =
            AnnotationRecord::new("a.jpg", 64, 0).with_shape(Shape::new("cat", [(0.0, 0.0)]));
        let err = YoloEmitter
            .check(Path::new("augmented/a.json"), &record)
            .unwrap_err();
        assert!(matches!(
            err,
            PolyconvError::InvalidImageDimensions { width: 64, height: 0, .. }
        ));
        assert!(crate::ir::io_coco_json::CocoEmitter
            .check(Path::new("augmented/a.json"), &record)
            .is_ok());
    }

    #[test]
    fn test_row_reconstructs_box_edges() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(13.0, 7.0, 91.0, 55.0);
        let row = YoloRow::from_bbox(0, &bbox, 128.0, 64.0);
        assert!(((row.cx - row.w / 2.0) * 128.0 - 13.0).abs() < 1e-9);
        assert!(((row.cx + row.w / 2.0) * 128.0 - 91.0).abs() < 1e-9);
        assert!(((row.cy - row.h / 2.0) * 64.0 - 7.0).abs() < 1e-9);
        assert!(((row.cy + row.h / 2.0) * 64.0 - 55.0).abs() < 1e-9);
    }

    #[test]
    fn test_data_yaml_lists_classes_in_index_order() {
        let categories = CategoryTable::from_labels(["person", "bicycle"], CategoryOrder::FirstSeen);
        let yaml = data_yaml_string(&categories).unwrap();
        assert!(yaml.contains("nc: 2"));
        assert!(yaml.contains("0: person"));
        assert!(yaml.contains("1: bicycle"));
        assert!(yaml.find("0: person").unwrap() < yaml.find("1: bicycle").unwrap());
    }

    #[test]
    fn test_finish_writes_data_yaml() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let categories = CategoryTable::from_labels(["cat"], CategoryOrder::FirstSeen);

        YoloEmitter.finish(temp.path(), &categories).expect("finish");
        let yaml = fs::read_to_string(temp.path().join(DATA_YAML)).expect("read data.yaml");
        assert!(yaml.contains("0: cat"));
    }
}
