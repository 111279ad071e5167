//! Per-image COCO JSON writer.
//!
//! Each LabelMe record becomes a standalone COCO document holding exactly
//! one image, one annotation per shape, and the full category table:
//!
//! ```json
//! {
//!     "images": [{"id": 1, "file_name": "a.jpg", "height": 100, "width": 200}],
//!     "annotations": [{
//!         "id": 1, "image_id": 1, "category_id": 1,
//!         "bbox": [10, 20, 40, 60], "area": 2400,
//!         "segmentation": [[[10, 20], [50, 20], [50, 80], [10, 80]]],
//!         "iscrowd": 0
//!     }],
//!     "categories": [{"id": 1, "name": "cat"}]
//! }
//! ```
//!
//! `bbox` is `[x, y, width, height]` with `(x, y)` the top-left corner in
//! absolute pixels. `segmentation` holds the polygon's points as `[x, y]`
//! pairs wrapped in one outer list. Integral values are written as JSON
//! integers so integer-labelled inputs produce integer outputs.
//!
//! Annotation ids continue from the [`EmitInput::next_annotation_id`] they
//! are handed, so ids stay unique across all documents of a run.

use serde::{Serialize, Serializer};

use super::categories::CategoryTable;
use super::emit::{resolve_shapes, Artifact, EmitInput, Emitter};
use super::AnnotationId;
use crate::error::PolyconvError;

/// Extension of COCO output files.
pub const COCO_EXTENSION: &str = "json";

const INDENT: &[u8] = b"    ";

// Largest magnitude below which every integer is exactly representable.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

// ============================================================================
// COCO Schema Types
// ============================================================================

/// One per-image COCO document.
#[derive(Debug, Serialize)]
pub struct CocoDocument {
    pub images: Vec<CocoImage>,
    pub annotations: Vec<CocoAnnotation>,
    pub categories: Vec<CocoCategory>,
}

#[derive(Debug, Serialize)]
pub struct CocoImage {
    pub id: u64,
    pub file_name: String,
    pub height: u32,
    pub width: u32,
}

#[derive(Debug, Serialize)]
pub struct CocoAnnotation {
    pub id: u64,
    pub image_id: u64,
    pub category_id: u64,
    pub bbox: [CocoNumber; 4],
    pub area: CocoNumber,
    pub segmentation: Vec<Vec<[CocoNumber; 2]>>,
    pub iscrowd: u8,
}

#[derive(Debug, Serialize)]
pub struct CocoCategory {
    pub id: u64,
    pub name: String,
}

/// A coordinate or measure that serializes integral values as integers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CocoNumber(pub f64);

impl Serialize for CocoNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
            serializer.serialize_i64(value as i64)
        } else {
            serializer.serialize_f64(value)
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Emits one COCO document per record.
#[derive(Clone, Copy, Debug, Default)]
pub struct CocoEmitter;

impl Emitter for CocoEmitter {
    fn name(&self) -> &'static str {
        "coco"
    }

    fn extension(&self) -> &'static str {
        COCO_EXTENSION
    }

    fn emit(&self, input: EmitInput<'_>) -> Result<Artifact, PolyconvError> {
        let (document, next_annotation_id) = build_coco_document(&input)?;
        let contents =
            to_coco_vec(&document).map_err(|source| PolyconvError::CocoJsonWrite {
                path: input.source.to_path_buf(),
                source,
            })?;

        Ok(Artifact {
            contents,
            annotation_count: document.annotations.len(),
            next_annotation_id,
        })
    }
}

/// Builds the COCO document for one record.
///
/// Returns the document and the next unused annotation id.
pub fn build_coco_document(
    input: &EmitInput<'_>,
) -> Result<(CocoDocument, AnnotationId), PolyconvError> {
    let record = input.record;
    let resolved = resolve_shapes(input)?;

    let image = CocoImage {
        id: input.image_id.as_u64(),
        file_name: record.image_path.clone(),
        height: record.image_height,
        width: record.image_width,
    };

    let mut next_id = input.next_annotation_id;
    let mut annotations = Vec::with_capacity(resolved.len());
    for item in resolved {
        let (x, y, w, h) = item.bbox.to_xywh();
        let polygon = item
            .shape
            .points
            .iter()
            .map(|p| [CocoNumber(p.x), CocoNumber(p.y)])
            .collect();

        annotations.push(CocoAnnotation {
            id: next_id.as_u64(),
            image_id: input.image_id.as_u64(),
            category_id: item.category_id.as_u64(),
            bbox: [CocoNumber(x), CocoNumber(y), CocoNumber(w), CocoNumber(h)],
            area: CocoNumber(item.bbox.area()),
            segmentation: vec![polygon],
            iscrowd: 0,
        });
        next_id = next_id.next();
    }

    let document = CocoDocument {
        images: vec![image],
        annotations,
        categories: coco_categories(input.categories),
    };

    Ok((document, next_id))
}

/// Serializes a document with 4-space indentation.
pub fn to_coco_vec(document: &CocoDocument) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut serializer)?;
    Ok(buf)
}

fn coco_categories(categories: &CategoryTable) -> Vec<CocoCategory> {
    categories
        .iter()
        .map(|(id, name)| CocoCategory {
            id: id.as_u64(),
            name: name.to_owned(),
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::ir::{AnnotationRecord, CategoryOrder, ImageId, Shape};

    fn square_record() -> AnnotationRecord {
        AnnotationRecord::new("a.jpg", 200, 100).with_shape(Shape::new(
            "cat",
            [(10.0, 20.0), (50.0, 20.0), (50.0, 80.0), (10.0, 80.0)],
        ))
    }

    fn emit_json(
        record: &AnnotationRecord,
        categories: &CategoryTable,
        image_id: u64,
        next: AnnotationId,
    ) -> (serde_json::Value, Artifact) {
        let artifact = CocoEmitter
            .emit(EmitInput {
                source: Path::new("augmented/a.json"),
                record,
                image_id: ImageId(image_id),
                categories,
                next_annotation_id: next,
            })
            .expect("emit failed");
        let value = serde_json::from_slice(&artifact.contents).expect("output is JSON");
        (value, artifact)
    }

    #[test]
    fn test_square_polygon_document() {
        let categories = CategoryTable::from_labels(["cat"], CategoryOrder::FirstSeen);
        let (doc, artifact) = emit_json(&square_record(), &categories, 1, AnnotationId::FIRST);

        assert_eq!(
            doc["images"],
            serde_json::json!([{"id": 1, "file_name": "a.jpg", "height": 100, "width": 200}])
        );
        let ann = &doc["annotations"][0];
        assert_eq!(ann["bbox"], serde_json::json!([10, 20, 40, 60]));
        assert_eq!(ann["area"], 2400);
        assert_eq!(ann["iscrowd"], 0);
        assert_eq!(ann["category_id"], 1);
        assert_eq!(
            ann["segmentation"],
            serde_json::json!([[[10, 20], [50, 20], [50, 80], [10, 80]]])
        );
        assert_eq!(doc["categories"], serde_json::json!([{"id": 1, "name": "cat"}]));

        assert_eq!(artifact.annotation_count, 1);
        assert_eq!(artifact.next_annotation_id, AnnotationId(2));
    }

    #[test]
    fn test_annotation_ids_continue_from_accumulator() {
        let record = AnnotationRecord::new("b.png", 10, 10)
            .with_shape(Shape::new("cat", [(0.0, 0.0), (1.0, 1.0)]))
            .with_shape(Shape::new("dog", [(2.0, 2.0), (4.0, 5.0)]));
        let categories = CategoryTable::from_labels(["dog", "cat"], CategoryOrder::FirstSeen);

        let (doc, artifact) = emit_json(&record, &categories, 3, AnnotationId(7));

        assert_eq!(doc["annotations"][0]["id"], 7);
        assert_eq!(doc["annotations"][1]["id"], 8);
        assert_eq!(doc["annotations"][0]["image_id"], 3);
        assert_eq!(doc["annotations"][0]["category_id"], 2);
        assert_eq!(doc["annotations"][1]["category_id"], 1);
        assert_eq!(artifact.next_annotation_id, AnnotationId(9));
    }

    #[test]
    fn test_fractional_values_stay_floats() {
        let record = AnnotationRecord::new("c.jpg", 10, 10)
            .with_shape(Shape::new("cat", [(0.5, 1.0), (2.0, 3.25)]));
        let categories = CategoryTable::from_labels(["cat"], CategoryOrder::FirstSeen);

        let (doc, _) = emit_json(&record, &categories, 1, AnnotationId::FIRST);
        let ann = &doc["annotations"][0];
        assert_eq!(ann["bbox"], serde_json::json!([0.5, 1, 1.5, 2.25]));
        assert_eq!(ann["area"], 3.375);
    }

    #[test]
    fn test_area_equals_width_times_height() {
        let record = AnnotationRecord::new("d.jpg", 640, 480).with_shape(Shape::new(
            "cat",
            [(12.5, 45.25), (78.75, 10.5), (33.0, 99.125)],
        ));
        let categories = CategoryTable::from_labels(["cat"], CategoryOrder::FirstSeen);

        let (doc, _) = emit_json(&record, &categories, 1, AnnotationId::FIRST);
        let ann = &doc["annotations"][0];
        let w = ann["bbox"][2].as_f64().unwrap();
        let h = ann["bbox"][3].as_f64().unwrap();
        assert_eq!(ann["area"].as_f64().unwrap(), w * h);
    }

    #[test]
    fn test_empty_record_keeps_categories() {
        let record = AnnotationRecord::new("e.jpg", 10, 10);
        let categories = CategoryTable::from_labels(["cat", "dog"], CategoryOrder::FirstSeen);

        let (doc, artifact) = emit_json(&record, &categories, 1, AnnotationId(5));
        assert_eq!(doc["annotations"], serde_json::json!([]));
        assert_eq!(doc["categories"].as_array().unwrap().len(), 2);
        assert_eq!(artifact.next_annotation_id, AnnotationId(5));
    }

    #[test]
    fn test_output_uses_four_space_indent() {
        let categories = CategoryTable::from_labels(["cat"], CategoryOrder::FirstSeen);
        let (_, artifact) = emit_json(&square_record(), &categories, 1, AnnotationId::FIRST);
        let text = String::from_utf8(artifact.contents).unwrap();
        assert!(text.starts_with("{\n    \"images\": [\n        {\n            \"id\": 1,"));
    }

    #[test]
    fn test_coco_number_serialization() {
        let render = |v: f64| serde_json::to_string(&CocoNumber(v)).unwrap();
        assert_eq!(render(10.0), "10");
        assert_eq!(render(-3.0), "-3");
        assert_eq!(render(0.25), "0.25");
        assert_eq!(render(1e300), "1e300");
    }
}
