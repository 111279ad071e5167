//! Annotation data model and format codecs.
//!
//! Input records are parsed from LabelMe JSON ([`io_labelme`]) into
//! [`AnnotationRecord`]s. Output formats implement [`Emitter`]
//! ([`io_coco_json::CocoEmitter`], [`io_yolo::YoloEmitter`]) and turn one
//! record into one output file.
//!
//! Geometry is typed by coordinate space: polygon points and COCO boxes
//! are [`Pixel`] values, YOLO rows are derived in [`Normalized`] terms.
//!
//! # Example
//!
//! ```
//! use polyconv::ir::{AnnotationRecord, CategoryOrder, CategoryTable, Shape};
//!
//! let record = AnnotationRecord::new("a.jpg", 200, 100).with_shape(Shape::new(
//!     "cat",
//!     [(10.0, 20.0), (50.0, 20.0), (50.0, 80.0), (10.0, 80.0)],
//! ));
//! let categories = CategoryTable::from_labels(record.labels(), CategoryOrder::FirstSeen);
//!
//! let bbox = record.shapes[0].bbox().unwrap();
//! assert_eq!(bbox.to_xywh(), (10.0, 20.0, 40.0, 60.0));
//! assert_eq!(categories.class_index("cat"), Some(0));
//! ```

mod bbox;
mod categories;
mod coord;
pub mod emit;
mod ids;
pub mod io_coco_json;
pub mod io_labelme;
pub mod io_yolo;
mod model;
mod space;

pub use bbox::BBoxXYXY;
pub use categories::{CategoryOrder, CategoryTable};
pub use coord::Coord;
pub use emit::{Artifact, EmitInput, Emitter};
pub use ids::{AnnotationId, CategoryId, ImageId};
pub use model::{AnnotationRecord, Shape};
pub use space::{Normalized, Pixel};
