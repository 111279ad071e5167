//! The emitter seam between the pipeline and the output formats.
//!
//! The pipeline owns scanning, indexing, file naming and copying. An
//! emitter only turns one parsed record into the bytes of one output file.

use std::path::Path;

use super::bbox::BBoxXYXY;
use super::categories::CategoryTable;
use super::ids::{AnnotationId, CategoryId, ImageId};
use super::model::{AnnotationRecord, Shape};
use super::space::Pixel;
use crate::error::PolyconvError;

/// Everything an emitter needs to render one record.
#[derive(Clone, Copy, Debug)]
pub struct EmitInput<'a> {
    /// The annotation file the record came from, for error context.
    pub source: &'a Path,
    pub record: &'a AnnotationRecord,
    pub image_id: ImageId,
    pub categories: &'a CategoryTable,
    /// The next unused annotation id in this run.
    pub next_annotation_id: AnnotationId,
}

/// One rendered output file.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub contents: Vec<u8>,
    /// Number of shapes written.
    pub annotation_count: usize,
    /// The next unused annotation id after this record.
    pub next_annotation_id: AnnotationId,
}

/// A target annotation format.
pub trait Emitter {
    /// Short format name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Extension of the per-image output file, without the dot.
    fn extension(&self) -> &'static str;

    /// Whether the source annotation file is copied next to the output.
    fn copies_source_annotation(&self) -> bool {
        false
    }

    /// Checks everything about a record that does not need the category
    /// table. A record that fails here never reaches [`Emitter::emit`].
    fn check(&self, source: &Path, record: &AnnotationRecord) -> Result<(), PolyconvError> {
        check_record(source, record)
    }

    /// Renders one record.
    fn emit(&self, input: EmitInput<'_>) -> Result<Artifact, PolyconvError>;

    /// Runs once after every record has been written.
    fn finish(&self, _output_dir: &Path, _categories: &CategoryTable) -> Result<(), PolyconvError> {
        Ok(())
    }
}

/// Fails if the record names no image or has a shape with no points.
pub fn check_record(source: &Path, record: &AnnotationRecord) -> Result<(), PolyconvError> {
    if record.output_stem().is_none() {
        return Err(PolyconvError::MissingImagePath {
            path: source.to_path_buf(),
        });
    }
    match record.shapes.iter().position(|shape| shape.points.is_empty()) {
        Some(index) => Err(PolyconvError::EmptyShape {
            path: source.to_path_buf(),
            index,
            label: record.shapes[index].label.clone(),
        }),
        None => Ok(()),
    }
}

/// A shape with its box and category resolved.
#[derive(Clone, Copy, Debug)]
pub struct ResolvedShape<'a> {
    pub shape: &'a Shape,
    pub bbox: BBoxXYXY<Pixel>,
    pub category_id: CategoryId,
}

/// Resolves every shape of the record, in drawing order.
///
/// Fails on the first shape with no points or with a label the table
/// does not know.
pub fn resolve_shapes<'a>(input: &EmitInput<'a>) -> Result<Vec<ResolvedShape<'a>>, PolyconvError> {
    input
        .record
        .shapes
        .iter()
        .enumerate()
        .map(|(index, shape)| {
            let bbox = shape.bbox().ok_or_else(|| PolyconvError::EmptyShape {
                path: input.source.to_path_buf(),
                index,
                label: shape.label.clone(),
            })?;
            let category_id = input.categories.category_id(&shape.label).ok_or_else(|| {
                PolyconvError::UnknownCategory {
                    path: input.source.to_path_buf(),
                    label: shape.label.clone(),
                }
            })?;
            Ok(ResolvedShape {
                shape,
                bbox,
                category_id,
            })
        })
        .collect()
}
