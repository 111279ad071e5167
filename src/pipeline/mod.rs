//! The conversion pipeline.
//!
//! One run goes through four stages, strictly in order:
//!
//! 1. [`scan_annotation_files`] lists the `.json` files of the input directory
//! 2. [`index_categories`] reads every file once and builds the category table
//! 3. [`transform_files`] writes one output file per record through an
//!    [`Emitter`] and copies the side files
//! 4. the output directory is re-read by the verifier
//!
//! [`run_pipeline`] drives all of them from a [`PipelineOptions`].

mod report;

pub use report::{
    ConversionCounts, ConversionIssue, ConversionIssueCode, ConversionReport, ConversionSeverity,
};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::PolyconvError;
use crate::ir::io_coco_json::{CocoEmitter, COCO_EXTENSION};
use crate::ir::io_labelme::{read_labelme_json, LABELME_EXTENSION};
use crate::ir::io_yolo::{YoloEmitter, YOLO_EXTENSION};
use crate::ir::{
    AnnotationId, AnnotationRecord, Artifact, CategoryOrder, CategoryTable, EmitInput, Emitter,
    ImageId,
};
use crate::verification::{verify_output_dir, VerificationReport};

/// Target annotation format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Coco,
    Yolo,
}

impl OutputFormat {
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Coco => "coco",
            OutputFormat::Yolo => "yolo",
        }
    }

    /// Extension of the per-image output files.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Coco => COCO_EXTENSION,
            OutputFormat::Yolo => YOLO_EXTENSION,
        }
    }

    pub fn emitter(self) -> Box<dyn Emitter> {
        match self {
            OutputFormat::Coco => Box::new(CocoEmitter),
            OutputFormat::Yolo => Box::new(YoloEmitter),
        }
    }
}

/// What to do when a single annotation file cannot be converted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Fail the whole run.
    #[default]
    Abort,
    /// Log the file, record it in the report and carry on.
    Skip,
}

/// Settings for one pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub on_error: FailurePolicy,
    pub category_order: CategoryOrder,
    /// Compare each copied image's header against the annotated size.
    pub check_image_size: bool,
    /// Re-read the output directory once conversion is done.
    pub verify: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("augmented"),
            output_dir: PathBuf::from("output_final"),
            format: OutputFormat::default(),
            on_error: FailurePolicy::default(),
            category_order: CategoryOrder::default(),
            check_image_size: false,
            verify: true,
        }
    }
}

/// Everything a run produced.
#[derive(Clone, Debug, Serialize)]
pub struct PipelineOutcome {
    pub conversion: ConversionReport,
    /// `None` when verification was disabled.
    pub verification: Option<VerificationReport>,
}

impl PipelineOutcome {
    /// False only if verification ran and found errors.
    pub fn verified(&self) -> bool {
        self.verification.as_ref().map_or(true, |v| v.passed())
    }
}

/// Runs scan, index, transform and verify with the given options.
///
/// The output directory is created if needed and never cleared; files from
/// earlier runs with other names are left in place.
pub fn run_pipeline(options: &PipelineOptions) -> Result<PipelineOutcome, PolyconvError> {
    let emitter = options.format.emitter();
    let mut report =
        ConversionReport::new(emitter.name(), &options.input_dir, &options.output_dir);

    let files = scan_annotation_files(&options.input_dir)?;
    report.counts.files_scanned = files.len();
    info!(
        "Found {} annotation file(s) in {}",
        files.len(),
        options.input_dir.display()
    );

    let categories = index_categories(
        &files,
        options.category_order,
        emitter.as_ref(),
        options.on_error,
        &mut report,
    )?;
    report.counts.categories = categories.len();
    report.categories = categories.labels().to_vec();
    info!("Indexed {} categories", categories.len());

    fs::create_dir_all(&options.output_dir).map_err(|source| PolyconvError::OutputDirCreate {
        path: options.output_dir.clone(),
        source,
    })?;
    transform_files(
        &files,
        &categories,
        emitter.as_ref(),
        &options.output_dir,
        options,
        &mut report,
    )?;
    emitter.finish(&options.output_dir, &categories)?;
    info!(
        "Wrote {} {} file(s) to {}",
        report.counts.files_converted,
        emitter.name(),
        options.output_dir.display()
    );

    let verification = if options.verify {
        Some(verify_output_dir(&options.output_dir, options.format)?)
    } else {
        None
    };

    Ok(PipelineOutcome {
        conversion: report,
        verification,
    })
}

/// Lists the annotation files directly inside `dir`, sorted by file name.
///
/// Only regular files whose extension is exactly `json` are returned.
pub fn scan_annotation_files(dir: &Path) -> Result<Vec<PathBuf>, PolyconvError> {
    if !dir.is_dir() {
        return Err(PolyconvError::InputDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| PolyconvError::DirectoryScan {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some(LABELME_EXTENSION)
        {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Builds the category table from every shape label in `files`.
///
/// Each record must also pass [`Emitter::check`]. Under
/// [`FailurePolicy::Skip`] files that fail to parse or check are recorded as
/// [`ConversionIssueCode::SkippedFile`] and contribute no labels; the
/// transform stage then passes over them too.
pub fn index_categories(
    files: &[PathBuf],
    order: CategoryOrder,
    emitter: &dyn Emitter,
    policy: FailurePolicy,
    report: &mut ConversionReport,
) -> Result<CategoryTable, PolyconvError> {
    let mut table = CategoryTable::new();

    for file in files {
        let checked = read_labelme_json(file)
            .and_then(|record| emitter.check(file, &record).map(|()| record));
        let record = match checked {
            Ok(record) => record,
            Err(err) => {
                apply_policy(policy, file, err, report)?;
                continue;
            }
        };
        for label in record.labels() {
            if table.insert(label) {
                debug!("New category '{}' from {}", label, file.display());
            }
        }
    }

    Ok(match order {
        CategoryOrder::FirstSeen => table,
        CategoryOrder::Sorted => table.into_sorted(),
    })
}

/// Converts every file, writing `<output_dir>/<image stem>.<ext>` and
/// copying the side files.
///
/// The image id of a file is its 1-based position in `files`. Annotation
/// ids run on across files and only advance for files that were written.
///
/// An output path that resolves to one of `files` fails the run with
/// [`PolyconvError::OutputOverwritesInput`] before anything is written to it.
pub fn transform_files(
    files: &[PathBuf],
    categories: &CategoryTable,
    emitter: &dyn Emitter,
    output_dir: &Path,
    options: &PipelineOptions,
    report: &mut ConversionReport,
) -> Result<(), PolyconvError> {
    let mut next_annotation_id = AnnotationId::FIRST;
    let inputs: HashSet<PathBuf> = files.iter().filter_map(|f| f.canonicalize().ok()).collect();

    for (index, file) in files.iter().enumerate() {
        if report.is_skipped(file) {
            continue;
        }

        let image_id = ImageId::from_index(index);
        let (record, stem, artifact) =
            match render_file(file, image_id, categories, emitter, next_annotation_id) {
                Ok(rendered) => rendered,
                Err(err) => {
                    apply_policy(options.on_error, file, err, report)?;
                    continue;
                }
            };

        let out_path = output_dir.join(format!("{}.{}", stem, emitter.extension()));
        if out_path
            .canonicalize()
            .is_ok_and(|canonical| inputs.contains(&canonical))
        {
            return Err(PolyconvError::OutputOverwritesInput {
                path: out_path,
                file: file.clone(),
            });
        }
        fs::write(&out_path, &artifact.contents).map_err(|source| PolyconvError::OutputWrite {
            path: out_path.clone(),
            source,
        })?;
        debug!(
            "Wrote {} ({} annotation(s))",
            out_path.display(),
            artifact.annotation_count
        );

        next_annotation_id = artifact.next_annotation_id;
        report.counts.files_converted += 1;
        report.counts.annotations += artifact.annotation_count;

        copy_image(file, &record, output_dir, options, report)?;

        if emitter.copies_source_annotation() {
            if let Some(name) = file.file_name() {
                if copy_file(file, &output_dir.join(name))? {
                    report.counts.annotation_files_copied += 1;
                }
            }
        }
    }

    Ok(())
}

/// Parses and renders one file without touching the output directory.
fn render_file(
    file: &Path,
    image_id: ImageId,
    categories: &CategoryTable,
    emitter: &dyn Emitter,
    next_annotation_id: AnnotationId,
) -> Result<(AnnotationRecord, String, Artifact), PolyconvError> {
    let record = read_labelme_json(file)?;
    let stem = record
        .output_stem()
        .ok_or_else(|| PolyconvError::MissingImagePath {
            path: file.to_path_buf(),
        })?
        .to_owned();

    let artifact = emitter.emit(EmitInput {
        source: file,
        record: &record,
        image_id,
        categories,
        next_annotation_id,
    })?;

    Ok((record, stem, artifact))
}

/// Copies `<input_dir>/<imagePath>` to `<output_dir>/<image file name>`.
///
/// A missing image is a warning, not an error.
fn copy_image(
    file: &Path,
    record: &AnnotationRecord,
    output_dir: &Path,
    options: &PipelineOptions,
    report: &mut ConversionReport,
) -> Result<(), PolyconvError> {
    let source = options.input_dir.join(&record.image_path);
    let Some(file_name) = record.image_file_name() else {
        return Ok(());
    };

    if !source.is_file() {
        warn!(
            "Image {} referenced by {} not found",
            source.display(),
            file.display()
        );
        report.add(ConversionIssue::warning(
            ConversionIssueCode::MissingImage,
            file,
            format!("image {} not found", source.display()),
        ));
        return Ok(());
    }

    let target = output_dir.join(file_name);
    if copy_file(&source, &target)? {
        report.counts.images_copied += 1;
    }

    if options.check_image_size {
        check_image_size(&target, file, record, report);
    }

    Ok(())
}

fn check_image_size(
    image: &Path,
    file: &Path,
    record: &AnnotationRecord,
    report: &mut ConversionReport,
) {
    match imagesize::size(image) {
        Ok(size)
            if size.width == record.image_width as usize
                && size.height == record.image_height as usize => {}
        Ok(size) => {
            warn!(
                "Image {} is {}x{} but {} says {}x{}",
                image.display(),
                size.width,
                size.height,
                file.display(),
                record.image_width,
                record.image_height
            );
            report.add(ConversionIssue::warning(
                ConversionIssueCode::ImageSizeMismatch,
                file,
                format!(
                    "image is {}x{}, annotation says {}x{}",
                    size.width, size.height, record.image_width, record.image_height
                ),
            ));
        }
        Err(err) => {
            warn!("Could not read size of {}: {}", image.display(), err);
            report.add(ConversionIssue::warning(
                ConversionIssueCode::ImageSizeUnreadable,
                file,
                format!("could not read image header: {}", err),
            ));
        }
    }
}

/// Copies `from` to `to`. Returns false when both name the same file.
fn copy_file(from: &Path, to: &Path) -> Result<bool, PolyconvError> {
    if let (Ok(a), Ok(b)) = (from.canonicalize(), to.canonicalize()) {
        if a == b {
            return Ok(false);
        }
    }

    fs::copy(from, to).map_err(|source| PolyconvError::FileCopy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })?;
    Ok(true)
}

/// Either propagates `err` or records the file as skipped.
fn apply_policy(
    policy: FailurePolicy,
    file: &Path,
    err: PolyconvError,
    report: &mut ConversionReport,
) -> Result<(), PolyconvError> {
    if policy == FailurePolicy::Abort || !err.is_record_error() {
        return Err(err);
    }

    error!("Skipping {}: {}", file.display(), err);
    report.add(ConversionIssue::error(
        ConversionIssueCode::SkippedFile,
        file,
        err.to_string(),
    ));
    Ok(())
}
