use std::path::PathBuf;
use thiserror::Error;

use crate::verification::VerificationReport;

/// The main error type for polyconv operations.
#[derive(Debug, Error)]
pub enum PolyconvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input directory not found: {path}")]
    InputDirNotFound { path: PathBuf },

    #[error("Output directory not found: {path}")]
    OutputDirNotFound { path: PathBuf },

    #[error("Failed to scan directory {path}: {source}")]
    DirectoryScan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to parse annotation JSON from {path}: {source}")]
    AnnotationParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Shape {index} ('{label}') in {path} has no points")]
    EmptyShape {
        path: PathBuf,
        index: usize,
        label: String,
    },

    #[error("Label '{label}' in {path} is not in the category table")]
    UnknownCategory { path: PathBuf, label: String },

    #[error("Annotation {path} has an empty imagePath")]
    MissingImagePath { path: PathBuf },

    #[error("Annotation {path} has invalid image dimensions {width}x{height}")]
    InvalidImageDimensions {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    #[error("Failed to write COCO JSON for {path}: {source}")]
    CocoJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to create output directory {path}: {source}")]
    OutputDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to write {path} for {file}: it is an input annotation file")]
    OutputOverwritesInput { path: PathBuf, file: PathBuf },

    #[error("Failed to copy {from} to {to}: {source}")]
    FileCopy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    DataYamlWrite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to render report: {0}")]
    ReportWrite(#[source] serde_json::Error),

    #[error("Verification failed with {error_count} error(s) and {warning_count} warning(s)")]
    VerificationFailed {
        error_count: usize,
        warning_count: usize,
        report: VerificationReport,
    },
}

impl PolyconvError {
    /// Returns true for errors scoped to a single annotation file.
    ///
    /// These are the errors a `skip` failure policy may step over; all
    /// others abort the run.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            PolyconvError::AnnotationParse { .. }
                | PolyconvError::EmptyShape { .. }
                | PolyconvError::UnknownCategory { .. }
                | PolyconvError::MissingImagePath { .. }
                | PolyconvError::InvalidImageDimensions { .. }
        )
    }
}
