//! Post-conversion verification.
//!
//! A shallow smoke test over the output directory: every output file of
//! the target format is re-opened and checked for structure only.
//! - `.json` files must parse as JSON
//! - `.txt` files must be readable text; an empty file is a warning
//!
//! Boxes, ids and categories are not checked.

mod report;

pub use report::{IssueCode, Severity, VerificationIssue, VerificationReport};

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::error::PolyconvError;
use crate::pipeline::OutputFormat;

/// Checks every output file of `format` directly inside `output_dir`.
///
/// Files are visited in name order. Only the directory listing itself can
/// fail; per-file problems are recorded in the report.
pub fn verify_output_dir(
    output_dir: &Path,
    format: OutputFormat,
) -> Result<VerificationReport, PolyconvError> {
    if !output_dir.is_dir() {
        return Err(PolyconvError::OutputDirNotFound {
            path: output_dir.to_path_buf(),
        });
    }

    info!("Verifying {} output in {}", format.name(), output_dir.display());

    let mut report = VerificationReport::new(output_dir);
    for path in list_files_with_extension(output_dir, format.extension())? {
        report.files_checked += 1;
        match format {
            OutputFormat::Coco => check_json_file(&path, &mut report),
            OutputFormat::Yolo => check_label_file(&path, &mut report),
        }
    }

    Ok(report)
}

/// Returns true iff every output file of `format` is well-formed.
pub fn verify_conversion(output_dir: &Path, format: OutputFormat) -> Result<bool, PolyconvError> {
    Ok(verify_output_dir(output_dir, format)?.passed())
}

fn check_json_file(path: &Path, report: &mut VerificationReport) {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            error!("Verification failed: {} is unreadable: {}", path.display(), err);
            report.add(VerificationIssue::error(IssueCode::Unreadable, path, err.to_string()));
            return;
        }
    };

    match serde_json::from_reader::<_, serde::de::IgnoredAny>(BufReader::new(file)) {
        Ok(_) => debug!("Verification passed: {} is valid", path.display()),
        Err(err) => {
            error!("Verification failed: {} is invalid: {}", path.display(), err);
            report.add(VerificationIssue::error(IssueCode::InvalidJson, path, err.to_string()));
        }
    }
}

fn check_label_file(path: &Path, report: &mut VerificationReport) {
    match fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => {
            warn!("Label file {} is empty", path.display());
            report.add(VerificationIssue::warning(
                IssueCode::EmptyLabelFile,
                path,
                "label file has no rows",
            ));
        }
        Ok(_) => debug!("Verification passed: {} is readable", path.display()),
        Err(err) => {
            error!("Verification failed: {} is unreadable: {}", path.display(), err);
            report.add(VerificationIssue::error(IssueCode::Unreadable, path, err.to_string()));
        }
    }
}

fn list_files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, PolyconvError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| PolyconvError::DirectoryScan {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some(extension)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
