//! Conversion report types.
//!
//! A report records what a pipeline run produced and every non-fatal
//! problem it stepped over, so the outcome can be printed for humans or
//! serialized for scripts.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Summary of one pipeline run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Target format name.
    pub format: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub counts: ConversionCounts,
    /// Categories in id order.
    pub categories: Vec<String>,
    pub issues: Vec<ConversionIssue>,
    #[serde(skip)]
    skipped: HashSet<PathBuf>,
}

impl ConversionReport {
    pub fn new(format: impl Into<String>, input_dir: &Path, output_dir: &Path) -> Self {
        Self {
            format: format.into(),
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, issue: ConversionIssue) {
        if issue.code == ConversionIssueCode::SkippedFile {
            self.skipped.insert(issue.file.clone());
        }
        self.issues.push(issue);
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Error)
            .count()
    }

    /// Issues with the given code.
    pub fn issues_with_code(&self, code: ConversionIssueCode) -> impl Iterator<Item = &ConversionIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }

    /// Whether `file` has already been dropped from this run.
    pub fn is_skipped(&self, file: &Path) -> bool {
        self.skipped.contains(file)
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Converted {} of {} annotation file(s) to {} ({} annotations, {} categories)",
            self.counts.files_converted,
            self.counts.files_scanned,
            self.format,
            self.counts.annotations,
            self.counts.categories
        )?;
        writeln!(
            f,
            "  {} image(s) copied, {} annotation file(s) copied into {}",
            self.counts.images_copied,
            self.counts.annotation_files_copied,
            self.output_dir.display()
        )?;

        if !self.issues.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "Issues ({} error(s), {} warning(s)):",
                self.error_count(),
                self.warning_count()
            )?;
            for issue in &self.issues {
                writeln!(f, "  {}", issue)?;
            }
        }

        Ok(())
    }
}

/// Counts of what a run read and wrote.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConversionCounts {
    pub files_scanned: usize,
    pub files_converted: usize,
    pub annotations: usize,
    pub categories: usize,
    pub images_copied: usize,
    pub annotation_files_copied: usize,
}

/// A non-fatal problem met during conversion.
#[derive(Clone, Debug, Serialize)]
pub struct ConversionIssue {
    pub severity: ConversionSeverity,
    pub code: ConversionIssueCode,
    /// The annotation file the issue belongs to.
    pub file: PathBuf,
    pub message: String,
}

impl ConversionIssue {
    pub fn warning(code: ConversionIssueCode, file: &Path, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Warning,
            code,
            file: file.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn error(code: ConversionIssueCode, file: &Path, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Error,
            code,
            file: file.to_path_buf(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConversionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            ConversionSeverity::Error => "ERROR",
            ConversionSeverity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity,
            self.code,
            self.file.display(),
            self.message
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSeverity {
    Warning,
    /// The file was dropped from the output.
    Error,
}

/// Stable codes for conversion issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionIssueCode {
    /// The image referenced by `imagePath` does not exist; nothing was copied.
    MissingImage,
    /// The file failed to parse or convert and was skipped.
    SkippedFile,
    /// The copied image's size differs from `imageWidth`/`imageHeight`.
    ImageSizeMismatch,
    /// The copied image's header could not be read.
    ImageSizeUnreadable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_severity() {
        let mut report = ConversionReport::new("coco", Path::new("in"), Path::new("out"));
        report.add(ConversionIssue::warning(
            ConversionIssueCode::MissingImage,
            Path::new("in/a.json"),
            "image a.jpg not found",
        ));
        report.add(ConversionIssue::error(
            ConversionIssueCode::SkippedFile,
            Path::new("in/b.json"),
            "bad json",
        ));

        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.error_count(), 1);
        assert_eq!(
            report
                .issues_with_code(ConversionIssueCode::MissingImage)
                .count(),
            1
        );
    }

    #[test]
    fn test_is_skipped_tracks_skipped_files_only() {
        let mut report = ConversionReport::default();
        report.add(ConversionIssue::warning(
            ConversionIssueCode::MissingImage,
            Path::new("in/a.json"),
            "image a.jpg not found",
        ));
        report.add(ConversionIssue::error(
            ConversionIssueCode::SkippedFile,
            Path::new("in/b.json"),
            "bad json",
        ));

        assert!(!report.is_skipped(Path::new("in/a.json")));
        assert!(report.is_skipped(Path::new("in/b.json")));
        assert!(!report.is_skipped(Path::new("in/c.json")));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("skipped").is_none());
    }

    #[test]
    fn test_display_lists_issues() {
        let mut report = ConversionReport::new("yolo", Path::new("in"), Path::new("out"));
        report.counts.files_scanned = 2;
        report.counts.files_converted = 2;
        report.add(ConversionIssue::warning(
            ConversionIssueCode::MissingImage,
            Path::new("in/a.json"),
            "image a.jpg not found",
        ));

        let text = report.to_string();
        assert!(text.contains("Converted 2 of 2 annotation file(s) to yolo"));
        assert!(text.contains("[WARN ] MissingImage in in/a.json: image a.jpg not found"));
    }

    #[test]
    fn test_serializes_codes_in_snake_case() {
        let issue = ConversionIssue::warning(
            ConversionIssueCode::ImageSizeMismatch,
            Path::new("a.json"),
            "x",
        );
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["code"], "image_size_mismatch");
        assert_eq!(json["severity"], "warning");
    }
}
