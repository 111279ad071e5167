//! Verification report types.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// The result of re-reading an output directory.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VerificationReport {
    pub output_dir: PathBuf,
    /// Number of output files examined.
    pub files_checked: usize,
    pub issues: Vec<VerificationIssue>,
}

impl VerificationReport {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, issue: VerificationIssue) {
        self.issues.push(issue);
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// True iff every checked file is readable and well-formed.
    ///
    /// Warnings (empty label files) do not fail verification.
    pub fn passed(&self) -> bool {
        self.error_count() == 0
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(
                f,
                "Verification passed: {} file(s) checked, no issues found",
                self.files_checked
            );
        }

        writeln!(
            f,
            "Verification of {} file(s) completed with {} error(s) and {} warning(s):",
            self.files_checked,
            self.error_count(),
            self.warning_count()
        )?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A problem found in one output file.
#[derive(Clone, Debug, Serialize)]
pub struct VerificationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub file: PathBuf,
    pub message: String,
}

impl VerificationIssue {
    pub fn error(code: IssueCode, file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn warning(code: IssueCode, file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            file: file.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for VerificationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
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
pub enum Severity {
    Warning,
    Error,
}

/// Stable codes for verification issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// A `.json` output does not parse.
    InvalidJson,
    /// An output file could not be opened or decoded as text.
    Unreadable,
    /// A `.txt` label file has no rows.
    EmptyLabelFile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_do_not_fail() {
        let mut report = VerificationReport::new("out");
        report.files_checked = 2;
        report.add(VerificationIssue::warning(
            IssueCode::EmptyLabelFile,
            "out/a.txt",
            "no rows",
        ));
        assert!(report.passed());

        report.add(VerificationIssue::error(
            IssueCode::InvalidJson,
            "out/b.json",
            "EOF while parsing",
        ));
        assert!(!report.passed());
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_display() {
        let mut report = VerificationReport::new("out");
        report.files_checked = 3;
        assert!(report.to_string().contains("Verification passed: 3 file(s) checked"));

        report.add(VerificationIssue::error(
            IssueCode::InvalidJson,
            "out/b.json",
            "EOF while parsing",
        ));
        let text = report.to_string();
        assert!(text.contains("1 error(s) and 0 warning(s)"));
        assert!(text.contains("[ERROR] InvalidJson in out/b.json: EOF while parsing"));
    }
}
