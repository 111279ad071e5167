//! Polyconv: LabelMe polygon annotations to COCO and YOLO.
//!
//! Polyconv reads a directory of LabelMe JSON files (one per image) and
//! writes one COCO JSON document or one YOLO label file per image, copies
//! the images next to them and finally re-reads the output to make sure
//! every file is well-formed.
//!
//! # Modules
//!
//! - [`ir`]: Annotation records, geometry and the COCO/YOLO emitters
//! - [`pipeline`]: Scanning, category indexing, conversion and reporting
//! - [`verification`]: Post-conversion output checks
//! - [`error`]: Error types for polyconv operations

pub mod error;
pub mod ir;
pub mod pipeline;
pub mod verification;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use serde::Serialize;

pub use error::PolyconvError;

use ir::CategoryOrder;
use pipeline::{FailurePolicy, OutputFormat, PipelineOptions};

/// The polyconv CLI application.
///
/// Without a subcommand the convert options apply directly, so a bare
/// `polyconv` converts `augmented/` into `output_final/` as COCO.
#[derive(Parser)]
#[command(name = "polyconv")]
#[command(version, author, about)]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    convert: ConvertArgs,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert a directory of LabelMe annotations.
    Convert(ConvertArgs),
    /// Check that an output directory holds well-formed files.
    Verify(VerifyArgs),
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Directory holding the LabelMe JSON files and their images.
    #[arg(short, long, env = "POLYCONV_INPUT", default_value = "augmented")]
    input: PathBuf,

    /// Directory to write converted files into (created if missing).
    #[arg(short, long, env = "POLYCONV_OUTPUT", default_value = "output_final")]
    output: PathBuf,

    /// Target annotation format.
    #[arg(short, long, env = "POLYCONV_FORMAT", value_enum, default_value_t = FormatArg::Coco)]
    format: FormatArg,

    /// What to do with an annotation file that cannot be converted.
    #[arg(long, value_enum, default_value_t = OnErrorArg::Abort)]
    on_error: OnErrorArg,

    /// How category ids are assigned.
    #[arg(long, value_enum, default_value_t = CategoryOrderArg::FirstSeen)]
    category_order: CategoryOrderArg,

    /// Compare each copied image's size against the annotation.
    #[arg(long)]
    check_image_size: bool,

    /// Skip re-reading the output directory after conversion.
    #[arg(long)]
    no_verify: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = ReportArg::Text)]
    report: ReportArg,
}

/// Arguments for the verify subcommand.
#[derive(clap::Args)]
struct VerifyArgs {
    /// Directory holding converted files.
    #[arg(short, long, env = "POLYCONV_OUTPUT", default_value = "output_final")]
    output: PathBuf,

    /// Format of the converted files.
    #[arg(short, long, env = "POLYCONV_FORMAT", value_enum, default_value_t = FormatArg::Coco)]
    format: FormatArg,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = ReportArg::Text)]
    report: ReportArg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Coco,
    Yolo,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Coco => OutputFormat::Coco,
            FormatArg::Yolo => OutputFormat::Yolo,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OnErrorArg {
    Abort,
    Skip,
}

impl From<OnErrorArg> for FailurePolicy {
    fn from(value: OnErrorArg) -> Self {
        match value {
            OnErrorArg::Abort => FailurePolicy::Abort,
            OnErrorArg::Skip => FailurePolicy::Skip,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CategoryOrderArg {
    FirstSeen,
    Sorted,
}

impl From<CategoryOrderArg> for CategoryOrder {
    fn from(value: CategoryOrderArg) -> Self {
        match value {
            CategoryOrderArg::FirstSeen => CategoryOrder::FirstSeen,
            CategoryOrderArg::Sorted => CategoryOrder::Sorted,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportArg {
    Text,
    Json,
}

/// Run the polyconv CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), PolyconvError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Verify(args)) => run_verify(args),
        None => run_convert(cli.convert),
    }
}

/// Execute the convert subcommand.
fn run_convert(args: ConvertArgs) -> Result<(), PolyconvError> {
    let options = PipelineOptions {
        input_dir: args.input,
        output_dir: args.output,
        format: args.format.into(),
        on_error: args.on_error.into(),
        category_order: args.category_order.into(),
        check_image_size: args.check_image_size,
        verify: !args.no_verify,
    };

    let outcome = pipeline::run_pipeline(&options)?;

    match args.report {
        ReportArg::Json => print_json(&outcome)?,
        ReportArg::Text => {
            print!("{}", outcome.conversion);
            if let Some(verification) = &outcome.verification {
                println!();
                print!("{}", verification);
            }
        }
    }

    match outcome.verification {
        Some(report) if !report.passed() => {
            error!("Conversion completed with errors.");
            Err(PolyconvError::VerificationFailed {
                error_count: report.error_count(),
                warning_count: report.warning_count(),
                report,
            })
        }
        _ => {
            info!("Conversion completed successfully.");
            Ok(())
        }
    }
}

/// Execute the verify subcommand.
fn run_verify(args: VerifyArgs) -> Result<(), PolyconvError> {
    let report = verification::verify_output_dir(&args.output, args.format.into())?;

    match args.report {
        ReportArg::Json => print_json(&report)?,
        ReportArg::Text => print!("{}", report),
    }

    if report.passed() {
        Ok(())
    } else {
        Err(PolyconvError::VerificationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), PolyconvError> {
    let json = serde_json::to_string_pretty(value).map_err(PolyconvError::ReportWrite)?;
    println!("{}", json);
    Ok(())
}
