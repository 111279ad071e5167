//! LabelMe JSON reader.
//!
//! LabelMe writes one JSON document per image:
//!
//! ```json
//! {
//!   "imagePath": "a.jpg",
//!   "imageHeight": 100,
//!   "imageWidth": 200,
//!   "shapes": [{"label": "cat", "points": [[10, 20], [50, 80]]}]
//! }
//! ```
//!
//! Only the fields above are read. A missing `shapes` array is treated as
//! an image with no objects; any other missing field is a parse error.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::model::AnnotationRecord;
use crate::error::PolyconvError;

/// File extension of LabelMe annotation files.
pub const LABELME_EXTENSION: &str = "json";

/// Reads one LabelMe annotation file.
///
/// # Errors
/// Returns [`PolyconvError::Io`] if the file cannot be opened and
/// [`PolyconvError::AnnotationParse`] if it is not a valid LabelMe document.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use polyconv::ir::io_labelme::read_labelme_json;
///
/// let record = read_labelme_json(Path::new("augmented/a.json"))?;
/// println!("{} shapes", record.shapes.len());
/// # Ok::<(), polyconv::PolyconvError>(())
/// ```
pub fn read_labelme_json(path: &Path) -> Result<AnnotationRecord, PolyconvError> {
    let file = File::open(path).map_err(PolyconvError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| PolyconvError::AnnotationParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses a LabelMe document from a string.
pub fn from_labelme_str(json: &str) -> Result<AnnotationRecord, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parses a LabelMe document from raw bytes.
pub fn from_labelme_slice(bytes: &[u8]) -> Result<AnnotationRecord, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Fuzz-only entrypoint: parse, then compute every shape's box.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_labelme(bytes: &[u8]) {
    if let Ok(record) = from_labelme_slice(bytes) {
        for shape in &record.shapes {
            let _ = shape.bbox();
        }
    }
}
