//! Fuzz target for LabelMe JSON parsing.
//!
//! Feeds arbitrary bytes to the LabelMe parser and computes the bounding
//! box of every parsed shape, looking for panics or hangs.
//!
//! Run with:
//!   cargo +nightly fuzz run labelme_json_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use polyconv::ir::io_labelme::fuzz_parse_labelme;

fuzz_target!(|data: &[u8]| {
    // Annotation files for a single image stay far below 10MB.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    fuzz_parse_labelme(data);
});
