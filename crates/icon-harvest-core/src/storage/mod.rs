//! Disk writes for downloads and extracted files.
//!
//! Archives stream into a `.part` file that is renamed into place once
//! complete, so an interrupted download is never mistaken for a finished one.
//! Extracted icons and the license go through a temp file persisted with
//! no-clobber semantics: an existing target is never overwritten.

mod no_clobber;
mod part_file;

pub use no_clobber::{write_new_file, WriteOutcome};
pub use part_file::PartFile;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `arrows.zip` → `arrows.zip.part`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}
