//! First-writer-wins file creation.

use std::io::{self, Read};
use std::path::Path;

use tempfile::NamedTempFile;

/// What happened to a target passed to [`write_new_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was created with this many bytes.
    Written(u64),
    /// Another writer got there first; nothing was changed.
    AlreadyExists,
}

/// Copies `reader` into `target` without ever replacing an existing file.
///
/// Bytes go to a uniquely named temp file in the target's directory, which is
/// then linked into place with no-clobber semantics. Two tasks racing for the
/// same target both succeed; exactly one of them sees `Written`. A crash
/// mid-copy leaves only a stray temp file, never a truncated target.
pub fn write_new_file<R: Read + ?Sized>(target: &Path, reader: &mut R) -> io::Result<WriteOutcome> {
    let dir = target
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "target has no parent"))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".icon-harvest-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    let bytes = io::copy(reader, &mut tmp)?;
    persist(tmp, target, bytes)
}

fn persist(tmp: NamedTempFile, target: &Path, bytes: u64) -> io::Result<WriteOutcome> {
    match tmp.persist_noclobber(target) {
        Ok(_) => Ok(WriteOutcome::Written(bytes)),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(WriteOutcome::AlreadyExists),
        Err(e) => Err(e.error),
    }
}
