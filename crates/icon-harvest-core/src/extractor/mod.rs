//! Archive extraction into `<output>/<owner>/<file>`.
//!
//! Entries are read one at a time and streamed straight to disk. Existing
//! targets are never overwritten: an icon already on disk (from an earlier
//! run, or from another tag's archive in this run) is left as it is. The
//! license is shared by every archive and written at most once per run.

mod classify;
mod entries;

pub use classify::{classify_entry, EntryKind};
pub use entries::{Entry, EntryCursor};

use std::path::Path;

use crate::error::HarvestError;
use crate::state::HarvestState;
use crate::storage::{write_new_file, WriteOutcome};

/// Per-archive tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub icons_written: usize,
    /// Icons whose target already existed.
    pub icons_skipped: usize,
    /// This archive's entry created the run's license file. Stays `false`
    /// when the license was handled but a file was already on disk.
    pub license_written: bool,
    pub directories: usize,
    /// Entries that are neither icons nor the license, plus license entries
    /// seen after the license was handled.
    pub ignored: usize,
}

/// Streams every icon of `archive` into `state.output_folder()`.
///
/// `tag` is used for logging only. Fails with [`HarvestError::ArchiveOpen`]
/// when the archive cannot be opened and [`HarvestError::StreamIo`] on any
/// read or write error; entries processed before the failure stay on disk.
/// Blocking; run under `spawn_blocking` from async code.
pub fn extract_archive(
    archive: &Path,
    tag: &str,
    state: &HarvestState,
) -> Result<ExtractStats, HarvestError> {
    let output = state.output_folder();
    let mut cursor = EntryCursor::open(archive)?;
    let mut stats = ExtractStats::default();
    tracing::debug!(tag, entries = cursor.len(), archive = %archive.display(), "extracting");

    while let Some(entry) = cursor.advance() {
        let mut entry = entry?;
        match classify_entry(entry.name()) {
            EntryKind::Directory => stats.directories += 1,
            EntryKind::Other => {
                tracing::trace!(tag, entry = entry.name(), "ignoring entry");
                stats.ignored += 1;
            }
            EntryKind::Icon { owner, file_name } => {
                let dir = output.join(&owner);
                std::fs::create_dir_all(&dir).map_err(|e| HarvestError::io(&dir, e))?;
                let target = dir.join(&file_name);
                if target.exists() {
                    stats.icons_skipped += 1;
                    continue;
                }
                match write_new_file(&target, &mut entry).map_err(|e| HarvestError::io(&target, e))? {
                    WriteOutcome::Written(_) => stats.icons_written += 1,
                    WriteOutcome::AlreadyExists => stats.icons_skipped += 1,
                }
            }
            EntryKind::License { file_name } => {
                if state.license().is_written() {
                    stats.ignored += 1;
                    continue;
                }
                let target = output.join(&file_name);
                let mut wrote = false;
                let ran = state.license().write_once(|| {
                    std::fs::create_dir_all(output).map_err(|e| HarvestError::io(output, e))?;
                    if target.exists() {
                        tracing::debug!(path = %target.display(), "license already on disk");
                        return Ok(());
                    }
                    let outcome =
                        write_new_file(&target, &mut entry).map_err(|e| HarvestError::io(&target, e))?;
                    wrote = matches!(outcome, WriteOutcome::Written(_));
                    Ok(())
                })?;
                if !ran {
                    stats.ignored += 1;
                } else if wrote {
                    tracing::info!(tag, path = %target.display(), "wrote license file");
                    stats.license_written = true;
                }
            }
        }
    }

    tracing::debug!(
        tag,
        written = stats.icons_written,
        skipped = stats.icons_skipped,
        ignored = stats.ignored,
        "archive extracted"
    );
    Ok(stats)
}
