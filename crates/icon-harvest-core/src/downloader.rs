//! Archive downloader: one streaming GET per tag archive.
//!
//! Idempotent by existence: if the archive is already on disk the network is
//! never touched. The body is written chunk by chunk into `<archive>.part`
//! and renamed into place only after a flushed, synced, successful transfer,
//! so an interrupted run never leaves a truncated archive under the final
//! name. No retries happen here; see [`crate::retry`].

use std::path::{Path, PathBuf};

use crate::error::HarvestError;
use crate::fetch_page::CurlOptions;
use crate::storage::{self, PartFile};

/// Result of [`fetch_archive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// `dest` already existed; nothing was requested.
    AlreadyPresent,
    /// The archive was downloaded to `dest`.
    Downloaded { bytes: u64 },
}

/// Downloads `url` to `dest` unless `dest` already exists.
///
/// Creates `dest`'s parent directory if needed. Fails with
/// [`HarvestError::FetchStatus`] on a non-2xx answer (naming `tag`),
/// [`HarvestError::FetchNetwork`] on transport failure or timeout, and
/// [`HarvestError::StreamIo`] when the local write fails. Runs in the current
/// thread; call from `spawn_blocking` if used from async code.
pub fn fetch_archive(
    tag: &str,
    url: &str,
    dest: &Path,
    curl: &CurlOptions,
) -> Result<Fetched, HarvestError> {
    if dest.exists() {
        tracing::debug!(tag, path = %dest.display(), "archive already present, skipping download");
        return Ok(Fetched::AlreadyPresent);
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| HarvestError::io(parent, e))?;
    }

    let mut part = PartFile::create(dest).map_err(|e| HarvestError::io(storage::temp_path(dest), e))?;
    match stream_into(tag, url, curl, &mut part) {
        Ok(()) => {
            let temp: PathBuf = part.temp_path().to_path_buf();
            let bytes = part.finish().map_err(|e| HarvestError::io(temp, e))?;
            tracing::info!(tag, bytes, path = %dest.display(), "archive downloaded");
            Ok(Fetched::Downloaded { bytes })
        }
        Err(e) => {
            part.discard();
            Err(e)
        }
    }
}

/// GETs `url`, writing the body into `part` as it arrives.
fn stream_into(
    tag: &str,
    url: &str,
    curl: &CurlOptions,
    part: &mut PartFile,
) -> Result<(), HarvestError> {
    let context = format!("archive for tag '{}'", tag);
    let network = |source: curl::Error| HarvestError::FetchNetwork {
        context: context.clone(),
        source,
    };

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(network)?;
    curl.apply(&mut easy).map_err(network)?;

    let mut write_error: Option<std::io::Error> = None;
    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| match part.write_chunk(data) {
                Ok(()) => Ok(data.len()),
                Err(e) => {
                    write_error = Some(e);
                    Ok(0) // abort transfer
                }
            })
            .map_err(network)?;
        transfer.perform()
    };

    if let Some(e) = write_error {
        return Err(HarvestError::io(part.temp_path(), e));
    }
    performed.map_err(network)?;

    let code = easy.response_code().map_err(network)?;
    if !(200..300).contains(&code) {
        return Err(HarvestError::FetchStatus {
            context,
            status: code,
        });
    }
    Ok(())
}
