//! Run-scoped state shared by concurrently running extraction tasks.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::HarvestError;

/// Guards the single shared license file across all archives of a run.
///
/// The check and the write happen under one lock, so however many archives
/// carry a license entry, at most one of them performs the write and the flag
/// flips to `true` exactly once.
#[derive(Debug, Default)]
pub struct LicenseGuard {
    written: Mutex<bool>,
}

impl LicenseGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_written(&self) -> bool {
        *self.written.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `write` unless the license is already handled; marks it handled
    /// when `write` succeeds. Returns whether `write` ran.
    ///
    /// A failed `write` leaves the flag unset so another archive may try.
    pub fn write_once<F>(&self, write: F) -> Result<bool, HarvestError>
    where
        F: FnOnce() -> Result<(), HarvestError>,
    {
        let mut written = self.written.lock().unwrap_or_else(|e| e.into_inner());
        if *written {
            return Ok(false);
        }
        write()?;
        *written = true;
        Ok(true)
    }
}

/// State handed to every extraction task of one run.
#[derive(Debug)]
pub struct HarvestState {
    output_folder: PathBuf,
    license: LicenseGuard,
}

impl HarvestState {
    pub fn new(output_folder: impl Into<PathBuf>) -> Self {
        Self {
            output_folder: output_folder.into(),
            license: LicenseGuard::new(),
        }
    }

    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    pub fn license(&self) -> &LicenseGuard {
        &self.license
    }
}
