//! Lazy, one-at-a-time walk over the entries of a zip archive.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::HarvestError;

/// Cursor over an archive's entries.
///
/// Only the central directory is read up front; entry data is decompressed
/// while the caller reads the current [`Entry`]. The next entry is not
/// produced until the caller asks for it with [`EntryCursor::advance`], which
/// is what bounds memory to a single entry at a time.
pub struct EntryCursor {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    next: usize,
}

/// The current entry: its stored path and a reader over its contents.
pub struct Entry<'a> {
    name: String,
    reader: Box<dyn Read + 'a>,
}

impl Entry<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Read for Entry<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl EntryCursor {
    /// Opens `path`. A missing, unreadable or corrupt archive yields
    /// [`HarvestError::ArchiveOpen`].
    pub fn open(path: &Path) -> Result<Self, HarvestError> {
        let open_err = |source: ZipError| HarvestError::ArchiveOpen {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(|e| open_err(ZipError::Io(e)))?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(open_err)?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
            next: 0,
        })
    }

    /// Number of entries in the central directory.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Moves to the next entry. `None` once every entry has been produced.
    ///
    /// I/O failures reading a local header are [`HarvestError::StreamIo`];
    /// structural corruption is [`HarvestError::ArchiveOpen`].
    pub fn advance(&mut self) -> Option<Result<Entry<'_>, HarvestError>> {
        if self.next >= self.archive.len() {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let path = &self.path;
        Some(match self.archive.by_index(index) {
            Ok(file) => Ok(Entry {
                name: file.name().to_string(),
                reader: Box::new(file),
            }),
            Err(ZipError::Io(e)) => Err(HarvestError::io(path.clone(), e)),
            Err(source) => Err(HarvestError::ArchiveOpen {
                path: path.clone(),
                source,
            }),
        })
    }
}
