//! Zip archive frame source.
//!
//! Frames are the archive's file entries, sorted by name. Directory markers
//! (names ending in `/`) are skipped. Each archive handle owns exactly one
//! `DecodeBuffer`; main and depth archives never share one.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use super::buffer::{DecodeBuffer, EntryStore};
use super::{decode_raster, SourceList};
use crate::error::{DecodeError, SourceError, SourceRole};
use crate::frame::RawRaster;

pub struct ArchiveSource {
    path: PathBuf,
    role: SourceRole,
    archive: ZipArchive<File>,
    entries: SourceList,
    /// Allocated on first read, once the original frame size is known.
    buffer: Option<DecodeBuffer>,
}

impl std::fmt::Debug for ArchiveSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveSource")
            .field("path", &self.path)
            .field("role", &self.role)
            .field("entries", &self.entries.len())
            .field("buffer", &self.buffer)
            .finish()
    }
}

impl ArchiveSource {
    pub fn open(path: &Path, role: SourceRole) -> Result<Self, SourceError> {
        let open_failed = |source| SourceError::OpenFailed {
            role,
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(|e| open_failed(e.into()))?;
        let archive = ZipArchive::new(file).map_err(open_failed)?;
        let entries = enumerate_archive(&archive);
        log::info!(
            "ArchiveSource: got {} entries and {} {} files in {}",
            archive.len(),
            entries.len(),
            role,
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            role,
            archive,
            entries,
            buffer: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &SourceList {
        &self.entries
    }

    /// Decode buffer state, if any read has happened yet.
    pub fn buffer(&self) -> Option<&DecodeBuffer> {
        self.buffer.as_ref()
    }

    /// Read and decode the entry at `id`.
    ///
    /// `original_size` sizes the decode buffer on first use.
    pub fn read_raw(&mut self, id: usize, original_size: (u32, u32)) -> Result<RawRaster, DecodeError> {
        let role = self.role;
        let name = self
            .entries
            .get(id)
            .ok_or(DecodeError::OutOfRange {
                id,
                count: self.entries.len(),
            })?
            .to_string();
        let bytes = self.read_entry(&name, original_size)?;
        decode_raster(bytes, role, &name)
    }

    /// Stage the named entry's bytes in the decode buffer.
    pub fn read_entry(&mut self, name: &str, original_size: (u32, u32)) -> Result<&[u8], DecodeError> {
        let buffer = self
            .buffer
            .get_or_insert_with(|| DecodeBuffer::for_dimensions(original_size.0, original_size.1));
        buffer.read_entry(&mut self.archive, self.role, name)
    }
}

impl<R: Read + Seek> EntryStore for ZipArchive<R> {
    type Entry<'a>
        = Box<dyn Read + 'a>
    where
        Self: 'a;

    fn open_entry(&mut self, role: SourceRole, name: &str) -> Result<Self::Entry<'_>, DecodeError> {
        match self.by_name(name) {
            Ok(file) => Ok(Box::new(file)),
            Err(source) => Err(DecodeError::Entry {
                role,
                entry: name.to_string(),
                source,
            }),
        }
    }
}

/// Collect file entries from the archive's table of contents.
pub fn enumerate_archive<R: Read + Seek>(archive: &ZipArchive<R>) -> SourceList {
    let names = archive
        .file_names()
        .filter(|name| *name != "." && *name != "..")
        .filter(|name| !name.ends_with('/'))
        .map(str::to_string)
        .collect();
    SourceList::from_unsorted(names)
}
