//! Plain directory frame source.
//!
//! Every regular entry in the directory is one frame. Identifiers are file
//! names relative to the directory, sorted lexicographically.

use std::path::{Path, PathBuf};

use super::{decode_raster, SourceList};
use crate::error::{DecodeError, SourceError, SourceRole};
use crate::frame::RawRaster;

#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    role: SourceRole,
    entries: SourceList,
}

impl DirectorySource {
    pub fn open(root: &Path, role: SourceRole) -> Result<Self, SourceError> {
        let entries = enumerate_directory(root, role)?;
        log::info!(
            "DirectorySource: got {} {} files in {}",
            entries.len(),
            role,
            root.display()
        );
        Ok(Self {
            root: root.to_path_buf(),
            role,
            entries,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &SourceList {
        &self.entries
    }

    /// Full path of the entry at `id`.
    pub fn entry_path(&self, id: usize) -> Option<PathBuf> {
        self.entries.get(id).map(|name| self.root.join(name))
    }

    pub fn read_raw(&self, id: usize) -> Result<RawRaster, DecodeError> {
        let name = self.entries.get(id).ok_or(DecodeError::OutOfRange {
            id,
            count: self.entries.len(),
        })?;
        let bytes = std::fs::read(self.root.join(name)).map_err(|source| DecodeError::Io {
            role: self.role,
            entry: name.to_string(),
            source,
        })?;
        decode_raster(&bytes, self.role, name)
    }
}

/// List frame files in `root`, skipping `.`, `..` and sub-directories.
pub fn enumerate_directory(root: &Path, role: SourceRole) -> Result<SourceList, SourceError> {
    let read_failed = |source| SourceError::EmptyDirectory {
        role,
        path: root.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(root).map_err(read_failed)? {
        let entry = entry.map_err(read_failed)?;
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                log::warn!(
                    "skipping non UTF-8 file name {:?} in {}",
                    raw,
                    root.display()
                );
                continue;
            }
        };
        if name == "." || name == ".." {
            continue;
        }
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        names.push(name);
    }
    Ok(SourceList::from_unsorted(names))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_files_sorted_and_skips_subdirectories() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["00002.png", "00000.png", "00010.png", "00001.png"] {
            std::fs::write(dir.path().join(name), b"x").expect("write");
        }
        std::fs::create_dir(dir.path().join("nested")).expect("mkdir");

        let list = enumerate_directory(dir.path(), SourceRole::Main).expect("enumerate");
        assert_eq!(
            list.as_slice(),
            ["00000.png", "00001.png", "00002.png", "00010.png"]
        );
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope");
        let err = enumerate_directory(&missing, SourceRole::Depth).unwrap_err();
        match err {
            SourceError::EmptyDirectory { role, path, .. } => {
                assert_eq!(role, SourceRole::Depth);
                assert_eq!(path, missing);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn read_raw_reports_out_of_range() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = DirectorySource::open(dir.path(), SourceRole::Main).expect("open");
        assert!(source.entries().is_empty());
        assert!(matches!(
            source.read_raw(0),
            Err(DecodeError::OutOfRange { id: 0, count: 0 })
        ));
    }
}
