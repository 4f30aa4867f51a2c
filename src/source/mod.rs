//! Frame sources.
//!
//! A source is either a plain directory of image files or a single zip
//! archive. The variant is picked at open time from the path suffix. Both
//! expose the same indexable, lexicographically sorted entry list and yield
//! `RawRaster`s on demand.
//!
//! Sources are responsible for:
//! - Enumerating and sorting entries once, at open time
//! - Reading an entry's bytes (directly, or through the archive decode buffer)
//! - Decoding those bytes into an 8-bit grayscale raster
//!
//! Sources MUST NOT cache decoded frames.

pub mod archive;
pub mod buffer;
pub mod directory;

use std::path::Path;

pub use archive::ArchiveSource;
pub use buffer::DecodeBuffer;
pub use directory::DirectorySource;

use crate::error::{DecodeError, SourceError, SourceRole};
use crate::frame::RawRaster;

const ARCHIVE_EXTENSION: &str = "zip";

// ----------------------------------------------------------------------------
// SourceList: sorted, immutable entry identifiers
// ----------------------------------------------------------------------------

/// Sorted entry identifiers (file names or archive entry names).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceList {
    entries: Vec<String>,
}

impl SourceList {
    pub(crate) fn from_unsorted(mut entries: Vec<String>) -> Self {
        entries.sort();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

// ----------------------------------------------------------------------------
// FrameSource: directory or archive
// ----------------------------------------------------------------------------

#[derive(Debug)]
pub enum FrameSource {
    Directory(DirectorySource),
    Archive(ArchiveSource),
}

impl FrameSource {
    /// Open `path` as an archive when it ends in `.zip`, else as a directory.
    pub fn open(path: &Path, role: SourceRole) -> Result<Self, SourceError> {
        if is_archive_path(path) {
            Ok(Self::Archive(ArchiveSource::open(path, role)?))
        } else {
            Ok(Self::Directory(DirectorySource::open(path, role)?))
        }
    }

    pub fn entries(&self) -> &SourceList {
        match self {
            FrameSource::Directory(source) => source.entries(),
            FrameSource::Archive(source) => source.entries(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn path(&self) -> &Path {
        match self {
            FrameSource::Directory(source) => source.root(),
            FrameSource::Archive(source) => source.path(),
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, FrameSource::Archive(_))
    }

    /// Read the raw raster for entry `id`.
    ///
    /// `original_size` is the uncorrected frame size; archives use it to size
    /// their decode buffer.
    pub fn read_raw(&mut self, id: usize, original_size: (u32, u32)) -> Result<RawRaster, DecodeError> {
        match self {
            FrameSource::Directory(source) => source.read_raw(id),
            FrameSource::Archive(source) => source.read_raw(id, original_size),
        }
    }
}

/// Enumerate the entries of a directory or archive without keeping it open.
pub fn enumerate(path: &Path, role: SourceRole) -> Result<SourceList, SourceError> {
    if is_archive_path(path) {
        Ok(ArchiveSource::open(path, role)?.entries().clone())
    } else {
        directory::enumerate_directory(path, role)
    }
}

/// Main and depth sources must list the same number of frames.
pub fn check_parity(main: &FrameSource, depth: &FrameSource) -> Result<(), SourceError> {
    if main.len() != depth.len() {
        return Err(SourceError::CountMismatch {
            main: main.len(),
            depth: depth.len(),
            main_path: main.path().to_path_buf(),
            depth_path: depth.path().to_path_buf(),
        });
    }
    Ok(())
}

pub fn is_archive_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == ARCHIVE_EXTENSION)
        .unwrap_or(false)
}

pub(crate) fn decode_raster(bytes: &[u8], role: SourceRole, entry: &str) -> Result<RawRaster, DecodeError> {
    let image = image::load_from_memory(bytes).map_err(|source| DecodeError::Image {
        role,
        entry: entry.to_string(),
        source,
    })?;
    Ok(RawRaster::from_luma(image.to_luma8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::{Cursor, Write};
    use std::path::PathBuf;

    fn png_bytes(width: u32, height: u32, value: u8) -> Vec<u8> {
        let image = image::GrayImage::from_pixel(width, height, image::Luma([value]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    fn write_dataset(root: &Path, names: &[&str]) -> (PathBuf, PathBuf) {
        let dir = root.join("images");
        std::fs::create_dir(&dir).expect("mkdir");
        let zip_path = root.join("images.zip");
        let mut zip = zip::ZipWriter::new(File::create(&zip_path).expect("create zip"));
        let options = zip::write::SimpleFileOptions::default();
        for (i, name) in names.iter().enumerate() {
            let bytes = png_bytes(4, 3, i as u8 * 10);
            std::fs::write(dir.join(name), &bytes).expect("write png");
            zip.start_file(*name, options).expect("start file");
            zip.write_all(&bytes).expect("write entry");
        }
        zip.finish().expect("finish zip");
        (dir, zip_path)
    }

    #[test]
    fn directory_and_archive_enumerate_identically() {
        let root = tempfile::tempdir().expect("tempdir");
        let (dir, zip_path) = write_dataset(root.path(), &["003.png", "001.png", "010.png", "002.png"]);

        let from_dir = enumerate(&dir, SourceRole::Main).expect("directory");
        let from_zip = enumerate(&zip_path, SourceRole::Main).expect("archive");
        assert_eq!(from_dir, from_zip);
        assert_eq!(
            from_dir.iter().collect::<Vec<_>>(),
            vec!["001.png", "002.png", "003.png", "010.png"]
        );
    }

    #[test]
    fn open_selects_variant_by_suffix() {
        let root = tempfile::tempdir().expect("tempdir");
        let (dir, zip_path) = write_dataset(root.path(), &["a.png"]);

        let source = FrameSource::open(&dir, SourceRole::Main).expect("directory");
        assert!(!source.is_archive());
        let source = FrameSource::open(&zip_path, SourceRole::Main).expect("archive");
        assert!(source.is_archive());

        assert!(is_archive_path(Path::new("seq/images.zip")));
        assert!(!is_archive_path(Path::new("seq/images")));
        assert!(!is_archive_path(Path::new(".zip")));
    }

    #[test]
    fn both_variants_decode_the_same_raster() {
        let root = tempfile::tempdir().expect("tempdir");
        let (dir, zip_path) = write_dataset(root.path(), &["a.png", "b.png"]);

        let mut from_dir = FrameSource::open(&dir, SourceRole::Main).expect("directory");
        let mut from_zip = FrameSource::open(&zip_path, SourceRole::Main).expect("archive");
        let a = from_dir.read_raw(1, (4, 3)).expect("dir raster");
        let b = from_zip.read_raw(1, (4, 3)).expect("zip raster");
        assert_eq!((a.width, a.height), (4, 3));
        assert_eq!(a.pixels(), b.pixels());
        assert!(a.pixels().iter().all(|&p| p == 10));
    }

    #[test]
    fn parity_check_reports_both_counts() {
        let root = tempfile::tempdir().expect("tempdir");
        let (dir, _) = write_dataset(root.path(), &["a.png", "b.png"]);
        let depth_dir = root.path().join("depth");
        std::fs::create_dir(&depth_dir).expect("mkdir");
        std::fs::write(depth_dir.join("a.png"), png_bytes(4, 3, 0)).expect("write");

        let main = FrameSource::open(&dir, SourceRole::Main).expect("main");
        let depth = FrameSource::open(&depth_dir, SourceRole::Depth).expect("depth");
        match check_parity(&main, &depth) {
            Err(SourceError::CountMismatch { main, depth, .. }) => {
                assert_eq!((main, depth), (2, 1));
            }
            other => panic!("expected count mismatch, got {other:?}"),
        }
        assert!(check_parity(&main, &main).is_ok());
    }
}
