//! Error taxonomy for the reader.
//!
//! - `SourceError`: construction-time problems with the main or depth source.
//! - `DecodeError`: per-frame retrieval failures. The reader stays usable.
//! - `CorrectionError`: raised by the geometric-correction collaborator.
//!
//! Metadata problems never surface as errors; they degrade to fallback values.

use std::fmt;
use std::path::PathBuf;

/// Which of the two sources an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceRole {
    Main,
    Depth,
}

impl fmt::Display for SourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRole::Main => f.write_str("main"),
            SourceRole::Depth => f.write_str("depth"),
        }
    }
}

/// Failure to enumerate a frame source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("cannot open {role} archive {}: {source}", path.display())]
    OpenFailed {
        role: SourceRole,
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("cannot read {role} directory {}: {source}", path.display())]
    EmptyDirectory {
        role: SourceRole,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "depth source {} has {depth} frames but main source {} has {main}",
        depth_path.display(),
        main_path.display()
    )]
    CountMismatch {
        main: usize,
        depth: usize,
        main_path: PathBuf,
        depth_path: PathBuf,
    },
}

/// Failure to retrieve a single frame.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("{role} entry {entry} exceeds the decode buffer ({capacity} bytes)")]
    BufferExhausted {
        role: SourceRole,
        entry: String,
        capacity: usize,
    },

    #[error("frame {id} out of range (count {count})")]
    OutOfRange { id: usize, count: usize },

    #[error("cannot open {role} archive entry {entry}: {source}")]
    Entry {
        role: SourceRole,
        entry: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("cannot read {role} frame {entry}: {source}")]
    Io {
        role: SourceRole,
        entry: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode {role} frame {entry}: {source}")]
    Image {
        role: SourceRole,
        entry: String,
        #[source]
        source: image::ImageError,
    },

    #[error("correction failed for frame {id}: {source}")]
    Correction {
        id: usize,
        #[source]
        source: CorrectionError,
    },

    #[error("depth frame {id} is {depth_width}x{depth_height}, main frame is {width}x{height}")]
    DepthSizeMismatch {
        id: usize,
        width: u32,
        height: u32,
        depth_width: u32,
        depth_height: u32,
    },
}

/// Error reported by the geometric-correction collaborator.
#[derive(Debug, thiserror::Error)]
pub enum CorrectionError {
    #[error("cannot read calibration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid calibration file {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("cannot load vignette {}: {source}", path.display())]
    Vignette {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("raster is {width}x{height}, expected {expected_width}x{expected_height}")]
    WrongSize {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },
}

impl CorrectionError {
    pub(crate) fn invalid<S: Into<String>>(path: &std::path::Path, reason: S) -> Self {
        Self::Invalid {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Construction failure of a `FolderReader`.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("cannot build geometric correction: {0}")]
    Calibration(#[from] CorrectionError),
}
