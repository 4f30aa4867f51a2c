//! Dataset reader for monocular (plus optional depth) vision pipelines.
//!
//! Presents a frame sequence as a uniform random-access interface, whether the
//! frames live in a plain directory or in a single `.zip` archive.
//!
//! # Architecture
//!
//! Construction reconciles three partially untrusted inputs into one
//! consistent, indexable sequence:
//!
//! 1. **Directory listing / archive table of contents**: sorted entry names.
//! 2. **Depth source** (optional): must list exactly as many frames as the main source.
//! 3. **`times.txt`**: timestamps and exposures, repaired or discarded on inconsistency.
//!
//! Retrieval of frame `i` reads the raw raster (directly, or through the
//! archive's decode buffer), hands it to the geometric-correction collaborator
//! and merges the corrected depth raster when one is configured.
//!
//! # Module Structure
//!
//! - `source`: Directory and archive sources, entry enumeration, decode buffer
//! - `metadata`: `times.txt` parsing, exposure repair and discard policy
//! - `assembler`: Main + depth retrieval and correction
//! - `reader`: `FolderReader` facade
//! - `undistort`: Correction collaborator trait and passthrough implementation
//! - `frame`, `error`, `config`: Frame containers, error taxonomy, reader inputs

mod assembler;
pub mod config;
pub mod error;
pub mod frame;
pub mod metadata;
pub mod reader;
pub mod source;
pub mod undistort;

pub use config::ReaderConfig;
pub use error::{CorrectionError, DecodeError, ReaderError, SourceError, SourceRole};
pub use frame::{AssembledFrame, RawRaster};
pub use metadata::{FrameMetadata, MetadataStatus};
pub use reader::{DatasetReader, FolderReader};
pub use source::{FrameSource, SourceList};
pub use undistort::{CalibrationFiles, MonoCalibration, PassthroughUndistort, Undistort};
