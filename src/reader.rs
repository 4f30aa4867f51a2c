//! `FolderReader`: random access to a frame sequence.
//!
//! Construction enumerates the main source and, if configured, the depth
//! source, checks that both list the same number of frames, builds the
//! correction collaborator and loads `times.txt`. Any failure there is
//! returned to the caller; no partial reader exists.
//!
//! Afterwards every operation reads immutable state, except for the archive
//! decode buffers, which is why retrieval takes `&mut self`. Share a reader
//! across threads only behind external synchronisation.

use std::path::Path;

use crate::assembler::FrameAssembler;
use crate::config::ReaderConfig;
use crate::error::{DecodeError, ReaderError, SourceRole};
use crate::frame::{AssembledFrame, RawRaster};
use crate::metadata::{FrameMetadata, MetadataStatus};
use crate::source::{check_parity, FrameSource};
use crate::undistort::{MonoCalibration, PassthroughUndistort, Undistort};

/// Reader using the stock passthrough correction.
pub type DatasetReader = FolderReader<PassthroughUndistort>;

#[derive(Debug)]
pub struct FolderReader<U> {
    main: FrameSource,
    depth: Option<FrameSource>,
    metadata: FrameMetadata,
    undistort: U,
}

impl<U: Undistort> FolderReader<U> {
    /// Open a reader, building the correction collaborator from the
    /// configured calibration files.
    pub fn open(config: &ReaderConfig) -> Result<Self, ReaderError> {
        let (main, depth) = open_sources(config)?;
        let undistort = U::load(&config.calibration)?;
        Ok(Self::assemble(config, main, depth, undistort))
    }

    /// Open a reader around an already built correction collaborator.
    pub fn with_undistort(config: &ReaderConfig, undistort: U) -> Result<Self, ReaderError> {
        let (main, depth) = open_sources(config)?;
        Ok(Self::assemble(config, main, depth, undistort))
    }

    fn assemble(
        config: &ReaderConfig,
        main: FrameSource,
        depth: Option<FrameSource>,
        undistort: U,
    ) -> Self {
        let metadata = FrameMetadata::load(&config.times_file(), main.len());
        match metadata.status() {
            MetadataStatus::Complete => {}
            MetadataStatus::TimestampsOnly => {
                log::warn!("FolderReader: no usable exposures; using 1.0 for every frame")
            }
            MetadataStatus::Synthetic => {
                log::warn!("FolderReader: no usable timestamps; using id * 0.1 seconds")
            }
        }

        log::info!(
            "FolderReader: got {} images in {}",
            main.len(),
            main.path().display()
        );
        if let Some(depth) = &depth {
            log::info!(
                "FolderReader: got {} depth maps in {}",
                depth.len(),
                depth.path().display()
            );
        }

        Self {
            main,
            depth,
            metadata,
            undistort,
        }
    }

    /// Number of frames.
    pub fn count(&self) -> usize {
        self.main.len()
    }

    /// Timestamp of frame `id` in seconds.
    ///
    /// Out-of-range ids (negative or `>= count()`) return 0.0 rather than an
    /// error. Without loaded timestamps, `id * 0.1` is synthesised.
    pub fn timestamp(&self, id: i64) -> f64 {
        if id < 0 || id as u64 >= self.count() as u64 {
            return 0.0;
        }
        let timestamps = self.metadata.timestamps();
        if timestamps.is_empty() {
            return id as f64 * 0.1;
        }
        timestamps[id as usize]
    }

    /// Uncorrected main raster of frame `id`.
    pub fn raw_image(&mut self, id: usize) -> Result<RawRaster, DecodeError> {
        self.assembler().raw(id)
    }

    /// Corrected frame `id`, with depth when a depth source is configured.
    ///
    /// Failures only affect this frame; the reader stays usable.
    pub fn image(&mut self, id: usize) -> Result<AssembledFrame, DecodeError> {
        self.assembler().assemble(id)
    }

    /// Camera parameters of the raw frames.
    pub fn original_calibration(&self) -> Vec<f32> {
        self.undistort
            .original_parameters()
            .iter()
            .map(|&p| p as f32)
            .collect()
    }

    pub fn original_dimensions(&self) -> (u32, u32) {
        self.undistort.original_size()
    }

    /// Camera matrix and size of the corrected frames.
    pub fn mono_calibration(&self) -> MonoCalibration {
        let k = self.undistort.intrinsics().map(|row| row.map(|v| v as f32));
        let (width, height) = self.undistort.size();
        MonoCalibration { k, width, height }
    }

    pub fn photometric_gamma(&self) -> Option<&[f32]> {
        self.undistort.photometric_gamma()
    }

    pub fn has_depth(&self) -> bool {
        self.depth.is_some()
    }

    pub fn main_path(&self) -> &Path {
        self.main.path()
    }

    pub fn depth_path(&self) -> Option<&Path> {
        self.depth.as_ref().map(FrameSource::path)
    }

    pub fn metadata(&self) -> &FrameMetadata {
        &self.metadata
    }

    pub fn metadata_status(&self) -> MetadataStatus {
        self.metadata.status()
    }

    pub fn undistort(&self) -> &U {
        &self.undistort
    }

    fn assembler(&mut self) -> FrameAssembler<'_, U> {
        FrameAssembler {
            main: &mut self.main,
            depth: self.depth.as_mut(),
            metadata: &self.metadata,
            undistort: &self.undistort,
        }
    }
}

/// Enumerate main and depth sources. An empty depth source means no depth.
fn open_sources(config: &ReaderConfig) -> Result<(FrameSource, Option<FrameSource>), ReaderError> {
    let main = FrameSource::open(&config.main_path, SourceRole::Main)?;
    if main.is_empty() {
        log::warn!("FolderReader: no frames in {}", main.path().display());
    }

    let depth = match config.depth_path.as_deref() {
        Some(path) if !path.as_os_str().is_empty() => {
            let depth = FrameSource::open(path, SourceRole::Depth)?;
            if depth.is_empty() {
                log::warn!(
                    "FolderReader: depth source {} is empty; reading without depth",
                    path.display()
                );
                None
            } else {
                check_parity(&main, &depth)?;
                Some(depth)
            }
        }
        _ => None,
    };
    Ok((main, depth))
}
