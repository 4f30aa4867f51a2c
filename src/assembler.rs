//! Frame assembly: raw main raster, optional raw depth raster, correction,
//! merge.

use crate::error::DecodeError;
use crate::frame::{AssembledFrame, RawRaster};
use crate::metadata::FrameMetadata;
use crate::source::FrameSource;
use crate::undistort::Undistort;

/// Borrowed view over the reader's parts for one retrieval.
pub(crate) struct FrameAssembler<'a, U> {
    pub main: &'a mut FrameSource,
    pub depth: Option<&'a mut FrameSource>,
    pub metadata: &'a FrameMetadata,
    pub undistort: &'a U,
}

impl<U: Undistort> FrameAssembler<'_, U> {
    /// Raw main raster for `id`.
    pub fn raw(&mut self, id: usize) -> Result<RawRaster, DecodeError> {
        self.main.read_raw(id, self.undistort.original_size())
    }

    /// Corrected frame for `id`, with the depth channel merged in when a depth
    /// source is configured.
    pub fn assemble(mut self, id: usize) -> Result<AssembledFrame, DecodeError> {
        let raw = self.raw(id)?;
        let mut frame = self.correct(id, raw)?;

        let original_size = self.undistort.original_size();
        let raw_depth = match self.depth.as_deref_mut() {
            Some(depth) => Some(depth.read_raw(id, original_size)?),
            None => None,
        };
        if let Some(raw_depth) = raw_depth {
            let depth_frame = self.correct(id, raw_depth)?;
            frame.merge_depth(id, depth_frame)?;
        }
        Ok(frame)
    }

    /// Consumes the raster; it is dropped as soon as correction returns.
    fn correct(&self, id: usize, raw: RawRaster) -> Result<AssembledFrame, DecodeError> {
        self.undistort
            .undistort(
                &raw,
                self.metadata.exposure_or_default(id),
                self.metadata.timestamp_or_default(id),
            )
            .map_err(|source| DecodeError::Correction { id, source })
    }
}
