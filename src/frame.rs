//! Frame containers.
//!
//! - `RawRaster`: an undecoded-but-unpacked 8-bit grayscale grid, straight from a source.
//! - `AssembledFrame`: the corrected frame with exposure, timestamp and optional depth.
//!
//! Both are created per retrieval call and handed to the caller, who owns them.

use crate::error::DecodeError;

// ----------------------------------------------------------------------------
// RawRaster: 8-bit grayscale pixels
// ----------------------------------------------------------------------------

/// Raw 8-bit grayscale raster.
///
/// Not `Clone`. The assembler drops it as soon as correction returns.
#[derive(Debug)]
pub struct RawRaster {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RawRaster {
    /// Build a raster from row-major pixels. Returns `None` when the buffer
    /// length does not match `width * height`.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        if pixels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            pixels,
            width,
            height,
        })
    }

    pub(crate) fn from_luma(image: image::GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            pixels: image.into_raw(),
            width,
            height,
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }
}

// ----------------------------------------------------------------------------
// AssembledFrame: corrected output
// ----------------------------------------------------------------------------

/// Corrected frame ready for the tracking front-end.
#[derive(Clone, Debug)]
pub struct AssembledFrame {
    pub width: u32,
    pub height: u32,
    /// Corrected intensities, row-major.
    pub image: Vec<f32>,
    pub exposure: f32,
    pub timestamp: f64,
    depth: Option<Vec<f32>>,
}

impl AssembledFrame {
    pub fn new(width: u32, height: u32, image: Vec<f32>, exposure: f32, timestamp: f64) -> Self {
        Self {
            width,
            height,
            image,
            exposure,
            timestamp,
            depth: None,
        }
    }

    /// True once a depth channel has been merged in.
    pub fn has_depth(&self) -> bool {
        self.depth.is_some()
    }

    pub fn depth(&self) -> Option<&[f32]> {
        self.depth.as_deref()
    }

    /// Copy the corrected depth raster into this frame's depth channel.
    ///
    /// The depth frame must have the same dimensions as this frame.
    pub(crate) fn merge_depth(&mut self, id: usize, depth: AssembledFrame) -> Result<(), DecodeError> {
        if depth.width != self.width || depth.height != self.height {
            return Err(DecodeError::DepthSizeMismatch {
                id,
                width: self.width,
                height: self.height,
                depth_width: depth.width,
                depth_height: depth.height,
            });
        }
        self.depth = Some(depth.image);
        Ok(())
    }
}
